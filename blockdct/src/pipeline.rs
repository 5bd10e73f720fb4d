// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Per-channel encode and decode, and the three-channel drivers on top.

use std::fmt;
use std::ops::Range;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::block::{BlockGrid, BlockPartitioner, PlaneAssembler};
use crate::color::{rgb_planes_to_ycbcr, ycbcr_planes_to_rgb};
use crate::error::{Error, Result};
use crate::image::Image;
use crate::quant::{dequantize, quantize, CoefficientBlock, QuantizationMatrix};
use crate::{forward_dct, inverse_dct, BasisTable, Block};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Y,
    Cb,
    Cr,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Y, Channel::Cb, Channel::Cr];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Y => "Y",
            Channel::Cb => "Cb",
            Channel::Cr => "Cr",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One quantization matrix per channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantizationTables {
    tables: [QuantizationMatrix; 3],
}

impl QuantizationTables {
    pub fn new(y: QuantizationMatrix, cb: QuantizationMatrix, cr: QuantizationMatrix) -> Self {
        QuantizationTables {
            tables: [y, cb, cr],
        }
    }

    /// The same matrix for every channel.
    pub fn uniform(table: QuantizationMatrix) -> Self {
        Self::new(table.clone(), table.clone(), table)
    }

    pub fn get(&self, channel: Channel) -> &QuantizationMatrix {
        &self.tables[channel.index()]
    }

    pub fn set(&mut self, channel: Channel, table: QuantizationMatrix) {
        self.tables[channel.index()] = table;
    }
}

impl Default for QuantizationTables {
    /// Standard luminance table for Y, standard chrominance table for Cb and Cr.
    fn default() -> Self {
        Self::new(
            QuantizationMatrix::standard_luma(),
            QuantizationMatrix::standard_chroma(),
            QuantizationMatrix::standard_chroma(),
        )
    }
}

/// Receives encoded blocks in canonical order.
pub trait BlockSink {
    fn coefficients(&mut self, channel: Channel, block: &CoefficientBlock) -> Result<()>;

    /// Pre-quantization coefficients; only called if [`Self::wants_frequencies`].
    fn frequencies(&mut self, _channel: Channel, _block: &Block) -> Result<()> {
        Ok(())
    }

    fn wants_frequencies(&self) -> bool {
        false
    }
}

#[cfg(feature = "parallel")]
fn map_blocks<T, F>(range: Range<usize>, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    range.into_par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn map_blocks<T, F>(range: Range<usize>, f: F) -> Vec<T>
where
    F: Fn(usize) -> T,
{
    range.map(f).collect()
}

/// Transforms and quantizes the blocks of one plane.
pub struct ChannelEncoder<'a> {
    pub channel: Channel,
    pub basis: &'a BasisTable,
    pub quant: &'a QuantizationMatrix,
}

impl ChannelEncoder<'_> {
    /// Blocks of a row are processed concurrently, then handed to `sink` in
    /// canonical order one row of blocks at a time.
    #[instrument(level = "debug", skip_all, fields(channel = %self.channel), err)]
    pub fn encode(&self, plane: &Image<u8>, sink: &mut dyn BlockSink) -> Result<()> {
        let partitioner = BlockPartitioner::new(plane)?;
        let grid = *partitioner.grid();
        let keep_frequencies = sink.wants_frequencies();
        for by in 0..grid.blocks_y() {
            let first = by * grid.blocks_x();
            let row = map_blocks(first..first + grid.blocks_x(), |index| {
                let frequencies = forward_dct(self.basis, &partitioner.block(index));
                (quantize(&frequencies, self.quant), frequencies)
            });
            for (coefficients, frequencies) in row.iter() {
                if keep_frequencies {
                    sink.frequencies(self.channel, frequencies)?;
                }
                sink.coefficients(self.channel, coefficients)?;
            }
        }
        debug!(blocks = grid.num_blocks(), "encoded channel");
        Ok(())
    }
}

/// Dequantizes and inverse transforms the blocks of one plane.
pub struct ChannelDecoder<'a> {
    pub channel: Channel,
    pub basis: &'a BasisTable,
    pub quant: &'a QuantizationMatrix,
}

impl ChannelDecoder<'_> {
    /// Reconstructs a plane of `size` from blocks in canonical order. The
    /// result is clamped to [0, 255] but not rounded.
    #[instrument(level = "debug", skip_all, fields(channel = %self.channel), err)]
    pub fn decode(
        &self,
        size: (usize, usize),
        coefficients: &[CoefficientBlock],
    ) -> Result<Image<f32>> {
        let mut assembler = PlaneAssembler::new(size)?;
        let grid = *assembler.grid();
        if coefficients.len() != grid.num_blocks() {
            return Err(Error::BlockCountMismatch {
                channel: self.channel.name(),
                expected: grid.num_blocks(),
                found: coefficients.len(),
            });
        }
        for by in 0..grid.blocks_y() {
            let first = by * grid.blocks_x();
            let row = map_blocks(first..first + grid.blocks_x(), |index| {
                inverse_dct(self.basis, &dequantize(&coefficients[index], self.quant))
            });
            for (offset, block) in row.iter().enumerate() {
                assembler.place(first + offset, block);
            }
        }
        debug!(blocks = grid.num_blocks(), "decoded channel");
        Ok(assembler.finish())
    }
}

/// Encoded blocks of one channel, in canonical order.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedChannel {
    pub channel: Channel,
    pub coefficients: Vec<CoefficientBlock>,
    pub frequencies: Option<Vec<Block>>,
}

impl EncodedChannel {
    pub fn new(channel: Channel, keep_frequencies: bool) -> Self {
        EncodedChannel {
            channel,
            coefficients: Vec::new(),
            frequencies: keep_frequencies.then(Vec::new),
        }
    }
}

impl BlockSink for EncodedChannel {
    fn coefficients(&mut self, channel: Channel, block: &CoefficientBlock) -> Result<()> {
        debug_assert_eq!(channel, self.channel);
        self.coefficients.try_reserve(1)?;
        self.coefficients.push(*block);
        Ok(())
    }

    fn frequencies(&mut self, channel: Channel, block: &Block) -> Result<()> {
        debug_assert_eq!(channel, self.channel);
        if let Some(frequencies) = self.frequencies.as_mut() {
            frequencies.try_reserve(1)?;
            frequencies.push(*block);
        }
        Ok(())
    }

    fn wants_frequencies(&self) -> bool {
        self.frequencies.is_some()
    }
}

/// A fully encoded image: everything needed to decode it again.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedImage {
    pub size: (usize, usize),
    pub tables: QuantizationTables,
    pub channels: [EncodedChannel; 3],
}

impl EncodedImage {
    pub fn channel(&self, channel: Channel) -> &EncodedChannel {
        &self.channels[channel.index()]
    }

    pub fn coefficients(&self) -> [&[CoefficientBlock]; 3] {
        Channel::ALL.map(|c| self.channel(c).coefficients.as_slice())
    }
}

#[derive(Clone, Debug, Default)]
pub struct EncoderOptions {
    pub tables: QuantizationTables,
    /// Also collect the pre-quantization coefficients of every block.
    pub keep_frequencies: bool,
}

/// How the chroma planes are obtained when decoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChromaReconstruction {
    /// Decode all three channels.
    #[default]
    Decode,
    /// Decode luma only and use a constant 128 for Cb and Cr, yielding a
    /// grayscale image.
    Neutral,
}

#[derive(Clone, Debug, Default)]
pub struct DecoderOptions {
    pub tables: QuantizationTables,
    pub chroma: ChromaReconstruction,
}

pub struct Encoder<'a> {
    options: EncoderOptions,
    basis: &'a BasisTable,
}

impl Encoder<'static> {
    pub fn new(options: EncoderOptions) -> Self {
        Self::with_basis(options, BasisTable::standard())
    }
}

impl<'a> Encoder<'a> {
    pub fn with_basis(options: EncoderOptions, basis: &'a BasisTable) -> Self {
        Encoder { options, basis }
    }

    fn channel_encoder(&self, channel: Channel) -> ChannelEncoder<'_> {
        ChannelEncoder {
            channel,
            basis: self.basis,
            quant: self.options.tables.get(channel),
        }
    }

    /// Converts R, G, B planes to YCbCr and streams every channel into `sink`,
    /// Y first.
    #[instrument(skip_all, err)]
    pub fn encode_to(&self, rgb: &[Image<u8>; 3], sink: &mut dyn BlockSink) -> Result<()> {
        let ycbcr = rgb_planes_to_ycbcr(rgb)?;
        for channel in Channel::ALL {
            self.channel_encoder(channel)
                .encode(&ycbcr[channel.index()], sink)?;
        }
        Ok(())
    }

    pub fn encode(&self, rgb: &[Image<u8>; 3]) -> Result<EncodedImage> {
        let ycbcr = rgb_planes_to_ycbcr(rgb)?;
        let keep = self.options.keep_frequencies;
        let mut channels = Channel::ALL.map(|c| EncodedChannel::new(c, keep));
        for (plane, encoded) in ycbcr.iter().zip(channels.iter_mut()) {
            self.channel_encoder(encoded.channel).encode(plane, encoded)?;
        }
        Ok(EncodedImage {
            size: rgb[0].size(),
            tables: self.options.tables.clone(),
            channels,
        })
    }
}

pub struct Decoder<'a> {
    options: DecoderOptions,
    basis: &'a BasisTable,
}

impl Decoder<'static> {
    pub fn new(options: DecoderOptions) -> Self {
        Self::with_basis(options, BasisTable::standard())
    }
}

impl<'a> Decoder<'a> {
    pub fn with_basis(options: DecoderOptions, basis: &'a BasisTable) -> Self {
        Decoder { options, basis }
    }

    pub fn decode_channel(
        &self,
        channel: Channel,
        size: (usize, usize),
        coefficients: &[CoefficientBlock],
    ) -> Result<Image<f32>> {
        ChannelDecoder {
            channel,
            basis: self.basis,
            quant: self.options.tables.get(channel),
        }
        .decode(size, coefficients)
    }

    /// Reconstructs the Y, Cb and Cr planes. With
    /// [`ChromaReconstruction::Neutral`] the chroma coefficients are ignored
    /// and may be empty.
    #[instrument(skip_all, fields(chroma = ?self.options.chroma), err)]
    pub fn decode_planes(
        &self,
        size: (usize, usize),
        coefficients: [&[CoefficientBlock]; 3],
    ) -> Result<[Image<f32>; 3]> {
        let y = self.decode_channel(Channel::Y, size, coefficients[0])?;
        let (cb, cr) = match self.options.chroma {
            ChromaReconstruction::Decode => (
                self.decode_channel(Channel::Cb, size, coefficients[1])?,
                self.decode_channel(Channel::Cr, size, coefficients[2])?,
            ),
            ChromaReconstruction::Neutral => (
                Image::new_with_value(size, 128.0)?,
                Image::new_with_value(size, 128.0)?,
            ),
        };
        Ok([y, cb, cr])
    }

    /// Reconstructs R, G, B planes.
    pub fn decode(
        &self,
        size: (usize, usize),
        coefficients: [&[CoefficientBlock]; 3],
    ) -> Result<[Image<u8>; 3]> {
        ycbcr_planes_to_rgb(&self.decode_planes(size, coefficients)?)
    }

    /// Reconstructs R, G, B planes from `image` using the quantization
    /// tables it was encoded with. Only the chroma option of this decoder
    /// applies.
    pub fn decode_image(&self, image: &EncodedImage) -> Result<[Image<u8>; 3]> {
        let options = DecoderOptions {
            tables: image.tables.clone(),
            chroma: self.options.chroma,
        };
        Decoder::with_basis(options, self.basis).decode(image.size, image.coefficients())
    }
}

/// Number of blocks a plane of `size` is split into.
pub fn num_blocks(size: (usize, usize)) -> Result<usize> {
    Ok(BlockGrid::new(size)?.num_blocks())
}
