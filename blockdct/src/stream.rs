// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Raw block streams.
//!
//! A coefficient stream is the concatenation of its blocks in canonical order,
//! each block as 64 little-endian `i16` values in row-major order. A frequency
//! stream has the same layout with little-endian `f32` values. Neither carries
//! a header: the block count follows from the plane dimensions.

use std::io::{ErrorKind as IoErrorKind, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::{instrument, trace};

use crate::error::{Error, Result};
use crate::pipeline::{BlockSink, Channel};
use crate::quant::CoefficientBlock;
use crate::util::try_with_capacity;
use crate::{Block, BLOCK_SIZE};

/// Size in bytes of one block in a coefficient stream.
pub const COEFFICIENT_BLOCK_BYTES: usize = BLOCK_SIZE * 2;
/// Size in bytes of one block in a frequency stream.
pub const FREQUENCY_BLOCK_BYTES: usize = BLOCK_SIZE * 4;

pub fn write_coefficient_block(w: &mut impl Write, block: &CoefficientBlock) -> Result<()> {
    for &c in block {
        w.write_i16::<LittleEndian>(c)?;
    }
    Ok(())
}

pub fn write_frequency_block(w: &mut impl Write, block: &Block) -> Result<()> {
    for &f in block {
        w.write_f32::<LittleEndian>(f)?;
    }
    Ok(())
}

pub fn write_coefficients(w: &mut impl Write, blocks: &[CoefficientBlock]) -> Result<()> {
    blocks
        .iter()
        .try_for_each(|b| write_coefficient_block(w, b))
}

pub fn write_frequencies(w: &mut impl Write, blocks: &[Block]) -> Result<()> {
    blocks.iter().try_for_each(|b| write_frequency_block(w, b))
}

fn truncated(expected: usize, found: usize) -> impl FnOnce(std::io::Error) -> Error {
    move |err| {
        if err.kind() == IoErrorKind::UnexpectedEof {
            Error::StreamTruncated { expected, found }
        } else {
            Error::Io(err)
        }
    }
}

fn check_exhausted(r: &mut impl Read, blocks: usize) -> Result<()> {
    let mut byte = [0u8; 1];
    loop {
        match r.read(&mut byte) {
            Ok(0) => return Ok(()),
            Ok(_) => return Err(Error::StreamTrailingData(blocks)),
            Err(err) if err.kind() == IoErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

/// Reads exactly `num_blocks` coefficient blocks. The stream must end there.
#[instrument(level = "debug", skip(r), err)]
pub fn read_coefficients(r: &mut impl Read, num_blocks: usize) -> Result<Vec<CoefficientBlock>> {
    let mut blocks = try_with_capacity(num_blocks)?;
    for found in 0..num_blocks {
        let mut block = [0i16; BLOCK_SIZE];
        r.read_i16_into::<LittleEndian>(&mut block)
            .map_err(truncated(num_blocks, found))?;
        blocks.push(block);
    }
    check_exhausted(r, num_blocks)?;
    trace!(num_blocks, "read coefficient stream");
    Ok(blocks)
}

/// Reads exactly `num_blocks` frequency blocks. The stream must end there.
#[instrument(level = "debug", skip(r), err)]
pub fn read_frequencies(r: &mut impl Read, num_blocks: usize) -> Result<Vec<Block>> {
    let mut blocks = try_with_capacity(num_blocks)?;
    for found in 0..num_blocks {
        let mut block = [0f32; BLOCK_SIZE];
        r.read_f32_into::<LittleEndian>(&mut block)
            .map_err(truncated(num_blocks, found))?;
        blocks.push(block);
    }
    check_exhausted(r, num_blocks)?;
    trace!(num_blocks, "read frequency stream");
    Ok(blocks)
}

/// A [`BlockSink`] writing each channel to its own stream.
pub struct StreamSink<W: Write> {
    coefficients: [W; 3],
    frequencies: Option<[W; 3]>,
}

impl<W: Write> StreamSink<W> {
    pub fn new(coefficients: [W; 3]) -> Self {
        StreamSink {
            coefficients,
            frequencies: None,
        }
    }

    pub fn with_frequencies(coefficients: [W; 3], frequencies: [W; 3]) -> Self {
        StreamSink {
            coefficients,
            frequencies: Some(frequencies),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        for w in self.coefficients.iter_mut() {
            w.flush()?;
        }
        for w in self.frequencies.iter_mut().flatten() {
            w.flush()?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> ([W; 3], Option<[W; 3]>) {
        (self.coefficients, self.frequencies)
    }
}

impl<W: Write> BlockSink for StreamSink<W> {
    fn coefficients(&mut self, channel: Channel, block: &CoefficientBlock) -> Result<()> {
        write_coefficient_block(&mut self.coefficients[channel.index()], block)
    }

    fn frequencies(&mut self, channel: Channel, block: &Block) -> Result<()> {
        match self.frequencies.as_mut() {
            Some(streams) => write_frequency_block(&mut streams[channel.index()], block),
            None => Ok(()),
        }
    }

    fn wants_frequencies(&self) -> bool {
        self.frequencies.is_some()
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use test_log::test;

    use super::*;
    use crate::error::ErrorKind;
    use crate::image::Image;
    use crate::pipeline::{Encoder, EncoderOptions};

    fn sample_blocks() -> Vec<CoefficientBlock> {
        vec![
            std::array::from_fn(|i| i as i16 - 32),
            [i16::MIN; BLOCK_SIZE],
            std::array::from_fn(|i| if i == 0 { i16::MAX } else { 0 }),
        ]
    }

    #[test]
    fn little_endian_layout() -> Result<()> {
        let mut block = [0i16; BLOCK_SIZE];
        block[0] = 0x0102;
        block[1] = -2;
        let mut out = vec![];
        write_coefficient_block(&mut out, &block)?;
        assert_eq!(out.len(), COEFFICIENT_BLOCK_BYTES);
        assert_eq!(&out[..4], &[0x02, 0x01, 0xfe, 0xff]);

        let mut freq = [0f32; BLOCK_SIZE];
        freq[0] = 1.0;
        let mut out = vec![];
        write_frequency_block(&mut out, &freq)?;
        assert_eq!(out.len(), FREQUENCY_BLOCK_BYTES);
        assert_eq!(&out[..4], &[0x00, 0x00, 0x80, 0x3f]);
        Ok(())
    }

    #[test]
    fn coefficients_read_back() -> Result<()> {
        let blocks = sample_blocks();
        let mut out = vec![];
        write_coefficients(&mut out, &blocks)?;
        assert_eq!(read_coefficients(&mut Cursor::new(&out), 3)?, blocks);
        Ok(())
    }

    #[test]
    fn truncated_stream() -> Result<()> {
        let mut out = vec![];
        write_coefficients(&mut out, &sample_blocks())?;
        out.truncate(2 * COEFFICIENT_BLOCK_BYTES + 5);
        let err = read_coefficients(&mut Cursor::new(&out), 3).unwrap_err();
        assert!(matches!(
            err,
            Error::StreamTruncated {
                expected: 3,
                found: 2
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Format);
        Ok(())
    }

    #[test]
    fn trailing_data() -> Result<()> {
        let mut out = vec![];
        write_coefficients(&mut out, &sample_blocks())?;
        let err = read_coefficients(&mut Cursor::new(&out), 2).unwrap_err();
        assert!(matches!(err, Error::StreamTrailingData(2)));

        let mut freq = vec![];
        write_frequencies(&mut freq, &[[0.5; BLOCK_SIZE]])?;
        freq.push(0);
        assert!(read_frequencies(&mut Cursor::new(&freq), 1).is_err());
        Ok(())
    }

    #[test]
    fn empty_stream() -> Result<()> {
        assert!(read_frequencies(&mut Cursor::new(Vec::<u8>::new()), 0)?.is_empty());
        assert!(matches!(
            read_frequencies(&mut Cursor::new(Vec::<u8>::new()), 1),
            Err(Error::StreamTruncated { found: 0, .. })
        ));
        Ok(())
    }

    #[test]
    fn stream_sink_matches_encoder() -> Result<()> {
        let size = (11, 9);
        let rgb = [
            Image::from_vec(size, (0..99).map(|i| (i * 2) as u8).collect())?,
            Image::new_with_value(size, 17u8)?,
            Image::from_vec(size, (0..99).map(|i| 255 - i as u8).collect())?,
        ];
        let encoder = Encoder::new(EncoderOptions {
            keep_frequencies: true,
            ..Default::default()
        });
        let encoded = encoder.encode(&rgb)?;
        let mut sink = StreamSink::with_frequencies(
            [vec![], vec![], vec![]],
            [vec![], vec![], vec![]],
        );
        encoder.encode_to(&rgb, &mut sink)?;
        sink.flush()?;
        let (coefficients, frequencies) = sink.into_inner();
        let frequencies = frequencies.unwrap();
        for (i, channel) in encoded.channels.iter().enumerate() {
            assert_eq!(coefficients[i].len(), 4 * COEFFICIENT_BLOCK_BYTES);
            let read = read_coefficients(&mut Cursor::new(&coefficients[i]), 4)?;
            assert_eq!(read, channel.coefficients);
            let read = read_frequencies(&mut Cursor::new(&frequencies[i]), 4)?;
            assert_eq!(Some(read), channel.frequencies);
        }
        Ok(())
    }
}
