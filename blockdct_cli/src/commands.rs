// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use blockdct::BLOCK_DIM;
use blockdct::metrics::{psnr, sqnr_per_frequency};
use blockdct::pipeline::{
    Channel, ChromaReconstruction, Decoder, DecoderOptions, Encoder, EncoderOptions,
    QuantizationTables, num_blocks,
};
use blockdct::quant::CoefficientBlock;
use blockdct::stream::{StreamSink, read_coefficients, read_frequencies};
use clap::Args;
use color_eyre::eyre::{Result, WrapErr};
use tracing::{info, warn};

use crate::bmp::{read_bmp, write_bmp};
use crate::text::{
    format_channel, format_dimensions, format_quant_table, read_channel, read_dimensions,
    read_quant_table,
};

const RGB_NAMES: [&str; 3] = ["R", "G", "B"];

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Input 24-bit BMP file
    pub input: PathBuf,
    /// Output text file for the red channel
    pub red: PathBuf,
    /// Output text file for the green channel
    pub green: PathBuf,
    /// Output text file for the blue channel
    pub blue: PathBuf,
    /// Output dimension file
    pub dim: PathBuf,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Output BMP file
    pub output: PathBuf,
    /// Text file with the red channel
    pub red: PathBuf,
    /// Text file with the green channel
    pub green: PathBuf,
    /// Text file with the blue channel
    pub blue: PathBuf,
    /// Dimension file
    pub dim: PathBuf,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Input 24-bit BMP file
    pub input: PathBuf,
    /// Output quantization table for Y
    pub qt_y: PathBuf,
    /// Output quantization table for Cb
    pub qt_cb: PathBuf,
    /// Output quantization table for Cr
    pub qt_cr: PathBuf,
    /// Output dimension file
    pub dim: PathBuf,
    /// Output coefficient stream for Y
    pub qf_y: PathBuf,
    /// Output coefficient stream for Cb
    pub qf_cb: PathBuf,
    /// Output coefficient stream for Cr
    pub qf_cr: PathBuf,
    /// Also write the unquantized coefficient streams for Y, Cb and Cr
    #[arg(long, num_args = 3, value_names = ["EF_Y", "EF_CB", "EF_CR"])]
    pub frequencies: Option<Vec<PathBuf>>,
    /// Read the quantization tables for Y, Cb and Cr instead of using the
    /// standard ones
    #[arg(long, num_args = 3, value_names = ["IN_Y", "IN_CB", "IN_CR"])]
    pub use_tables: Option<Vec<PathBuf>>,
    /// Multiply every quantization table entry by this factor
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub scale: u16,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Output BMP file
    pub output: PathBuf,
    /// Quantization table for Y
    pub qt_y: PathBuf,
    /// Quantization table for Cb
    pub qt_cb: PathBuf,
    /// Quantization table for Cr
    pub qt_cr: PathBuf,
    /// Dimension file
    pub dim: PathBuf,
    /// Coefficient stream for Y
    pub qf_y: PathBuf,
    /// Coefficient stream for Cb
    pub qf_cb: PathBuf,
    /// Coefficient stream for Cr
    pub qf_cr: PathBuf,
    /// Decode luma only and output a grayscale image; the chroma streams are
    /// not read
    #[arg(long)]
    pub luma_only: bool,
    /// Original BMP to report PSNR against
    #[arg(long)]
    pub reference: Option<PathBuf>,
    /// Unquantized coefficient streams for Y, Cb and Cr, to report SQNR per
    /// frequency
    #[arg(long, num_args = 3, value_names = ["EF_Y", "EF_CB", "EF_CR"])]
    pub frequencies: Option<Vec<PathBuf>>,
}

fn three_paths(paths: &[PathBuf]) -> [&Path; 3] {
    std::array::from_fn(|i| paths[i].as_path())
}

impl EncodeArgs {
    fn table_paths(&self) -> [&Path; 3] {
        [&self.qt_y, &self.qt_cb, &self.qt_cr].map(PathBuf::as_path)
    }

    fn coefficient_paths(&self) -> [&Path; 3] {
        [&self.qf_y, &self.qf_cb, &self.qf_cr].map(PathBuf::as_path)
    }
}

impl DecodeArgs {
    fn table_paths(&self) -> [&Path; 3] {
        [&self.qt_y, &self.qt_cb, &self.qt_cr].map(PathBuf::as_path)
    }

    fn coefficient_paths(&self) -> [&Path; 3] {
        [&self.qf_y, &self.qf_cb, &self.qf_cr].map(PathBuf::as_path)
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).wrap_err_with(|| format!("Failed to open {:?}", path))?;
    Ok(BufReader::new(file))
}

fn read_tables(paths: [&Path; 3]) -> Result<QuantizationTables> {
    Ok(QuantizationTables::new(
        read_quant_table(paths[0])?,
        read_quant_table(paths[1])?,
        read_quant_table(paths[2])?,
    ))
}

pub fn read_coefficient_file(path: &Path, num_blocks: usize) -> Result<Vec<CoefficientBlock>> {
    read_coefficients(&mut open(path)?, num_blocks)
        .wrap_err_with(|| format!("Invalid coefficient stream {:?}", path))
}

/// Writes every `(path, contents)` pair in order. If one write fails, the
/// files written before it are removed.
fn write_outputs(outputs: &[(&Path, &[u8])]) -> Result<()> {
    for (written, &(path, data)) in outputs.iter().enumerate() {
        if let Err(err) = std::fs::write(path, data) {
            for &(partial, _) in &outputs[..written] {
                if let Err(err) = std::fs::remove_file(partial) {
                    warn!(?partial, %err, "failed to remove partial output");
                }
            }
            return Err(err).wrap_err_with(|| format!("Failed to write {:?}", path));
        }
    }
    Ok(())
}

/// BMP to three channel text files and a dimension file.
pub fn split(args: &SplitArgs) -> Result<()> {
    let planes = read_bmp(&args.input)?;
    let texts = planes.each_ref().map(format_channel);
    let dim_text = format_dimensions(planes[0].size());
    write_outputs(&[
        (args.red.as_path(), texts[0].as_bytes()),
        (args.green.as_path(), texts[1].as_bytes()),
        (args.blue.as_path(), texts[2].as_bytes()),
        (args.dim.as_path(), dim_text.as_bytes()),
    ])?;
    info!(size = ?planes[0].size(), "split {:?}", args.input);
    Ok(())
}

/// Three channel text files and a dimension file to BMP.
pub fn merge(args: &MergeArgs) -> Result<()> {
    let size = read_dimensions(&args.dim)?;
    let planes = [
        read_channel(&args.red, size)?,
        read_channel(&args.green, size)?,
        read_channel(&args.blue, size)?,
    ];
    write_bmp(&args.output, &planes)?;
    info!(?size, "merged into {:?}", args.output);
    Ok(())
}

pub fn encode(args: &EncodeArgs) -> Result<()> {
    let rgb = read_bmp(&args.input)?;
    let size = rgb[0].size();

    let mut tables = match &args.use_tables {
        Some(paths) => read_tables(three_paths(paths))?,
        None => QuantizationTables::default(),
    };
    if args.scale > 1 {
        for channel in Channel::ALL {
            let scaled = tables
                .get(channel)
                .scaled(args.scale)
                .wrap_err_with(|| format!("Cannot scale the {channel} table by {}", args.scale))?;
            tables.set(channel, scaled);
        }
    }

    let mut sink: StreamSink<Vec<u8>> = if args.frequencies.is_some() {
        StreamSink::with_frequencies(Default::default(), Default::default())
    } else {
        StreamSink::new(Default::default())
    };
    let encoder = Encoder::new(EncoderOptions {
        keep_frequencies: args.frequencies.is_some(),
        tables: tables.clone(),
    });
    encoder
        .encode_to(&rgb, &mut sink)
        .wrap_err("Failed to encode coefficient streams")?;
    let (coefficients, frequencies) = sink.into_inner();

    let table_texts = Channel::ALL.map(|channel| format_quant_table(tables.get(channel)));
    let dim_text = format_dimensions(size);
    let mut outputs: Vec<(&Path, &[u8])> = Vec::new();
    for (path, text) in args.table_paths().into_iter().zip(&table_texts) {
        outputs.push((path, text.as_bytes()));
    }
    outputs.push((args.dim.as_path(), dim_text.as_bytes()));
    for (path, data) in args.coefficient_paths().into_iter().zip(&coefficients) {
        outputs.push((path, data.as_slice()));
    }
    if let (Some(paths), Some(frequencies)) = (&args.frequencies, &frequencies) {
        for (path, data) in three_paths(paths).into_iter().zip(frequencies) {
            outputs.push((path, data.as_slice()));
        }
    }
    write_outputs(&outputs)?;
    info!(?size, blocks = num_blocks(size)?, "encoded {:?}", args.input);
    Ok(())
}

fn print_sqnr(channel: Channel, sqnr: &[f64]) {
    println!("SQNR {channel} (dB):");
    for row in sqnr.chunks_exact(BLOCK_DIM) {
        let line: Vec<String> = row.iter().map(|v| format!("{v:8.2}")).collect();
        println!("{}", line.join(" "));
    }
}

pub fn decode(args: &DecodeArgs) -> Result<()> {
    let tables = read_tables(args.table_paths())?;
    let size = read_dimensions(&args.dim)?;
    let blocks = num_blocks(size)?;
    let chroma = if args.luma_only {
        ChromaReconstruction::Neutral
    } else {
        ChromaReconstruction::Decode
    };

    let paths = args.coefficient_paths();
    let mut coefficients: [Vec<CoefficientBlock>; 3] = Default::default();
    for channel in Channel::ALL {
        if channel == Channel::Y || chroma == ChromaReconstruction::Decode {
            coefficients[channel.index()] = read_coefficient_file(paths[channel.index()], blocks)?;
        }
    }

    let decoder = Decoder::new(DecoderOptions {
        tables: tables.clone(),
        chroma,
    });
    let rgb = decoder
        .decode(size, coefficients.each_ref().map(Vec::as_slice))
        .wrap_err("Failed to decode coefficient streams")?;
    write_bmp(&args.output, &rgb)?;
    info!(?size, ?chroma, "decoded {:?}", args.output);

    if let Some(reference) = &args.reference {
        let original = read_bmp(reference)?;
        for ((name, orig), decoded) in RGB_NAMES.iter().zip(&original).zip(&rgb) {
            let value = psnr(orig, decoded)
                .wrap_err_with(|| format!("Reference {:?} does not match", reference))?;
            println!("PSNR {name}: {value:.2} dB");
        }
    }

    if let Some(frequency_paths) = &args.frequencies {
        let frequency_paths = three_paths(frequency_paths);
        for channel in Channel::ALL {
            if channel != Channel::Y && chroma == ChromaReconstruction::Neutral {
                continue;
            }
            let path = frequency_paths[channel.index()];
            let original = read_frequencies(&mut open(path)?, blocks)
                .wrap_err_with(|| format!("Invalid frequency stream {:?}", path))?;
            let sqnr = sqnr_per_frequency(
                channel,
                &original,
                &coefficients[channel.index()],
                tables.get(channel),
            )?;
            print_sqnr(channel, &sqnr);
        }
    }
    Ok(())
}
