// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Whitespace-separated text side files: dimensions, quantization tables and
//! per-channel sample dumps.

use std::path::Path;

use blockdct::BLOCK_DIM;
use blockdct::image::Image;
use blockdct::quant::QuantizationMatrix;
use color_eyre::eyre::{Result, WrapErr, bail, ensure, eyre};

fn parse_tokens<'a, T: std::str::FromStr>(
    text: &'a str,
    what: &'a str,
) -> impl Iterator<Item = Result<T>> + 'a
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.split_ascii_whitespace().enumerate().map(move |(i, token)| {
        token
            .parse()
            .wrap_err_with(|| format!("Invalid {what} value {token:?} at position {i}"))
    })
}

/// Parses `"<width> <height>"`.
pub fn parse_dimensions(text: &str) -> Result<(usize, usize)> {
    let values = parse_tokens::<usize>(text, "dimension").collect::<Result<Vec<_>>>()?;
    let [width, height] = values[..] else {
        bail!("Expected width and height, found {} values", values.len());
    };
    ensure!(
        width > 0 && height > 0,
        "Invalid dimensions {width}x{height}"
    );
    Ok((width, height))
}

pub fn format_dimensions(size: (usize, usize)) -> String {
    format!("{} {}\n", size.0, size.1)
}

/// Parses 64 integers in row-major order.
pub fn parse_quant_table(text: &str) -> Result<QuantizationMatrix> {
    let values = parse_tokens::<i64>(text, "quantization").collect::<Result<Vec<_>>>()?;
    Ok(QuantizationMatrix::from_slice(&values)?)
}

/// Eight lines of eight space-separated values.
pub fn format_quant_table(table: &QuantizationMatrix) -> String {
    let mut out = String::new();
    for row in table.values().chunks_exact(BLOCK_DIM) {
        let line: Vec<String> = row.iter().map(u16::to_string).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

/// Parses a plane of `size` from samples in row-major order.
pub fn parse_channel(text: &str, size: (usize, usize)) -> Result<Image<u8>> {
    let expected = size
        .0
        .checked_mul(size.1)
        .ok_or_else(|| eyre!("Channel size {}x{} overflows", size.0, size.1))?;
    let data = parse_tokens::<u8>(text, "sample").collect::<Result<Vec<_>>>()?;
    ensure!(
        data.len() == expected,
        "Expected {expected} samples for a {}x{} channel, found {}",
        size.0,
        size.1,
        data.len()
    );
    Ok(Image::from_vec(size, data)?)
}

/// One line per row, samples separated by single spaces.
pub fn format_channel(plane: &Image<u8>) -> String {
    let mut out = String::with_capacity(plane.as_slice().len() * 4);
    for y in 0..plane.size().1 {
        let line: Vec<String> = plane.row(y).iter().map(u8::to_string).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {:?}", path))
}

pub fn read_dimensions(path: &Path) -> Result<(usize, usize)> {
    parse_dimensions(&read_text(path)?)
        .wrap_err_with(|| format!("Invalid dimension file {:?}", path))
}

pub fn read_quant_table(path: &Path) -> Result<QuantizationMatrix> {
    parse_quant_table(&read_text(path)?)
        .wrap_err_with(|| format!("Invalid quantization table {:?}", path))
}

pub fn read_channel(path: &Path, size: (usize, usize)) -> Result<Image<u8>> {
    parse_channel(&read_text(path)?, size)
        .wrap_err_with(|| format!("Invalid channel file {:?}", path))
}
