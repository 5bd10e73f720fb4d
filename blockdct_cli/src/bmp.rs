// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Minimal 24-bit uncompressed BMP support.

use std::path::Path;

use blockdct::image::Image;
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use color_eyre::eyre::{OptionExt, Result, WrapErr, ensure};
use tracing::debug;

const FILE_HEADER_SIZE: usize = 14;
const INFO_HEADER_SIZE: usize = 40;
const HEADER_SIZE: usize = FILE_HEADER_SIZE + INFO_HEADER_SIZE;
// "BM"
const SIGNATURE: u16 = 0x4D42;

/// Bytes per pixel row, padded to a multiple of 4.
fn row_stride(width: usize) -> Option<usize> {
    Some(width.checked_mul(3)?.checked_add(3)? & !3)
}

/// Parses a BMP file into R, G, B planes, top row first.
pub fn decode_bmp(data: &[u8]) -> Result<[Image<u8>; 3]> {
    ensure!(
        data.len() >= HEADER_SIZE,
        "BMP file too short: {} bytes",
        data.len()
    );
    ensure!(
        LittleEndian::read_u16(&data[0..]) == SIGNATURE,
        "Not a BMP file"
    );
    let pixel_offset = LittleEndian::read_u32(&data[10..]) as usize;
    let info_size = LittleEndian::read_u32(&data[14..]) as usize;
    ensure!(
        info_size >= INFO_HEADER_SIZE,
        "Unsupported BMP info header size {info_size}"
    );
    let width = LittleEndian::read_i32(&data[18..]);
    let height = LittleEndian::read_i32(&data[22..]);
    let bit_count = LittleEndian::read_u16(&data[28..]);
    let compression = LittleEndian::read_u32(&data[30..]);
    ensure!(
        bit_count == 24,
        "Only 24-bit BMP files are supported, found {bit_count} bits per pixel"
    );
    ensure!(
        compression == 0,
        "Only uncompressed BMP files are supported, found compression {compression}"
    );
    ensure!(
        width > 0 && height != 0,
        "Invalid BMP dimensions {width}x{height}"
    );

    // Negative heights mark top-down files.
    let top_down = height < 0;
    let (width, height) = (width as usize, height.unsigned_abs() as usize);
    let stride = row_stride(width).ok_or_eyre("BMP row size overflows")?;
    let end = stride
        .checked_mul(height)
        .and_then(|n| n.checked_add(pixel_offset))
        .ok_or_eyre("BMP pixel data size overflows")?;
    ensure!(
        data.len() >= end,
        "BMP pixel data truncated: need {end} bytes, file has {}",
        data.len()
    );
    debug!(width, height, top_down, "decoding BMP");

    let size = (width, height);
    let mut planes = [Image::new(size)?, Image::new(size)?, Image::new(size)?];
    for file_row in 0..height {
        let y = if top_down {
            file_row
        } else {
            height - 1 - file_row
        };
        let start = pixel_offset + file_row * stride;
        let src = &data[start..start + width * 3];
        let [r, g, b] = &mut planes;
        let (r, g, b) = (r.row_mut(y), g.row_mut(y), b.row_mut(y));
        for (x, bgr) in src.chunks_exact(3).enumerate() {
            b[x] = bgr[0];
            g[x] = bgr[1];
            r[x] = bgr[2];
        }
    }
    Ok(planes)
}

/// Serializes R, G, B planes as a bottom-up BMP file.
pub fn encode_bmp(planes: &[Image<u8>; 3]) -> Result<Vec<u8>> {
    let [r, g, b] = planes;
    r.check_same_size(g)?;
    r.check_same_size(b)?;
    let (width, height) = r.size();
    let stride = row_stride(width).ok_or_eyre("Image too wide for BMP")?;
    let image_size = stride
        .checked_mul(height)
        .ok_or_eyre("Image too large for BMP")?;
    let file_size = u32::try_from(HEADER_SIZE + image_size).wrap_err("Image too large for BMP")?;
    let xsize = i32::try_from(width).wrap_err("Image too wide for BMP")?;
    let ysize = i32::try_from(height).wrap_err("Image too tall for BMP")?;

    let mut out = Vec::with_capacity(file_size as usize);
    out.write_u16::<LittleEndian>(SIGNATURE)?;
    out.write_u32::<LittleEndian>(file_size)?;
    out.write_u32::<LittleEndian>(0)?;
    out.write_u32::<LittleEndian>(HEADER_SIZE as u32)?;

    out.write_u32::<LittleEndian>(INFO_HEADER_SIZE as u32)?;
    out.write_i32::<LittleEndian>(xsize)?;
    out.write_i32::<LittleEndian>(ysize)?;
    // planes, bits per pixel
    out.write_u16::<LittleEndian>(1)?;
    out.write_u16::<LittleEndian>(24)?;
    // compression, image size, resolution, palette
    out.write_u32::<LittleEndian>(0)?;
    out.write_u32::<LittleEndian>(image_size as u32)?;
    for _ in 0..4 {
        out.write_u32::<LittleEndian>(0)?;
    }
    debug_assert_eq!(out.len(), HEADER_SIZE);

    let padding = stride - width * 3;
    for y in (0..height).rev() {
        for ((&rv, &gv), &bv) in r.row(y).iter().zip(g.row(y)).zip(b.row(y)) {
            out.extend_from_slice(&[bv, gv, rv]);
        }
        out.resize(out.len() + padding, 0);
    }
    Ok(out)
}

pub fn read_bmp(path: &Path) -> Result<[Image<u8>; 3]> {
    let data =
        std::fs::read(path).wrap_err_with(|| format!("Failed to read BMP file {:?}", path))?;
    decode_bmp(&data).wrap_err_with(|| format!("Invalid BMP file {:?}", path))
}

pub fn write_bmp(path: &Path, planes: &[Image<u8>; 3]) -> Result<()> {
    let data = encode_bmp(planes)?;
    std::fs::write(path, data).wrap_err_with(|| format!("Failed to write BMP file {:?}", path))
}
