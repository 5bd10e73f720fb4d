// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Full-range (JFIF) RGB <-> YCbCr conversion.
//!
//! The two directions round differently and must keep doing so to reproduce
//! existing outputs: the forward conversion computes in `f64` and rounds by
//! adding 0.5 and truncating toward zero, the inverse computes in `f32` and
//! rounds half away from zero.

use tracing::instrument;

use crate::error::Result;
use crate::image::Image;

#[inline]
fn clamp_sample(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Converts one RGB pixel to YCbCr.
#[inline]
pub fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let y = 0.299 * r + 0.587 * g + 0.114 * b + 0.5;
    let cb = -0.168736 * r - 0.331264 * g + 0.5 * b + 128.0 + 0.5;
    let cr = 0.5 * r - 0.418688 * g - 0.081312 * b + 128.0 + 0.5;
    [
        clamp_sample(y as i32),
        clamp_sample(cb as i32),
        clamp_sample(cr as i32),
    ]
}

/// Converts one YCbCr pixel back to RGB. Inputs may be fractional.
#[inline]
pub fn ycbcr_to_rgb(y: f32, cb: f32, cr: f32) -> [u8; 3] {
    let cb = cb - 128.0;
    let cr = cr - 128.0;
    [
        clamp_sample((y + 1.402 * cr).round() as i32),
        clamp_sample((y - 0.344136 * cb - 0.714136 * cr).round() as i32),
        clamp_sample((y + 1.772 * cb).round() as i32),
    ]
}

/// Converts R, G, B planes into Y, Cb, Cr planes.
#[instrument(level = "debug", skip_all, err)]
pub fn rgb_planes_to_ycbcr(rgb: &[Image<u8>; 3]) -> Result<[Image<u8>; 3]> {
    let [r, g, b] = rgb;
    r.check_same_size(g)?;
    r.check_same_size(b)?;
    let size = r.size();
    let mut out = [
        Image::new(size)?,
        Image::new(size)?,
        Image::new(size)?,
    ];
    let [y_plane, cb_plane, cr_plane] = &mut out;
    for row in 0..size.1 {
        let (rr, gr, br) = (r.row(row), g.row(row), b.row(row));
        let (yr, cbr, crr) = (
            y_plane.row_mut(row),
            cb_plane.row_mut(row),
            cr_plane.row_mut(row),
        );
        for x in 0..size.0 {
            [yr[x], cbr[x], crr[x]] = rgb_to_ycbcr(rr[x], gr[x], br[x]);
        }
    }
    Ok(out)
}

/// Converts reconstructed Y, Cb, Cr planes into R, G, B planes.
#[instrument(level = "debug", skip_all, err)]
pub fn ycbcr_planes_to_rgb(ycbcr: &[Image<f32>; 3]) -> Result<[Image<u8>; 3]> {
    let [y, cb, cr] = ycbcr;
    y.check_same_size(cb)?;
    y.check_same_size(cr)?;
    let size = y.size();
    let mut r_data = Vec::with_capacity(size.0 * size.1);
    let mut g_data = Vec::with_capacity(size.0 * size.1);
    let mut b_data = Vec::with_capacity(size.0 * size.1);
    for row in 0..size.1 {
        for ((&yv, &cbv), &crv) in y.row(row).iter().zip(cb.row(row)).zip(cr.row(row)) {
            let [r, g, b] = ycbcr_to_rgb(yv, cbv, crv);
            r_data.push(r);
            g_data.push(g);
            b_data.push(b);
        }
    }
    Ok([
        Image::from_vec(size, r_data)?,
        Image::from_vec(size, g_data)?,
        Image::from_vec(size, b_data)?,
    ])
}
