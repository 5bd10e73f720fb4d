// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Distortion measures for reconstructed planes and quantized coefficients.

use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::image::Image;
use crate::pipeline::Channel;
use crate::quant::{dequantize, CoefficientBlock, QuantizationMatrix};
use crate::{Block, BLOCK_SIZE};

const PEAK: f64 = 255.0;

pub fn mean_squared_error(original: &Image<u8>, reconstructed: &Image<u8>) -> Result<f64> {
    original.check_same_size(reconstructed)?;
    let sum: f64 = original
        .as_slice()
        .iter()
        .zip(reconstructed.as_slice())
        .map(|(&a, &b)| {
            let d = a as f64 - b as f64;
            d * d
        })
        .sum();
    Ok(sum / original.as_slice().len() as f64)
}

/// Peak signal-to-noise ratio in dB. Identical planes give `f64::INFINITY`.
pub fn psnr(original: &Image<u8>, reconstructed: &Image<u8>) -> Result<f64> {
    let mse = mean_squared_error(original, reconstructed)?;
    if mse == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(10.0 * (PEAK * PEAK / mse).log10())
}

/// Signal-to-quantization-noise ratio in dB for each of the 64 frequency
/// positions, over all blocks of a channel.
///
/// `original` holds the pre-quantization coefficients and `coefficients` the
/// quantized ones, both in canonical order. A position without noise yields
/// `f64::INFINITY`.
#[instrument(level = "debug", skip(original, coefficients, quant), err)]
pub fn sqnr_per_frequency(
    channel: Channel,
    original: &[Block],
    coefficients: &[CoefficientBlock],
    quant: &QuantizationMatrix,
) -> Result<[f64; BLOCK_SIZE]> {
    if original.len() != coefficients.len() {
        return Err(Error::BlockCountMismatch {
            channel: channel.name(),
            expected: original.len(),
            found: coefficients.len(),
        });
    }
    let mut signal = [0.0f64; BLOCK_SIZE];
    let mut noise = [0.0f64; BLOCK_SIZE];
    for (block, quantized) in original.iter().zip(coefficients) {
        let restored = dequantize(quantized, quant);
        for k in 0..BLOCK_SIZE {
            let f = block[k] as f64;
            let d = f - restored[k] as f64;
            signal[k] += f * f;
            noise[k] += d * d;
        }
    }
    let sqnr = std::array::from_fn(|k| {
        if noise[k] == 0.0 {
            f64::INFINITY
        } else {
            10.0 * (signal[k] / noise[k]).log10()
        }
    });
    debug!(dc = sqnr[0], "computed per-frequency SQNR");
    Ok(sqnr)
}
