// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::error::{Error, Result};
use crate::{Block, BLOCK_DIM, BLOCK_SIZE};

/// Quantized DCT coefficients of one block, row-major by (v, u).
pub type CoefficientBlock = [i16; BLOCK_SIZE];

/// Annex K luminance table of the JPEG standard, row-major.
#[rustfmt::skip]
pub const STANDARD_LUMA: [u16; BLOCK_SIZE] = [
    16, 11, 10, 16, 24, 40, 51, 61,
    12, 12, 14, 19, 26, 58, 60, 55,
    14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62,
    18, 22, 37, 56, 68, 109, 103, 77,
    24, 35, 55, 64, 81, 104, 113, 92,
    49, 64, 78, 87, 103, 121, 120, 101,
    72, 92, 95, 98, 112, 100, 103, 99,
];

/// Annex K chrominance table of the JPEG standard, row-major.
#[rustfmt::skip]
pub const STANDARD_CHROMA: [u16; BLOCK_SIZE] = [
    17, 18, 24, 47, 99, 99, 99, 99,
    18, 21, 26, 66, 99, 99, 99, 99,
    24, 26, 56, 99, 99, 99, 99, 99,
    47, 66, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
];

/// An 8x8 table of per-frequency divisors. Every entry is at least 1.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QuantizationMatrix {
    values: [u16; BLOCK_SIZE],
}

impl QuantizationMatrix {
    pub fn new(values: [u16; BLOCK_SIZE]) -> Result<QuantizationMatrix> {
        if let Some(index) = values.iter().position(|&q| q == 0) {
            return Err(Error::InvalidQuantEntry { index, value: 0 });
        }
        Ok(QuantizationMatrix { values })
    }

    /// Builds a matrix from untrusted integers, e.g. parsed from a text file.
    pub fn from_slice(values: &[i64]) -> Result<QuantizationMatrix> {
        if values.len() != BLOCK_SIZE {
            return Err(Error::InvalidQuantTableLength(values.len()));
        }
        let mut table = [0u16; BLOCK_SIZE];
        for (index, (&value, entry)) in values.iter().zip(table.iter_mut()).enumerate() {
            *entry = u16::try_from(value)
                .ok()
                .filter(|&q| q > 0)
                .ok_or(Error::InvalidQuantEntry { index, value })?;
        }
        Ok(QuantizationMatrix { values: table })
    }

    pub fn standard_luma() -> QuantizationMatrix {
        QuantizationMatrix {
            values: STANDARD_LUMA,
        }
    }

    pub fn standard_chroma() -> QuantizationMatrix {
        QuantizationMatrix {
            values: STANDARD_CHROMA,
        }
    }

    /// A matrix with every entry equal to `q`. `flat(1)` is the identity.
    pub fn flat(q: u16) -> Result<QuantizationMatrix> {
        Self::new([q; BLOCK_SIZE])
    }

    /// Multiplies every entry by `factor`.
    pub fn scaled(&self, factor: u16) -> Result<QuantizationMatrix> {
        let mut values = [0u16; BLOCK_SIZE];
        for (out, &q) in values.iter_mut().zip(self.values.iter()) {
            *out = q.checked_mul(factor).ok_or(Error::ArithmeticOverflow)?;
        }
        Self::new(values)
    }

    pub fn values(&self) -> &[u16; BLOCK_SIZE] {
        &self.values
    }

    /// Divisor for horizontal frequency `u` and vertical frequency `v`.
    #[inline]
    pub fn get(&self, u: usize, v: usize) -> u16 {
        self.values[v * BLOCK_DIM + u]
    }
}

/// Divides each coefficient by its table entry, rounding half to even and
/// saturating to the `i16` range.
pub fn quantize(block: &Block, quant: &QuantizationMatrix) -> CoefficientBlock {
    let mut out = [0i16; BLOCK_SIZE];
    for ((out, &coeff), &q) in out.iter_mut().zip(block.iter()).zip(quant.values.iter()) {
        let v = (coeff / q as f32).round_ties_even();
        *out = v.clamp(i16::MIN as f32, i16::MAX as f32) as i16;
    }
    out
}

/// Multiplies each quantized coefficient back by its table entry.
pub fn dequantize(coefficients: &CoefficientBlock, quant: &QuantizationMatrix) -> Block {
    let mut out = [0.0f32; BLOCK_SIZE];
    for ((out, &c), &q) in out
        .iter_mut()
        .zip(coefficients.iter())
        .zip(quant.values.iter())
    {
        *out = (c as i32 * q as i32) as f32;
    }
    out
}

#[cfg(test)]
mod test {
    use blockdct_test_utils::assert_all_almost_eq;
    use blockdct_transforms::{forward_dct, inverse_dct, BasisTable};
    use test_log::test;

    use super::*;
    use crate::error::ErrorKind;

    fn test_block() -> Block {
        std::array::from_fn(|i| {
            let (x, y) = ((i % BLOCK_DIM) as f32, (i / BLOCK_DIM) as f32);
            (x * 13.0 - y * 7.0 + (x * y) * 1.5) % 200.0 - 100.0
        })
    }

    fn reconstruction_error(block: &Block, quant: &QuantizationMatrix) -> f64 {
        let basis = BasisTable::standard();
        let coeffs = quantize(&forward_dct(basis, block), quant);
        let restored = inverse_dct(basis, &dequantize(&coeffs, quant));
        block
            .iter()
            .zip(restored.iter())
            .map(|(&a, &b)| (a as f64 - b as f64).powi(2))
            .sum()
    }

    #[test]
    fn rejects_zero_entries() {
        let mut values = STANDARD_LUMA;
        values[17] = 0;
        let err = QuantizationMatrix::new(values).unwrap_err();
        assert!(matches!(err, Error::InvalidQuantEntry { index: 17, .. }));
        assert_eq!(err.kind(), ErrorKind::Range);
        assert!(QuantizationMatrix::flat(0).is_err());
    }

    #[test]
    fn from_slice_validates() {
        assert!(matches!(
            QuantizationMatrix::from_slice(&[1; 63]),
            Err(Error::InvalidQuantTableLength(63))
        ));
        let mut values = [5i64; BLOCK_SIZE];
        values[3] = -2;
        assert!(matches!(
            QuantizationMatrix::from_slice(&values),
            Err(Error::InvalidQuantEntry { index: 3, value: -2 })
        ));
        values[3] = 70000;
        assert!(QuantizationMatrix::from_slice(&values).is_err());
        let luma: Vec<i64> = STANDARD_LUMA.iter().map(|&q| q as i64).collect();
        assert_eq!(
            QuantizationMatrix::from_slice(&luma).unwrap(),
            QuantizationMatrix::standard_luma()
        );
    }

    #[test]
    fn indexing_is_row_major() {
        let luma = QuantizationMatrix::standard_luma();
        assert_eq!(luma.get(0, 0), 16);
        assert_eq!(luma.get(1, 0), 11);
        assert_eq!(luma.get(0, 1), 12);
        assert_eq!(luma.get(7, 7), 99);
    }

    #[test]
    fn rounds_half_to_even() {
        let quant = QuantizationMatrix::flat(2).unwrap();
        let mut block = [0.0f32; BLOCK_SIZE];
        block[..6].copy_from_slice(&[1.0, 3.0, 5.0, -1.0, -3.0, 2.9]);
        let coeffs = quantize(&block, &quant);
        assert_eq!(&coeffs[..6], &[0, 2, 2, 0, -2, 1]);
    }

    #[test]
    fn saturates() {
        let quant = QuantizationMatrix::flat(1).unwrap();
        let mut block = [0.0f32; BLOCK_SIZE];
        block[0] = 1e9;
        block[1] = -1e9;
        block[2] = 32767.4;
        let coeffs = quantize(&block, &quant);
        assert_eq!(&coeffs[..3], &[i16::MAX, i16::MIN, i16::MAX]);
    }

    #[test]
    fn dequantize_multiplies() {
        let quant = QuantizationMatrix::standard_chroma();
        let mut coeffs = [0i16; BLOCK_SIZE];
        coeffs[0] = -60;
        coeffs[63] = i16::MIN;
        let block = dequantize(&coeffs, &quant);
        assert_eq!(block[0], -1020.0);
        assert_eq!(block[63], -32768.0 * 99.0);
    }

    #[test]
    fn identity_table_keeps_integers() {
        let quant = QuantizationMatrix::flat(1).unwrap();
        let block: Block = std::array::from_fn(|i| i as f32 - 32.0);
        assert_all_almost_eq!(dequantize(&quantize(&block, &quant), &quant), block, 0.0);
    }

    #[test]
    fn coarser_tables_never_help() {
        let block = test_block();
        for base in [
            QuantizationMatrix::flat(1).unwrap(),
            QuantizationMatrix::standard_luma(),
            QuantizationMatrix::standard_chroma(),
        ] {
            let base_error = reconstruction_error(&block, &base);
            for k in 2..=5 {
                let scaled_error = reconstruction_error(&block, &base.scaled(k).unwrap());
                assert!(
                    scaled_error >= base_error * (1.0 - 1e-4) - 1e-3,
                    "k={k}: {scaled_error} < {base_error}"
                );
            }
        }
    }

    #[test]
    fn scaled_overflow() {
        let quant = QuantizationMatrix::flat(40000).unwrap();
        assert!(matches!(quant.scaled(2), Err(Error::ArithmeticOverflow)));
    }
}
