// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::f64::consts::PI;
use std::sync::OnceLock;

use array_init::array_init;

use crate::BLOCK_DIM;

/// Cosine basis shared by the forward and inverse 8x8 transforms.
///
/// `cos(u, x)` is `cos((2x + 1) * u * pi / 16)`, evaluated in double precision
/// and rounded to `f32` once. Both transform directions must read from the same
/// table for the inverse to be the exact adjoint of the forward transform.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisTable {
    cos: [[f32; BLOCK_DIM]; BLOCK_DIM],
    alpha: [f32; BLOCK_DIM],
}

impl BasisTable {
    pub fn new() -> BasisTable {
        let cos = array_init(|u: usize| {
            array_init(|x: usize| (((2 * x + 1) * u) as f64 * PI / 16.0).cos() as f32)
        });
        let alpha = array_init(|u: usize| {
            if u == 0 {
                1.0f32 / 2.0f64.sqrt() as f32
            } else {
                1.0
            }
        });
        BasisTable { cos, alpha }
    }

    /// Returns the process-wide table, building it on first use.
    pub fn standard() -> &'static BasisTable {
        static TABLE: OnceLock<BasisTable> = OnceLock::new();
        TABLE.get_or_init(BasisTable::new)
    }

    #[inline(always)]
    pub fn cos(&self, freq: usize, pos: usize) -> f32 {
        self.cos[freq][pos]
    }

    /// Normalization factor: `1/sqrt(2)` for the DC term, 1 otherwise.
    #[inline(always)]
    pub fn alpha(&self, freq: usize) -> f32 {
        self.alpha[freq]
    }

    pub fn rows(&self) -> &[[f32; BLOCK_DIM]; BLOCK_DIM] {
        &self.cos
    }
}

impl Default for BasisTable {
    fn default() -> Self {
        BasisTable::new()
    }
}
