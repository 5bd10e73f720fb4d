// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Direct (non-factored) 8x8 DCT-II and its inverse.
//!
//! Both directions evaluate the full 64-term sum per coefficient in `f32`, in
//! a fixed summation order, so that coefficient files produced by earlier
//! encoders are reproduced bit for bit.

use crate::{BasisTable, Block, BLOCK_DIM, BLOCK_SIZE};

/// Forward 2D DCT of a level-shifted spatial block.
///
/// `F(u,v) = 1/4 a(u) a(v) sum_x sum_y f(x,y) cos((2x+1)u pi/16) cos((2y+1)v pi/16)`
pub fn forward_dct(basis: &BasisTable, input: &Block) -> Block {
    let mut output = [0.0f32; BLOCK_SIZE];
    for u in 0..BLOCK_DIM {
        for v in 0..BLOCK_DIM {
            let mut sum = 0.0f32;
            for x in 0..BLOCK_DIM {
                for y in 0..BLOCK_DIM {
                    sum += input[y * BLOCK_DIM + x] * basis.cos(u, x) * basis.cos(v, y);
                }
            }
            output[v * BLOCK_DIM + u] = 0.25 * basis.alpha(u) * basis.alpha(v) * sum;
        }
    }
    output
}

/// Inverse 2D DCT, the adjoint of [`forward_dct`] over the same basis.
pub fn inverse_dct(basis: &BasisTable, input: &Block) -> Block {
    let mut output = [0.0f32; BLOCK_SIZE];
    for y in 0..BLOCK_DIM {
        for x in 0..BLOCK_DIM {
            let mut sum = 0.0f32;
            for v in 0..BLOCK_DIM {
                for u in 0..BLOCK_DIM {
                    sum += basis.alpha(u)
                        * basis.alpha(v)
                        * input[v * BLOCK_DIM + u]
                        * basis.cos(u, x)
                        * basis.cos(v, y);
                }
            }
            output[y * BLOCK_DIM + x] = 0.25 * sum;
        }
    }
    output
}

/// Sum of squares of a block, accumulated in double precision.
pub fn block_energy(block: &Block) -> f64 {
    block.iter().map(|&v| v as f64 * v as f64).sum()
}
