// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

pub mod basis;
pub mod dct;

pub use basis::BasisTable;
pub use dct::*;

/// Side length of a transform block.
pub const BLOCK_DIM: usize = 8;
/// Number of values in a transform block.
pub const BLOCK_SIZE: usize = BLOCK_DIM * BLOCK_DIM;

/// An 8x8 block of samples or coefficients, row-major.
///
/// Spatial blocks are indexed as `y * BLOCK_DIM + x`; frequency blocks as
/// `v * BLOCK_DIM + u`, with `u` the horizontal and `v` the vertical frequency.
pub type Block = [f32; BLOCK_SIZE];
