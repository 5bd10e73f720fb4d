// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

#![deny(unsafe_code)]
pub mod block;
pub mod color;
pub mod error;
pub mod image;
pub mod metrics;
pub mod pipeline;
pub mod quant;
pub mod stream;
pub mod util;

pub use blockdct_transforms::{forward_dct, inverse_dct, BasisTable, Block, BLOCK_DIM, BLOCK_SIZE};
