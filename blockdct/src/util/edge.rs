// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use blockdct_transforms::BLOCK_DIM;

/// Clamps a coordinate into the `[0; s)` range, replicating the edge sample.
#[inline]
pub fn replicate_edge(v: isize, s: usize) -> usize {
    debug_assert!(s > 0);
    v.clamp(0, s as isize - 1) as usize
}

/// Rounds `v` up to the next multiple of the block size.
#[inline]
pub fn round_up_to_block(v: usize) -> usize {
    v.div_ceil(BLOCK_DIM) * BLOCK_DIM
}
