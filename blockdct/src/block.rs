// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Tiling of planes into 8x8 blocks.
//!
//! A plane is treated as a virtual canvas whose dimensions are rounded up to
//! multiples of 8. Samples outside the plane replicate the nearest edge
//! sample; the padded canvas is never materialized. Blocks are numbered in
//! canonical order: rows of blocks top to bottom, each left to right.

use tracing::trace;

use crate::error::{Error, Result};
use crate::image::{Image, Plane};
use crate::util::{replicate_edge, round_up_to_block};
use crate::{Block, BLOCK_DIM, BLOCK_SIZE};

const LEVEL_SHIFT: f32 = 128.0;

/// Block layout of a plane of a given size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockGrid {
    size: (usize, usize),
    blocks: (usize, usize),
}

impl BlockGrid {
    pub fn new(size: (usize, usize)) -> Result<BlockGrid> {
        let (xsize, ysize) = size;
        if xsize == 0 || ysize == 0 {
            return Err(Error::InvalidImageSize(xsize, ysize));
        }
        if xsize as u64 >= i64::MAX as u64 / 4 || ysize as u64 >= i64::MAX as u64 / 4 {
            return Err(Error::ImageSizeTooLarge(xsize, ysize));
        }
        let blocks = (xsize.div_ceil(BLOCK_DIM), ysize.div_ceil(BLOCK_DIM));
        blocks
            .0
            .checked_mul(blocks.1)
            .ok_or(Error::ImageSizeTooLarge(xsize, ysize))?;
        Ok(BlockGrid { size, blocks })
    }

    /// True dimensions of the plane.
    pub fn size(&self) -> (usize, usize) {
        self.size
    }

    /// Dimensions of the virtual canvas.
    pub fn padded_size(&self) -> (usize, usize) {
        (round_up_to_block(self.size.0), round_up_to_block(self.size.1))
    }

    pub fn blocks_x(&self) -> usize {
        self.blocks.0
    }

    pub fn blocks_y(&self) -> usize {
        self.blocks.1
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.0 * self.blocks.1
    }

    /// Canvas coordinates of the top-left sample of block `index`.
    #[inline]
    pub fn block_origin(&self, index: usize) -> (usize, usize) {
        debug_assert!(index < self.num_blocks());
        (
            (index % self.blocks.0) * BLOCK_DIM,
            (index / self.blocks.0) * BLOCK_DIM,
        )
    }
}

/// Extracts level-shifted spatial blocks from a plane.
pub struct BlockPartitioner<'a> {
    plane: &'a Plane,
    grid: BlockGrid,
}

impl<'a> BlockPartitioner<'a> {
    pub fn new(plane: &'a Plane) -> Result<BlockPartitioner<'a>> {
        let grid = BlockGrid::new(plane.size())?;
        trace!(?grid, "partitioning plane");
        Ok(BlockPartitioner { plane, grid })
    }

    pub fn grid(&self) -> &BlockGrid {
        &self.grid
    }

    /// Sample at canvas position `(x, y)`, which may lie in the padding.
    #[inline]
    pub fn sample(&self, x: usize, y: usize) -> u8 {
        let (xsize, ysize) = self.plane.size();
        self.plane.get(
            replicate_edge(x as isize, xsize),
            replicate_edge(y as isize, ysize),
        )
    }

    /// Spatial block `index`, with 128 subtracted from every sample.
    pub fn block(&self, index: usize) -> Block {
        let (x0, y0) = self.grid.block_origin(index);
        let (xsize, ysize) = self.plane.size();
        let mut block = [0.0f32; BLOCK_SIZE];
        for (dy, row) in block.chunks_exact_mut(BLOCK_DIM).enumerate() {
            let src = self.plane.row(replicate_edge((y0 + dy) as isize, ysize));
            for (dx, out) in row.iter_mut().enumerate() {
                *out = src[replicate_edge((x0 + dx) as isize, xsize)] as f32 - LEVEL_SHIFT;
            }
        }
        block
    }

    /// All blocks in canonical order.
    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        (0..self.grid.num_blocks()).map(|index| self.block(index))
    }
}

/// Writes reconstructed spatial blocks back into a plane.
///
/// Samples are shifted back by 128 and clamped to [0, 255] but left
/// unrounded. Samples falling in the padding are dropped.
pub struct PlaneAssembler {
    grid: BlockGrid,
    image: Image<f32>,
}

impl PlaneAssembler {
    pub fn new(size: (usize, usize)) -> Result<PlaneAssembler> {
        let grid = BlockGrid::new(size)?;
        Ok(PlaneAssembler {
            grid,
            image: Image::new(size)?,
        })
    }

    pub fn grid(&self) -> &BlockGrid {
        &self.grid
    }

    pub fn place(&mut self, index: usize, block: &Block) {
        let (x0, y0) = self.grid.block_origin(index);
        let (xsize, ysize) = self.grid.size();
        let width = BLOCK_DIM.min(xsize - x0);
        for (dy, src) in block
            .chunks_exact(BLOCK_DIM)
            .take(BLOCK_DIM.min(ysize - y0))
            .enumerate()
        {
            let row = &mut self.image.row_mut(y0 + dy)[x0..x0 + width];
            for (out, &v) in row.iter_mut().zip(src) {
                *out = (v + LEVEL_SHIFT).clamp(0.0, 255.0);
            }
        }
    }

    pub fn finish(self) -> Image<f32> {
        self.image
    }
}
