// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),
    #[error("Image size too large: {0}x{1}")]
    ImageSizeTooLarge(usize, usize),
    #[error("Invalid image size: {0}x{1}")]
    InvalidImageSize(usize, usize),
    #[error("Plane size mismatch: {0}x{1} vs {2}x{3}")]
    PlaneSizeMismatch(usize, usize, usize, usize),
    #[error("Plane data has {found} samples, expected {expected}")]
    PlaneDataLength { expected: usize, found: usize },
    #[error("Invalid quantization table: {0} entries, expected 64")]
    InvalidQuantTableLength(usize),
    #[error("Invalid quantization entry {value} at position {index}, must be in 1..=65535")]
    InvalidQuantEntry { index: usize, value: i64 },
    #[error("Coefficient stream truncated: expected {expected} blocks, found {found}")]
    StreamTruncated { expected: usize, found: usize },
    #[error("Coefficient stream has trailing data after {0} blocks")]
    StreamTrailingData(usize),
    #[error("Block count mismatch for {channel}: expected {expected}, found {found}")]
    BlockCountMismatch {
        channel: &'static str,
        expected: usize,
        found: usize,
    },
    // Generic arithmetic overflow. Prefer using other errors if possible.
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}

/// Coarse classification of [`Error`], used for diagnostics.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// A file or stream could not be read or written.
    Io,
    /// Malformed, truncated or inconsistent data.
    Format,
    /// A value outside its representable or permitted range.
    Range,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::PlaneSizeMismatch(..)
            | Error::PlaneDataLength { .. }
            | Error::InvalidQuantTableLength(_)
            | Error::StreamTruncated { .. }
            | Error::StreamTrailingData(_)
            | Error::BlockCountMismatch { .. } => ErrorKind::Format,
            Error::OutOfMemory(_)
            | Error::ImageSizeTooLarge(..)
            | Error::InvalidImageSize(..)
            | Error::InvalidQuantEntry { .. }
            | Error::ArithmeticOverflow => ErrorKind::Range,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
