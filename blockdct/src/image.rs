// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;

use tracing::{debug, instrument};

use crate::error::{Error, Result};

mod private {
    pub trait Sealed {}
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DataTypeTag {
    U8,
    F32,
}

pub trait ImageDataType: private::Sealed + Copy + Default + 'static + Debug + PartialEq {
    /// ID of this data type. Different types *must* have different values.
    const DATA_TYPE_ID: DataTypeTag;

    #[cfg(test)]
    fn random<R: rand::Rng>(rng: &mut R) -> Self;
}

impl private::Sealed for u8 {}
impl ImageDataType for u8 {
    const DATA_TYPE_ID: DataTypeTag = DataTypeTag::U8;
    #[cfg(test)]
    fn random<R: rand::Rng>(rng: &mut R) -> Self {
        rng.random()
    }
}

impl private::Sealed for f32 {}
impl ImageDataType for f32 {
    const DATA_TYPE_ID: DataTypeTag = DataTypeTag::F32;
    #[cfg(test)]
    fn random<R: rand::Rng>(rng: &mut R) -> Self {
        rng.random_range(0.0..=255.0)
    }
}

/// A single-channel, row-major, top-down plane of samples.
#[derive(Clone, PartialEq)]
pub struct Image<T: ImageDataType> {
    size: (usize, usize),
    data: Vec<T>,
}

/// A plane of 8-bit samples.
pub type Plane = Image<u8>;

impl<T: ImageDataType> Debug for Image<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {}x{}", T::DATA_TYPE_ID, self.size.0, self.size.1)
    }
}

impl<T: ImageDataType> Image<T> {
    #[instrument(err)]
    pub fn new(size: (usize, usize)) -> Result<Image<T>> {
        Self::new_with_value(size, T::default())
    }

    pub fn new_with_value(size: (usize, usize), value: T) -> Result<Image<T>> {
        let (xsize, ysize) = size;
        // These limits let us not worry about overflows.
        if xsize as u64 >= i64::MAX as u64 / 4 || ysize as u64 >= i64::MAX as u64 / 4 {
            return Err(Error::ImageSizeTooLarge(xsize, ysize));
        }
        let total_size = xsize
            .checked_mul(ysize)
            .ok_or(Error::ImageSizeTooLarge(xsize, ysize))?;
        if xsize == 0 || ysize == 0 {
            return Err(Error::InvalidImageSize(xsize, ysize));
        }
        debug!(xsize, ysize, "allocating plane");
        let mut data = vec![];
        data.try_reserve_exact(total_size)?;
        data.resize(total_size, value);
        Ok(Image {
            size: (xsize, ysize),
            data,
        })
    }

    /// Wraps row-major samples. `data.len()` must be `xsize * ysize`.
    pub fn from_vec(size: (usize, usize), data: Vec<T>) -> Result<Image<T>> {
        let (xsize, ysize) = size;
        if xsize == 0 || ysize == 0 {
            return Err(Error::InvalidImageSize(xsize, ysize));
        }
        let total_size = xsize
            .checked_mul(ysize)
            .ok_or(Error::ImageSizeTooLarge(xsize, ysize))?;
        if data.len() != total_size {
            return Err(Error::PlaneDataLength {
                expected: total_size,
                found: data.len(),
            });
        }
        Ok(Image {
            size: (xsize, ysize),
            data,
        })
    }

    #[cfg(test)]
    pub fn new_random<R: rand::Rng>(size: (usize, usize), rng: &mut R) -> Result<Image<T>> {
        let mut img = Self::new(size)?;
        img.data.iter_mut().for_each(|x| *x = T::random(rng));
        Ok(img)
    }

    pub fn size(&self) -> (usize, usize) {
        self.size
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        let xsize = self.size.0;
        &self.data[y * xsize..(y + 1) * xsize]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let xsize = self.size.0;
        &mut self.data[y * xsize..(y + 1) * xsize]
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[y * self.size.0 + x]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn check_same_size<U: ImageDataType>(&self, other: &Image<U>) -> Result<()> {
        if self.size != other.size() {
            return Err(Error::PlaneSizeMismatch(
                self.size.0,
                self.size.1,
                other.size().0,
                other.size().1,
            ));
        }
        Ok(())
    }
}

impl Image<f32> {
    /// Rounds to the nearest sample (ties to even), clamping to [0, 255].
    pub fn to_samples(&self) -> Result<Image<u8>> {
        let data = self
            .data
            .iter()
            .map(|v| v.round_ties_even().clamp(0.0, 255.0) as u8)
            .collect();
        Image::from_vec(self.size, data)
    }
}

impl Image<u8> {
    pub fn to_f32(&self) -> Result<Image<f32>> {
        Image::from_vec(self.size, self.data.iter().map(|&v| v as f32).collect())
    }
}
