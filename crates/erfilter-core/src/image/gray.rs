//! Single-channel 8-bit image

use super::check_dimensions;
use crate::box_::Box;
use crate::error::{Error, Result};

/// Row-major 8-bit grayscale image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl GrayImage {
    /// Create a new image with all pixels set to zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::filled(width, height, 0)
    }

    /// Create a new image with all pixels set to `value`.
    pub fn filled(width: u32, height: u32, value: u8) -> Result<Self> {
        let len = check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![value; len],
        })
    }

    /// Wrap an existing row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLength`] if `data.len() != width * height`.
    pub fn from_vec(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let len = check_dimensions(width, height)?;
        if data.len() != len {
            return Err(Error::BufferLength {
                expected: len,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Get the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of pixels.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a constructed image; present for API symmetry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw row-major pixel data.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a pixel value at (x, y), `None` when out of bounds.
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.data[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Get a pixel value without bounds checking.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }

    /// Set a pixel value at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] when the coordinate is outside
    /// the image.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: u8) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::InvalidParameter(format!(
                "pixel ({x}, {y}) outside {}x{} image",
                self.width, self.height
            )));
        }
        self.data[(y * self.width + x) as usize] = value;
        Ok(())
    }

    /// Set every pixel of `rect` (clipped to the image) to `value`.
    pub fn fill_box(&mut self, rect: &Box, value: u8) {
        let Some(clipped) = rect.clip(self.width as i32, self.height as i32) else {
            return;
        };
        for y in clipped.y..clipped.bottom() {
            let start = (y as u32 * self.width) as usize;
            self.data[start + clipped.x as usize..start + clipped.right() as usize].fill(value);
        }
    }

    /// Copy out the sub-image covered by `rect`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BoxOutOfBounds`] if `rect` is empty or not fully
    /// inside the image.
    pub fn crop(&self, rect: &Box) -> Result<GrayImage> {
        if rect.is_empty()
            || rect.x < 0
            || rect.y < 0
            || rect.right() > self.width as i32
            || rect.bottom() > self.height as i32
        {
            return Err(Error::BoxOutOfBounds {
                x: rect.x,
                y: rect.y,
                w: rect.w,
                h: rect.h,
                width: self.width,
                height: self.height,
            });
        }

        let mut data = Vec::with_capacity(rect.area() as usize);
        for y in rect.y..rect.bottom() {
            let start = (y as u32 * self.width) as usize;
            data.extend_from_slice(&self.data[start + rect.x as usize..start + rect.right() as usize]);
        }
        GrayImage::from_vec(rect.w as u32, rect.h as u32, data)
    }

    /// Resize with nearest-neighbour sampling.
    pub fn resize_nearest(&self, width: u32, height: u32) -> Result<GrayImage> {
        let len = check_dimensions(width, height)?;
        let mut data = Vec::with_capacity(len);
        for y in 0..height {
            let sy = (u64::from(y) * u64::from(self.height) / u64::from(height)) as u32;
            for x in 0..width {
                let sx = (u64::from(x) * u64::from(self.width) / u64::from(width)) as u32;
                data.push(self.get_pixel_unchecked(sx, sy));
            }
        }
        GrayImage::from_vec(width, height, data)
    }

    /// Photometric inverse (`255 - v`) of the image.
    pub fn invert(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| 255 - v).collect(),
        }
    }

    /// 256-bin intensity histogram.
    pub fn histogram(&self) -> [u32; 256] {
        let mut hist = [0u32; 256];
        for &v in &self.data {
            hist[v as usize] += 1;
        }
        hist
    }
}
