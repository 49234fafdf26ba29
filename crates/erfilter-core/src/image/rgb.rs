//! Interleaved 3-channel 8-bit image

use super::check_dimensions;
use super::gray::GrayImage;
use crate::error::{Error, Result};

/// Row-major interleaved 3-channel image (`c0 c1 c2` per pixel)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbImage {
    /// Create a new image with all channels set to zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0; len * 3],
        })
    }

    /// Wrap an existing interleaved buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLength`] if `data.len() != 3 * width * height`.
    pub fn from_vec(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let len = check_dimensions(width, height)? * 3;
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

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the three channel values at (x, y).
    #[inline]
    pub fn get_rgb(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x < self.width && y < self.height {
            let i = ((y * self.width + x) * 3) as usize;
            Some([self.data[i], self.data[i + 1], self.data[i + 2]])
        } else {
            None
        }
    }

    /// Set the three channel values at (x, y).
    pub fn set_rgb(&mut self, x: u32, y: u32, value: [u8; 3]) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::InvalidParameter(format!(
                "pixel ({x}, {y}) outside {}x{} image",
                self.width, self.height
            )));
        }
        let i = ((y * self.width + x) * 3) as usize;
        self.data[i..i + 3].copy_from_slice(&value);
        Ok(())
    }

    /// Extract channel `index` (0, 1 or 2) as a grayscale image.
    pub fn channel(&self, index: usize) -> Result<GrayImage> {
        if index > 2 {
            return Err(Error::InvalidParameter(format!(
                "channel index must be 0..=2, got {index}"
            )));
        }
        let data = self.data.iter().skip(index).step_by(3).copied().collect();
        GrayImage::from_vec(self.width, self.height, data)
    }

    /// Check that `gray` has the same dimensions as this image.
    pub fn check_registered(&self, gray: &GrayImage) -> Result<()> {
        if gray.width() != self.width || gray.height() != self.height {
            return Err(Error::DimensionMismatch {
                expected: (self.width, self.height),
                actual: (gray.width(), gray.height()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_split() {
        let img = RgbImage::from_vec(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(img.channel(0).unwrap().data(), &[1, 4]);
        assert_eq!(img.channel(2).unwrap().data(), &[3, 6]);
        assert!(img.channel(3).is_err());
    }

    #[test]
    fn test_set_get() {
        let mut img = RgbImage::new(2, 2).unwrap();
        img.set_rgb(1, 1, [9, 8, 7]).unwrap();
        assert_eq!(img.get_rgb(1, 1), Some([9, 8, 7]));
        assert!(img.set_rgb(2, 0, [0, 0, 0]).is_err());
    }
}
