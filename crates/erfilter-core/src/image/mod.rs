//! Image buffers
//!
//! [`GrayImage`] is the single-channel 8-bit buffer the component-tree
//! builder consumes. [`RgbImage`] is the co-registered 3-channel buffer used
//! for per-region color statistics. Both are row-major with no padding.
//!
//! Unlike a general image container there is no depth or colormap: the
//! channel layout is fixed by the type, so a wrongly-typed input cannot be
//! passed to the detection stages at all.

mod gray;
mod rgb;

pub use gray::GrayImage;
pub use rgb::RgbImage;

use crate::error::{Error, Result};

fn check_dimensions(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimension { width, height });
    }
    Ok(width as usize * height as usize)
}
