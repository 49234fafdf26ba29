//! erfilter-core - Basic data structures for extremal-region text detection
//!
//! This crate provides the fundamental data structures used throughout
//! the erfilter workspace:
//!
//! - [`GrayImage`] - Single-channel 8-bit image buffer
//! - [`RgbImage`] - Interleaved 3-channel 8-bit image buffer
//! - [`Box`] - Axis-aligned rectangle
//! - [`Point`] - Integer pixel coordinate
//! - [`stats`] - Small numeric helpers (mean, deviation, Otsu threshold)

pub mod box_;
pub mod error;
pub mod image;
pub mod point;
pub mod stats;

pub use box_::Box;
pub use error::{Error, Result};
pub use image::{GrayImage, RgbImage};
pub use point::Point;
