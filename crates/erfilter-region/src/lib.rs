//! erfilter-region - Extremal region extraction
//!
//! This crate provides the first two stages of the text detector:
//!
//! - **Component tree** - Single-pass flood fill building every extremal
//!   region of a grayscale image, with small regions folded into their
//!   parents as the tree is built
//! - **Region selection** - Non-maximum suppression picking the most stable
//!   region along each chain of overlapping ancestors
//!
//! # Examples
//!
//! ```
//! use erfilter_core::{Box, GrayImage};
//! use erfilter_region::{ErTreeOptions, SelectOptions, extract_tree, non_maximum_suppression};
//!
//! // A dark 20x40 bar on a bright background
//! let mut image = GrayImage::filled(200, 200, 220).unwrap();
//! image.fill_box(&Box::new_unchecked(50, 50, 20, 40), 10);
//!
//! let mut tree = extract_tree(&image, &ErTreeOptions::default()).unwrap();
//! let ids = non_maximum_suppression(&mut tree, &SelectOptions::default(), 200, 200).unwrap();
//! let pool = tree.collect(&ids, 0);
//! assert!(pool.len() <= ids.len());
//! ```

pub mod error;
pub mod region;
pub mod select;
pub mod tree;

// Re-export core types
pub use erfilter_core;

// Re-export error types
pub use error::{RegionError, RegionResult};

// Re-export region types
pub use region::{Children, ComponentTree, Region, RegionId, SENTINEL_LEVEL};

// Re-export tree extraction
pub use tree::{ErTreeOptions, extract_tree};

// Re-export selection
pub use select::{SelectOptions, non_maximum_suppression, traversal_order};
