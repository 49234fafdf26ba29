//! erfilter - Scene text detection for Rust
//!
//! Finds text in natural images by filtering extremal regions: connected
//! components of a grey-level image thresholded at every level.
//!
//! # Overview
//!
//! - Component-tree extraction of every extremal region of a channel
//! - Non-maximum suppression keeping one stable region per character
//! - Candidate classification and cross-channel tracking
//! - Grouping of candidates into horizontal text lines
//! - Sequence solving of a line into its most plausible word
//!
//! # Example
//!
//! ```
//! use erfilter::GrayImage;
//! use erfilter::region::{ErTreeOptions, extract_tree};
//!
//! let image = GrayImage::filled(32, 32, 128).unwrap();
//! let tree = extract_tree(&image, &ErTreeOptions::unfiltered()).unwrap();
//! let root = tree.root().unwrap();
//! assert_eq!(tree[root].area, 32 * 32);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use erfilter_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use erfilter_recog as recog;
pub use erfilter_region as region;
