//! erfilter-recog - Text-line grouping and sequence recognition
//!
//! This crate turns a pool of selected extremal regions into text:
//!
//! - **Descriptors**: LBP histograms for scoring, mean color per region
//! - **Classification and tracking**: strong/weak split by an external
//!   scorer, weak candidates confirmed by nearby strong ones
//! - **Grouping**: nearest-neighbour sibling sets ([`SpatialGrouper`]) or
//!   seeded triplets ([`TripletGrouper`]) form [`TextLine`]s
//! - **Sequence solving**: a transition-weighted graph over each line's
//!   recognized members picks the most plausible word
//!
//! # Quick Start
//!
//! ```
//! use erfilter_recog::{GraphNode, SequenceOptions, SequenceSolver, TransitionTable};
//!
//! let table = TransitionTable::from_rows(&[vec![0.0, 0.9], vec![0.1, 0.0]]).unwrap();
//! let solver = SequenceSolver::new(&table, SequenceOptions::default());
//!
//! let mut a = GraphNode::new(0, Some('a'), 0.8);
//! a.edges.push((1, 0.9));
//! let b = GraphNode::new(1, Some('b'), 0.6);
//!
//! let path = solver.solve(&[a, b]).unwrap();
//! assert_eq!(path.nodes, vec![0, 1]);
//! ```
//!
//! # Modules
//!
//! - [`descriptor`]: LBP histogram and color means
//! - [`classify`]: candidate scoring
//! - [`track`]: cross-channel tracking
//! - [`fitline`]: slope estimators
//! - [`group`]: spatial and triplet grouping
//! - [`table`]: transition table
//! - [`ocr`]: recognizer interface
//! - [`graph`]: sequence graph solver
//! - [`pipeline`]: stage driver

pub mod classify;
pub mod descriptor;
mod error;
pub mod fitline;
pub mod graph;
pub mod group;
pub mod ocr;
pub mod pipeline;
pub mod table;
pub mod track;

pub use error::{RecogError, RecogResult};

// Re-export commonly used types
pub use classify::{Classification, ClassifyOptions, RegionScorer, classify};
pub use descriptor::{color_means, lbp_histogram};
pub use graph::{GraphNode, SequenceOptions, SequencePath, SequenceSolver};
pub use group::{
    GroupingOptions, NeighborThresholds, SpatialGrouper, TextLine, TripletGrouper,
    TripletOptions, inner_suppression, is_neighboring, is_overlapping, similar_suppression,
};
pub use ocr::{Alphabet, Recognition, Recognizer};
pub use pipeline::ErFilter;
pub use table::TransitionTable;
pub use track::{TrackOptions, is_tracked, track};

// Re-export dependencies for convenience
pub use erfilter_core;
pub use erfilter_region;
