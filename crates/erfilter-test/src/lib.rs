//! erfilter-test - Regression test framework for erfilter
//!
//! Provides [`RegParams`], a numbered-check recorder for regression tests,
//! and [`synth`], builders for the synthetic images the tests run on.
//!
//! # Usage
//!
//! ```
//! use erfilter_test::RegParams;
//!
//! let mut rp = RegParams::new("component_tree");
//! rp.compare_values(4.0, 4.0, 0.0);
//! assert!(rp.cleanup());
//! ```

mod error;
mod params;
pub mod synth;

pub use error::{TestError, TestResult};
pub use params::RegParams;

/// Path of a scratch file for test `name`, inside the system temp directory
pub fn scratch_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("erfilter-{}-{}", std::process::id(), name))
}
