//! Character-candidate classification
//!
//! Each selected region is described by its LBP histogram and scored by an
//! external [`RegionScorer`]. Two thresholds split the pool into strong
//! candidates, weak candidates (kept only if tracking confirms them) and
//! rejects.

use crate::descriptor::{DEFAULT_CELLS, DEFAULT_SIZE, lbp_histogram};
use crate::error::{RecogError, RecogResult};
use erfilter_core::GrayImage;
use erfilter_region::Region;
use tracing::debug;

/// Scores a region descriptor; higher means more character-like
pub trait RegionScorer {
    fn score(&self, descriptor: &[f64]) -> f64;
}

impl<F> RegionScorer for F
where
    F: Fn(&[f64]) -> f64,
{
    fn score(&self, descriptor: &[f64]) -> f64 {
        self(descriptor)
    }
}

/// Options for classification
#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    /// Scores above this are strong candidates (default: 0.5)
    pub strong_threshold: f64,
    /// Scores above this (and not strong) are weak candidates (default: 0.0)
    pub weak_threshold: f64,
    /// LBP grid cells per axis (default: 2)
    pub cells: usize,
    /// Normalized crop side (default: 24)
    pub size: u32,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            strong_threshold: 0.5,
            weak_threshold: 0.0,
            cells: DEFAULT_CELLS,
            size: DEFAULT_SIZE,
        }
    }
}

impl ClassifyOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strong and weak thresholds
    pub fn with_thresholds(mut self, strong: f64, weak: f64) -> Self {
        self.strong_threshold = strong;
        self.weak_threshold = weak;
        self
    }

    /// Set the LBP grid
    pub fn with_grid(mut self, cells: usize, size: u32) -> Self {
        self.cells = cells;
        self.size = size;
        self
    }

    /// Validate options
    pub fn validate(&self) -> RecogResult<()> {
        if self.weak_threshold > self.strong_threshold {
            return Err(RecogError::InvalidParameter(format!(
                "weak threshold {} above strong threshold {}",
                self.weak_threshold, self.strong_threshold
            )));
        }
        Ok(())
    }
}

/// Strong and weak candidates of one channel
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub strong: Vec<Region>,
    pub weak: Vec<Region>,
}

/// Score every region of `pool` on `channel` and split the pool.
///
/// Each region's `score` is set. Regions scoring at or below the weak
/// threshold are dropped.
pub fn classify(
    pool: Vec<Region>,
    channel: &GrayImage,
    scorer: &impl RegionScorer,
    options: &ClassifyOptions,
) -> RecogResult<Classification> {
    options.validate()?;

    let total = pool.len();
    let mut result = Classification::default();
    for mut region in pool {
        let crop = channel.crop(&region.bound)?;
        let descriptor = lbp_histogram(&crop, options.cells, options.size)?;
        region.score = scorer.score(&descriptor);

        if region.score > options.strong_threshold {
            result.strong.push(region);
        } else if region.score > options.weak_threshold {
            result.weak.push(region);
        }
    }

    debug!(
        total,
        strong = result.strong.len(),
        weak = result.weak.len(),
        "regions classified"
    );
    Ok(result)
}
