//! Cross-channel candidate tracking
//!
//! Strong candidates are kept unconditionally. A weak candidate from any
//! channel survives only if some strong candidate lies close to it and looks
//! like it: similar size, similar area and similar color.

use crate::descriptor::color_means;
use crate::error::{RecogError, RecogResult};
use erfilter_core::{GrayImage, RgbImage};
use erfilter_region::Region;
use tracing::debug;

/// Options for tracking weak candidates
#[derive(Debug, Clone)]
pub struct TrackOptions {
    /// Center distance (L1) must be below this multiple of the strong
    /// region's larger side (default: 4)
    pub proximity: i32,
    /// Per-channel color difference must be below this (default: 25)
    pub max_color_diff: f64,
    /// Area difference must be below this multiple of the smaller area
    /// (default: 4)
    pub area_factor: u32,
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            proximity: 4,
            max_color_diff: 25.0,
            area_factor: 4,
        }
    }
}

impl TrackOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the proximity multiple
    pub fn with_proximity(mut self, proximity: i32) -> Self {
        self.proximity = proximity;
        self
    }

    /// Set the color difference limit
    pub fn with_max_color_diff(mut self, diff: f64) -> Self {
        self.max_color_diff = diff;
        self
    }

    /// Set the area multiple
    pub fn with_area_factor(mut self, factor: u32) -> Self {
        self.area_factor = factor;
        self
    }

    /// Validate options
    pub fn validate(&self) -> RecogResult<()> {
        if self.proximity <= 0 {
            return Err(RecogError::InvalidParameter(
                "proximity must be positive".to_string(),
            ));
        }
        if self.max_color_diff <= 0.0 {
            return Err(RecogError::InvalidParameter(
                "max_color_diff must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Whether weak candidate `weak` is confirmed by strong candidate `strong`.
///
/// Both regions must have their `center` and `color` filled in.
pub fn is_tracked(strong: &Region, weak: &Region, options: &TrackOptions) -> bool {
    let (s, w) = (&strong.bound, &weak.bound);
    let min_area = i64::from(strong.area.min(weak.area));

    strong.center.manhattan(&weak.center) < s.w.max(s.h) * options.proximity
        && (s.h - w.h).abs() < s.h.max(w.h)
        && (s.w - w.w).abs() < s.w.max(w.w)
        && strong
            .color
            .iter()
            .zip(&weak.color)
            .all(|(a, b)| (a - b).abs() < options.max_color_diff)
        && (i64::from(strong.area) - i64::from(weak.area)).abs()
            < min_area * i64::from(options.area_factor)
}

/// Annotate the candidates of every channel and merge them into one pool.
///
/// `strong[i]` and `weak[i]` were extracted from `channels[i]`. Every
/// candidate gets its `center`, its `channel` index and its mean `color`
/// (measured on its own channel against `color`). The pool holds every
/// strong candidate in channel order, followed by the confirmed weak ones.
///
/// # Errors
///
/// Returns [`RecogError::InvalidParameter`] if there are more candidate
/// lists than channels.
pub fn track(
    mut strong: Vec<Vec<Region>>,
    mut weak: Vec<Vec<Region>>,
    channels: &[GrayImage],
    color: &RgbImage,
    options: &TrackOptions,
) -> RecogResult<Vec<Region>> {
    options.validate()?;
    if strong.len() > channels.len() || weak.len() > channels.len() {
        return Err(RecogError::InvalidParameter(format!(
            "{} strong and {} weak candidate lists for {} channels",
            strong.len(),
            weak.len(),
            channels.len()
        )));
    }

    annotate(&mut strong, channels, color)?;
    annotate(&mut weak, channels, color)?;

    let mut pool: Vec<Region> = strong.iter().flatten().cloned().collect();
    let strong_count = pool.len();

    for region in weak.into_iter().flatten() {
        if pool[..strong_count]
            .iter()
            .any(|s| is_tracked(s, &region, options))
        {
            pool.push(region);
        }
    }

    debug!(
        strong = strong_count,
        tracked = pool.len() - strong_count,
        "weak candidates tracked"
    );
    Ok(pool)
}

fn annotate(lists: &mut [Vec<Region>], channels: &[GrayImage], color: &RgbImage) -> RecogResult<()> {
    for (index, (list, channel)) in lists.iter_mut().zip(channels).enumerate() {
        for region in list {
            region.color = color_means(region, channel, color)?;
            region.center = region.bound.center();
            region.channel = index;
        }
    }
    Ok(())
}
