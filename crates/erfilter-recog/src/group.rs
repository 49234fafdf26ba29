//! Spatial grouping of character candidates into text lines
//!
//! Two groupers work on a flat pool of annotated regions (center, color and
//! score filled in):
//!
//! - [`SpatialGrouper`]: links every region to its nearest left and right
//!   neighbour, clusters the neighbour triples into sibling sets, and keeps
//!   the sets that are regular and horizontal enough to be a line of text.
//! - [`TripletGrouper`]: seeds lines from three mutually neighbouring
//!   regions and extends them greedily to the right. Used ahead of
//!   recognition.
//!
//! Both return [`TextLine`]s whose members are indices into the pool as it
//! stands after grouping (the pool is suppressed and sorted in place).

use crate::error::{RecogError, RecogResult};
use crate::fitline::{avg_slope, lms_slope};
use erfilter_core::box_::union_all;
use erfilter_core::stats::standard_dev;
use erfilter_core::{Box, Point};
use erfilter_region::Region;
use std::collections::BTreeSet;
use tracing::debug;

/// Minimum intersection, as a fraction of the smaller box, for two regions
/// to be detections of the same character
const OVERLAP_AREA: f64 = 0.7;
/// Maximum center distance, as a fraction of the taller box, for two
/// regions to be detections of the same character
const OVERLAP_DISTANCE: f64 = 0.5;
/// Center distance, as a fraction of the first region's larger side, below
/// which two regions are compared for suppression
const SUPPRESS_DISTANCE: f64 = 0.2;
/// Minimum overlap with the larger box for two regions to be duplicates
const SIMILAR_OVERLAP: f64 = 0.8;
/// Minimum area ratio for a contained region to be dropped
const INNER_AREA_RATIO: f64 = 2.0;

/// Thresholds of the neighbour test between two regions
#[derive(Debug, Clone)]
pub struct NeighborThresholds {
    /// Height ratio must lie in `(1 / r, r)` (default: 1.8)
    pub height_ratio: f64,
    /// Horizontal center distance below this multiple of the wider width
    /// (default: 3.0)
    pub x_distance: f64,
    /// Vertical center distance below this multiple of the smaller height
    /// (default: 0.5)
    pub y_distance: f64,
    /// Pixel area ratio must lie in `(1 / r, r)` (default: 3.0)
    pub area_ratio: f64,
    /// Per-channel mean color difference below this (default: 25)
    pub color_diff: f64,
}

impl Default for NeighborThresholds {
    fn default() -> Self {
        Self {
            height_ratio: 1.8,
            x_distance: 3.0,
            y_distance: 0.5,
            area_ratio: 3.0,
            color_diff: 25.0,
        }
    }
}

impl NeighborThresholds {
    /// Validate thresholds
    pub fn validate(&self) -> RecogResult<()> {
        if self.height_ratio <= 1.0 || self.area_ratio <= 1.0 {
            return Err(RecogError::InvalidParameter(format!(
                "height_ratio and area_ratio must exceed 1, got {} and {}",
                self.height_ratio, self.area_ratio
            )));
        }
        if self.x_distance <= 0.0 || self.y_distance <= 0.0 || self.color_diff <= 0.0 {
            return Err(RecogError::InvalidParameter(
                "distance and color thresholds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Whether `a` and `b` look like adjacent characters of one line
pub fn is_neighboring(a: &Region, b: &Region, t: &NeighborThresholds) -> bool {
    let min_h = a.bound.h.min(b.bound.h);
    let min_area = a.area.min(b.area);
    if min_h <= 0 || min_area == 0 {
        return false;
    }

    let height_ratio = f64::from(a.bound.h.max(b.bound.h)) / f64::from(min_h);
    let area_ratio = f64::from(a.area.max(b.area)) / f64::from(min_area);
    let x_d = f64::from((a.center.x - b.center.x).abs());
    let y_d = f64::from((a.center.y - b.center.y).abs());

    1.0 / t.height_ratio < height_ratio
        && height_ratio < t.height_ratio
        && x_d < t.x_distance * f64::from(a.bound.w.max(b.bound.w))
        && y_d < t.y_distance * f64::from(min_h)
        && 1.0 / t.area_ratio < area_ratio
        && area_ratio < t.area_ratio
        && a
            .color
            .iter()
            .zip(&b.color)
            .all(|(ca, cb)| (ca - cb).abs() < t.color_diff)
}

/// Whether `a` and `b` are two detections of the same character
pub fn is_overlapping(a: &Region, b: &Region) -> bool {
    let min_area = a.bound.area().min(b.bound.area()) as f64;
    let max_h = f64::from(a.bound.h.max(b.bound.h));

    a.bound.intersection_area(&b.bound) as f64 > OVERLAP_AREA * min_area
        && a.center.distance(&b.center) < OVERLAP_DISTANCE * max_h
}

/// Whether `b`'s center lies close to `a`'s, relative to `a`'s size
fn centers_close(a: &Region, b: &Region) -> bool {
    a.center.distance(&b.center) < SUPPRESS_DISTANCE * f64::from(a.bound.w.max(a.bound.h))
}

fn remove_marked(pool: &mut Vec<Region>, marked: &[bool]) {
    let mut flags = marked.iter();
    pool.retain(|_| !flags.next().copied().unwrap_or(false));
}

/// Remove near-duplicate regions, keeping the higher score.
///
/// For every pair `i < j` with close centers whose boxes overlap by more
/// than 0.8 of the larger box, the lower-scored region is removed (on equal
/// scores, the earlier one). Returns the number of removed regions.
pub fn similar_suppression(pool: &mut Vec<Region>) -> usize {
    let mut marked = vec![false; pool.len()];
    for i in 0..pool.len() {
        for j in i + 1..pool.len() {
            let (a, b) = (&pool[i], &pool[j]);
            if !centers_close(a, b) {
                continue;
            }
            let larger = a.bound.area().max(b.bound.area()) as f64;
            if a.bound.intersection_area(&b.bound) as f64 > SIMILAR_OVERLAP * larger {
                if a.score > b.score {
                    marked[j] = true;
                } else {
                    marked[i] = true;
                }
            }
        }
    }

    let before = pool.len();
    remove_marked(pool, &marked);
    before - pool.len()
}

/// Remove regions nested inside a much larger region with a close center.
///
/// Returns the number of removed regions.
pub fn inner_suppression(pool: &mut Vec<Region>) -> usize {
    let mut marked = vec![false; pool.len()];
    for (i, outer) in pool.iter().enumerate() {
        for (j, inner) in pool.iter().enumerate() {
            if i == j || !centers_close(outer, inner) {
                continue;
            }
            let ratio = outer.bound.area() as f64 / inner.bound.area() as f64;
            if outer.bound.contains_box(&inner.bound) && ratio > INNER_AREA_RATIO {
                marked[j] = true;
            }
        }
    }

    let before = pool.len();
    remove_marked(pool, &marked);
    before - pool.len()
}

/// A candidate line of text
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextLine {
    /// Pool indices of the members, left to right
    pub members: Vec<usize>,
    /// Union of the member bounds
    pub bound: Box,
    /// Baseline slope (dy / dx) from a least median of squares fit
    pub slope: f64,
    /// Baseline angle in degrees
    pub angle: f64,
    /// Recognized text, empty until the line is resolved
    pub word: String,
}

impl TextLine {
    /// Line over `members`, with bound and baseline computed from `pool`
    pub fn from_members(members: Vec<usize>, pool: &[Region]) -> Self {
        let mut line = Self {
            members,
            ..Self::default()
        };
        line.refit(pool);
        line
    }

    /// Recompute the bound and the baseline from the current members
    pub fn refit(&mut self, pool: &[Region]) {
        self.bound = union_all(self.members.iter().map(|&m| &pool[m].bound)).unwrap_or_default();
        self.slope = lms_slope(&self.bottom_corners(pool)).unwrap_or(0.0);
        self.angle = self.slope.atan().to_degrees();
    }

    /// Bottom-left corners of the members
    pub fn bottom_corners(&self, pool: &[Region]) -> Vec<Point> {
        self.members
            .iter()
            .map(|&m| pool[m].bound.bottom_left())
            .collect()
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the line has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Options for [`SpatialGrouper`]
#[derive(Debug, Clone)]
pub struct GroupingOptions {
    /// Neighbour test thresholds
    pub neighbor: NeighborThresholds,
    /// A set is rejected when the normalized deviations of both its member
    /// areas and its member spacing exceed this (default: 0.8)
    pub irregularity: f64,
    /// Maximum magnitude of the top and bottom line slopes (default: 0.2)
    pub max_slope: f64,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            neighbor: NeighborThresholds::default(),
            irregularity: 0.8,
            max_slope: 0.2,
        }
    }
}

impl GroupingOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the neighbour thresholds
    pub fn with_neighbor(mut self, neighbor: NeighborThresholds) -> Self {
        self.neighbor = neighbor;
        self
    }

    /// Set the irregularity threshold
    pub fn with_irregularity(mut self, irregularity: f64) -> Self {
        self.irregularity = irregularity;
        self
    }

    /// Set the maximum slope
    pub fn with_max_slope(mut self, slope: f64) -> Self {
        self.max_slope = slope;
        self
    }

    /// Validate options
    pub fn validate(&self) -> RecogResult<()> {
        self.neighbor.validate()?;
        if self.irregularity <= 0.0 {
            return Err(RecogError::InvalidParameter(format!(
                "irregularity must be positive, got {}",
                self.irregularity
            )));
        }
        if self.max_slope < 0.0 {
            return Err(RecogError::InvalidParameter(format!(
                "max_slope must be non-negative, got {}",
                self.max_slope
            )));
        }
        Ok(())
    }
}

/// Link each region to its nearest left and right neighbour.
///
/// `pool` must be sorted by center x. Scanning outward from each region, the
/// first neighbouring region on each side is recorded; links are written on
/// both ends, so a later region may overwrite an earlier one's link.
pub fn link_neighbors(pool: &mut [Region], thresholds: &NeighborThresholds) {
    for region in pool.iter_mut() {
        region.sibling_left = None;
        region.sibling_right = None;
    }

    for i in 0..pool.len() {
        if let Some(j) = (0..i)
            .rev()
            .find(|&j| is_neighboring(&pool[i], &pool[j], thresholds))
        {
            pool[i].sibling_left = Some(j);
            pool[j].sibling_right = Some(i);
        }

        if let Some(j) = (i + 1..pool.len()).find(|&j| is_neighboring(&pool[i], &pool[j], thresholds))
        {
            pool[i].sibling_right = Some(j);
            pool[j].sibling_left = Some(i);
        }
    }
}

/// Seed one sibling set per region linked on both sides
pub fn sibling_sets(pool: &[Region]) -> Vec<BTreeSet<usize>> {
    pool.iter()
        .enumerate()
        .map(|(i, r)| match (r.sibling_left, r.sibling_right) {
            (Some(l), Some(r)) => BTreeSet::from([i, l, r]),
            _ => BTreeSet::new(),
        })
        .collect()
}

/// Merge sibling sets sharing at least two members until a full pass clears
/// no further set. Returns the number of passes.
pub fn merge_sibling_sets(sets: &mut [BTreeSet<usize>]) -> usize {
    let count_empty = |sets: &[BTreeSet<usize>]| sets.iter().filter(|s| s.is_empty()).count();
    let mut passes = 0;

    loop {
        passes += 1;
        let before = count_empty(sets);

        for i in 0..sets.len() {
            for j in i + 1..sets.len() {
                if sets[i].intersection(&sets[j]).nth(1).is_none() {
                    continue;
                }
                let absorbed = std::mem::take(&mut sets[j]);
                sets[i].extend(absorbed);
            }
        }

        if count_empty(sets) == before {
            return passes;
        }
    }
}

/// Grouper linking nearest neighbours into sibling sets
#[derive(Debug, Clone, Default)]
pub struct SpatialGrouper {
    options: GroupingOptions,
}

impl SpatialGrouper {
    /// Create a grouper with the given options
    pub fn new(options: GroupingOptions) -> Self {
        Self { options }
    }

    /// Grouping options
    pub fn options(&self) -> &GroupingOptions {
        &self.options
    }

    /// Group `pool` into text lines.
    ///
    /// The pool is suppressed, sorted by center x and its sibling links are
    /// rewritten; line members index the resulting pool.
    pub fn group(&self, pool: &mut Vec<Region>) -> RecogResult<Vec<TextLine>> {
        self.options.validate()?;

        let similar = similar_suppression(pool);
        let inner = inner_suppression(pool);
        pool.sort_by_key(|r| r.center.x);

        link_neighbors(pool, &self.options.neighbor);
        let pool: &[Region] = pool;
        let mut sets = sibling_sets(pool);
        let passes = merge_sibling_sets(&mut sets);

        let lines: Vec<TextLine> = sets
            .into_iter()
            .filter(|set| !set.is_empty())
            .filter_map(|set| self.accept(set, pool))
            .collect();

        debug!(
            similar,
            inner,
            regions = pool.len(),
            passes,
            lines = lines.len(),
            "spatial grouping done"
        );
        Ok(lines)
    }

    /// Statistical and line-fit filtering of one sibling set
    fn accept(&self, set: BTreeSet<usize>, pool: &[Region]) -> Option<TextLine> {
        let mut members: Vec<usize> = set.into_iter().collect();
        members.sort_by_key(|&m| pool[m].bound.x);

        let areas: Vec<f64> = members.iter().map(|&m| f64::from(pool[m].area)).collect();
        let gaps: Vec<f64> = members
            .windows(2)
            .map(|w| f64::from(pool[w[1]].bound.x - pool[w[0]].bound.x))
            .collect();
        if standard_dev(&areas, true) > self.options.irregularity
            && standard_dev(&gaps, true) > self.options.irregularity
        {
            return None;
        }

        let top: Vec<Point> = members.iter().map(|&m| pool[m].bound.top_left()).collect();
        let bottom: Vec<Point> = members.iter().map(|&m| pool[m].bound.bottom_left()).collect();
        let slope_top = avg_slope(&top)?;
        let slope_bottom = avg_slope(&bottom)?;
        // Opposite vertical pairs sum to NaN, which must not pass
        let level = |slope: f64| slope.abs() <= self.options.max_slope;
        if !level(slope_top) || !level(slope_bottom) {
            return None;
        }

        Some(TextLine::from_members(members, pool))
    }
}

/// Options for [`TripletGrouper`]
#[derive(Debug, Clone)]
pub struct TripletOptions {
    /// Neighbour test thresholds
    pub neighbor: NeighborThresholds,
    /// Pools smaller than this produce no line (default: 10)
    pub min_regions: usize,
    /// Triplet members are searched within this fraction of the pool size
    /// to the right of the seed (default: 0.3)
    pub search_fraction: f64,
}

impl Default for TripletOptions {
    fn default() -> Self {
        Self {
            neighbor: NeighborThresholds::default(),
            min_regions: 10,
            search_fraction: 0.3,
        }
    }
}

impl TripletOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the neighbour thresholds
    pub fn with_neighbor(mut self, neighbor: NeighborThresholds) -> Self {
        self.neighbor = neighbor;
        self
    }

    /// Set the minimum pool size
    pub fn with_min_regions(mut self, min_regions: usize) -> Self {
        self.min_regions = min_regions;
        self
    }

    /// Set the search window fraction
    pub fn with_search_fraction(mut self, fraction: f64) -> Self {
        self.search_fraction = fraction;
        self
    }

    /// Validate options
    pub fn validate(&self) -> RecogResult<()> {
        self.neighbor.validate()?;
        if !(0.0..=1.0).contains(&self.search_fraction) {
            return Err(RecogError::InvalidParameter(format!(
                "search_fraction must be in [0, 1], got {}",
                self.search_fraction
            )));
        }
        Ok(())
    }
}

/// Grouper seeding lines from neighbouring triplets
#[derive(Debug, Clone, Default)]
pub struct TripletGrouper {
    options: TripletOptions,
}

impl TripletGrouper {
    /// Create a grouper with the given options
    pub fn new(options: TripletOptions) -> Self {
        Self { options }
    }

    /// Grouping options
    pub fn options(&self) -> &TripletOptions {
        &self.options
    }

    /// Group `pool` into text lines.
    ///
    /// The pool is inner-suppressed and sorted by center x; line members
    /// index the resulting pool. Each region joins at most one line.
    pub fn group(&self, pool: &mut Vec<Region>) -> RecogResult<Vec<TextLine>> {
        self.options.validate()?;

        inner_suppression(pool);
        pool.sort_by_key(|r| r.center.x);
        let pool: &[Region] = pool;
        if pool.len() < self.options.min_regions {
            debug!(regions = pool.len(), "too few regions for triplet grouping");
            return Ok(Vec::new());
        }

        let n = pool.len();
        let search = (n as f64 * self.options.search_fraction) as usize;
        let neighbor = |a: usize, b: usize| is_neighboring(&pool[a], &pool[b], &self.options.neighbor);
        let mut used = vec![false; n];
        let mut lines = Vec::new();

        for i in 0..n {
            for j1 in 1..search {
                for j2 in j1 + 1..search {
                    let (a, b) = (i + j1, i + j2);
                    if b >= n || used[i] || used[a] || used[b] {
                        continue;
                    }
                    if !neighbor(i, a) || !neighbor(a, b) {
                        continue;
                    }

                    let mut members = vec![i, a, b];
                    for k in b + 1..n {
                        let last = members[members.len() - 1];
                        if !used[k] && neighbor(last, k) {
                            members.push(k);
                        }
                    }
                    for &m in &members {
                        used[m] = true;
                    }
                    lines.push(TextLine::from_members(members, pool));
                }
            }
        }

        debug!(regions = n, lines = lines.len(), "triplet grouping done");
        Ok(lines)
    }
}
