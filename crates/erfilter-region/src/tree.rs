//! Component-tree extraction
//!
//! Builds the full hierarchy of extremal regions of a grayscale image in a
//! single flood-fill pass, following Nistér & Stewénius, "Linear time
//! maximally stable extremal regions" (ECCV 2008).
//!
//! # Algorithm Overview
//!
//! The flood keeps three pieces of state:
//!
//! 1. An accessibility mask marking every pixel already reached.
//! 2. One stack of boundary pixels per grey level (each entry remembers the
//!    next edge to explore) and a `priority` pointer at the lowest non-empty
//!    level.
//! 3. A component stack running from the sentinel (level 256) up to the
//!    region at the current level.
//!
//! Starting from the top-left pixel the flood explores the 4-neighbours
//! (right, bottom, left, top). A neighbour at a lower level interrupts the
//! current pixel, which is re-queued, and the walk descends into a new
//! region. Once every edge of a pixel is explored the pixel is accumulated
//! into the region on top of the component stack. The next pixel always
//! comes from the lowest boundary level; reaching a different level collapses
//! the component stack first (see [`ErTreeOptions`] for the merge policy).

use crate::error::{RegionError, RegionResult};
use crate::region::{ComponentTree, Region, RegionId, SENTINEL_LEVEL};
use erfilter_core::GrayImage;
use tracing::debug;

/// Options for component-tree extraction
#[derive(Debug, Clone)]
pub struct ErTreeOptions {
    /// Grey levels per quantization step (default: 8)
    pub thresh_step: u32,
    /// Regions with at most this many pixels are not kept as tree nodes
    /// (default: 120)
    pub min_area: u32,
    /// Regions at most this tall are not kept as tree nodes (default: 10)
    pub min_height: i32,
    /// Regions at most this wide are not kept as tree nodes (default: 5)
    pub min_width: i32,
}

impl Default for ErTreeOptions {
    fn default() -> Self {
        Self {
            thresh_step: 8,
            min_area: 120,
            min_height: 10,
            min_width: 5,
        }
    }
}

impl ErTreeOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Options keeping every region as a tree node, with no quantization
    pub fn unfiltered() -> Self {
        Self {
            thresh_step: 1,
            min_area: 0,
            min_height: 0,
            min_width: 0,
        }
    }

    /// Set the quantization step
    pub fn with_thresh_step(mut self, step: u32) -> Self {
        self.thresh_step = step;
        self
    }

    /// Set the minimum area kept as a tree node
    pub fn with_min_area(mut self, area: u32) -> Self {
        self.min_area = area;
        self
    }

    /// Set the minimum height kept as a tree node
    pub fn with_min_height(mut self, height: i32) -> Self {
        self.min_height = height;
        self
    }

    /// Set the minimum width kept as a tree node
    pub fn with_min_width(mut self, width: i32) -> Self {
        self.min_width = width;
        self
    }

    /// Number of quantized levels, `255 / step + 1`
    pub fn highest_level(&self) -> u32 {
        255 / self.thresh_step + 1
    }

    /// Validate options
    pub fn validate(&self) -> RegionResult<()> {
        if self.thresh_step == 0 || self.thresh_step > 255 {
            return Err(RegionError::InvalidParameters(format!(
                "thresh_step must be in 1..=255, got {}",
                self.thresh_step
            )));
        }
        Ok(())
    }

    /// Whether a region popped off the component stack is too small to be
    /// kept as its own tree node
    fn is_discarded(&self, region: &Region) -> bool {
        region.area <= self.min_area
            || region.bound.h <= self.min_height
            || region.bound.w <= self.min_width
    }
}

/// Extract the component tree of a grayscale image.
///
/// Returns the arena with its sentinel root set. The root has level
/// [`SENTINEL_LEVEL`] and covers the whole image; every other region's level
/// is at most its parent's.
///
/// # Errors
///
/// Returns [`RegionError::InvalidParameters`] for an invalid quantization
/// step.
pub fn extract_tree(image: &GrayImage, options: &ErTreeOptions) -> RegionResult<ComponentTree> {
    options.validate()?;

    let width = image.width() as usize;
    let height = image.height() as usize;
    if image.is_empty() {
        return Err(RegionError::EmptyImage);
    }

    let step = options.thresh_step;
    let highest_level = options.highest_level();
    let levels: Vec<u32> = image.data().iter().map(|&v| u32::from(v) / step).collect();

    let mut tree = ComponentTree::new(image.width(), image.height());
    let mut accessible = vec![false; width * height];
    let mut boundary: Vec<Vec<(usize, u8)>> = vec![Vec::new(); highest_level as usize];
    let mut stack: Vec<RegionId> = Vec::new();
    let mut priority = highest_level;

    // Dummy component with a level above any allowed in the image
    let sentinel = tree.alloc(Region::new(SENTINEL_LEVEL, 0, 0, 0));
    stack.push(sentinel);

    let mut current_pixel = 0usize;
    let mut current_edge = 0u8;
    let mut current_level = levels[current_pixel];
    accessible[current_pixel] = true;

    'descend: loop {
        let mut x = current_pixel % width;
        let mut y = current_pixel / width;
        stack.push(tree.alloc(Region::new(
            current_level,
            current_pixel as u32,
            x as i32,
            y as i32,
        )));

        loop {
            while current_edge < 4 {
                let neighbor = match current_edge {
                    0 => (x + 1 < width).then(|| current_pixel + 1),
                    1 => (y + 1 < height).then(|| current_pixel + width),
                    2 => (x > 0).then(|| current_pixel - 1),
                    _ => (y > 0).then(|| current_pixel - width),
                };
                current_edge += 1;

                let Some(neighbor) = neighbor else {
                    continue;
                };
                if accessible[neighbor] {
                    continue;
                }
                accessible[neighbor] = true;

                let neighbor_level = levels[neighbor];
                if neighbor_level >= current_level {
                    boundary[neighbor_level as usize].push((neighbor, 0));
                    priority = priority.min(neighbor_level);
                } else {
                    // Re-queue the current pixel with the next edge and
                    // descend into the darker neighbour.
                    boundary[current_level as usize].push((current_pixel, current_edge));
                    priority = priority.min(current_level);

                    current_pixel = neighbor;
                    current_level = neighbor_level;
                    current_edge = 0;
                    continue 'descend;
                }
            }

            let top = top_of(&stack)?;
            tree[top].accumulate(x as i32, y as i32);

            if priority == highest_level {
                process_stack(&mut tree, &mut stack, SENTINEL_LEVEL, options)?;
                tree.set_root(sentinel);
                debug!(
                    width,
                    height,
                    regions = tree.len(),
                    "component tree extracted"
                );
                return Ok(tree);
            }

            let Some((new_pixel, new_edge)) = boundary[priority as usize].pop() else {
                return Err(RegionError::SegmentationError(format!(
                    "boundary level {priority} is empty"
                )));
            };
            while priority < highest_level && boundary[priority as usize].is_empty() {
                priority += 1;
            }

            current_pixel = new_pixel;
            current_edge = new_edge;
            x = current_pixel % width;
            y = current_pixel / width;

            let new_level = levels[new_pixel];
            if new_level != current_level {
                // The returned pixel is at a higher level: close every
                // component below it first.
                current_level = new_level;
                process_stack(&mut tree, &mut stack, new_level, options)?;
            }
        }
    }
}

fn top_of(stack: &[RegionId]) -> RegionResult<RegionId> {
    stack
        .last()
        .copied()
        .ok_or_else(|| RegionError::SegmentationError("component stack is empty".to_string()))
}

/// Collapse the component stack up to `new_level`.
///
/// Pops and merges while `new_level` is above the second component's level.
/// If `new_level` falls strictly between the two topmost components, no
/// region exists yet at that level: the top is relabelled instead.
fn process_stack(
    tree: &mut ComponentTree,
    stack: &mut Vec<RegionId>,
    new_level: u32,
    options: &ErTreeOptions,
) -> RegionResult<()> {
    loop {
        let top = top_of(stack)?;
        stack.pop();
        let second = top_of(stack)?;

        if new_level < tree[second].level {
            tree[top].level = new_level;
            stack.push(top);
            return Ok(());
        }

        merge(tree, second, top, options);

        if new_level <= tree[second].level {
            return Ok(());
        }
    }
}

/// Merge `child` into `parent`.
///
/// The parent always absorbs the child's pixels. A child too small to be a
/// character is then freed and its own children move up to `parent`;
/// otherwise it becomes `parent`'s first child.
fn merge(tree: &mut ComponentTree, parent: RegionId, child: RegionId, options: &ErTreeOptions) {
    let absorbed = tree[child].clone();
    tree[parent].absorb(&absorbed);

    if options.is_discarded(&absorbed) {
        tree.relink_children(child, parent);
        tree.free(child);
    } else {
        tree.link_child(parent, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default() {
        let opts = ErTreeOptions::default();
        assert_eq!(opts.thresh_step, 8);
        assert_eq!(opts.min_area, 120);
        assert_eq!(opts.min_height, 10);
        assert_eq!(opts.min_width, 5);
        assert_eq!(opts.highest_level(), 32);
    }

    #[test]
    fn test_options_validate() {
        assert!(ErTreeOptions::new().with_thresh_step(0).validate().is_err());
        assert!(ErTreeOptions::new().with_thresh_step(256).validate().is_err());
        assert!(ErTreeOptions::new().with_thresh_step(1).validate().is_ok());
        assert_eq!(ErTreeOptions::unfiltered().highest_level(), 256);
    }

    #[test]
    fn test_single_pixel_image() {
        let img = GrayImage::filled(1, 1, 42).unwrap();
        let tree = extract_tree(&img, &ErTreeOptions::unfiltered()).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree[root].level, SENTINEL_LEVEL);
        assert_eq!(tree[root].area, 1);
        let kids: Vec<_> = tree.children(root).collect();
        assert_eq!(kids.len(), 1);
        assert_eq!(tree[kids[0]].level, 42);
        assert_eq!(tree[kids[0]].area, 1);
    }

    #[test]
    fn test_small_regions_are_folded_into_parent() {
        // 8x8 image, 2x2 dark square: too small under default thresholds
        let mut img = GrayImage::filled(8, 8, 200).unwrap();
        img.fill_box(&erfilter_core::Box::new_unchecked(3, 3, 2, 2), 0);
        let opts = ErTreeOptions::new().with_thresh_step(1).with_min_area(0);
        let tree = extract_tree(&img, &opts).unwrap();
        let root = tree.root().unwrap();

        // Both the dark square and the 8x8 background are below the
        // 10-pixel height limit, so only the sentinel remains.
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[root].area, 64);
        assert!(tree.children(root).next().is_none());
    }

    #[test]
    fn test_relabel_intermediate_level() {
        // Row: 5 3 4 -> the region opened at 3 is relabelled to 4 before
        // merging into the region at 5.
        let img = GrayImage::from_vec(3, 1, vec![5, 3, 4]).unwrap();
        let tree = extract_tree(&img, &ErTreeOptions::unfiltered()).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree[root].area, 3);

        let top: Vec<_> = tree.children(root).collect();
        assert_eq!(top.len(), 1);
        assert_eq!(tree[top[0]].level, 5);
        assert_eq!(tree[top[0]].area, 3);

        let inner: Vec<_> = tree.children(top[0]).collect();
        assert_eq!(inner.len(), 1);
        assert_eq!(tree[inner[0]].level, 4);
        assert_eq!(tree[inner[0]].area, 2);
        assert_eq!(tree[inner[0]].bound, erfilter_core::Box::new_unchecked(1, 0, 2, 1));
    }
}
