//! Region selection by non-maximum suppression
//!
//! Every threshold level of a character shows up as its own node in the
//! component tree. The selector walks the tree once and, for each chain of
//! strongly overlapping ancestors, keeps only the most stable member.
//!
//! # Stability
//!
//! For a chain `R_0 ⊂ R_1 ⊂ ... ⊂ R_{n-1}` and a window `T`, the stability
//! of `R_i` is the relative growth of the bounding box over `T` steps:
//!
//! ```text
//! S(R_i) = (|R_{i+T}| - |R_i|) / |R_i|
//! ```
//!
//! The member with the smallest `S` is the level least perturbed by the
//! following thresholds.

use crate::error::{RegionError, RegionResult};
use crate::region::{ComponentTree, RegionId};
use tracing::debug;

/// Options for non-maximum suppression
#[derive(Debug, Clone)]
pub struct SelectOptions {
    /// Stability window in chain steps (default: 2)
    pub stability_t: usize,
    /// Minimum bound overlap ratio for a parent to join the chain
    /// (default: 0.7)
    pub overlap_coef: f64,
    /// Selected regions must have fewer pixels than this (default: 900000)
    pub max_area: u32,
    /// Exclusive lower bound of width / height (default: 0.12)
    pub min_aspect: f64,
    /// Exclusive upper bound of width / height (default: 1.5)
    pub max_aspect: f64,
    /// Maximum bound extent as a fraction of the image size (default: 0.4)
    pub max_extent: f64,
    /// On equal stability, prefer the inner member with the smaller bound;
    /// when off, the outer member wins (default: true)
    pub prefer_smaller_on_tie: bool,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            stability_t: 2,
            overlap_coef: 0.7,
            max_area: 900_000,
            min_aspect: 0.12,
            max_aspect: 1.5,
            max_extent: 0.4,
            prefer_smaller_on_tie: true,
        }
    }
}

impl SelectOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stability window
    pub fn with_stability_t(mut self, t: usize) -> Self {
        self.stability_t = t;
        self
    }

    /// Set the overlap coefficient
    pub fn with_overlap_coef(mut self, coef: f64) -> Self {
        self.overlap_coef = coef;
        self
    }

    /// Set the maximum region area
    pub fn with_max_area(mut self, area: u32) -> Self {
        self.max_area = area;
        self
    }

    /// Set the accepted aspect-ratio interval
    pub fn with_aspect_range(mut self, min: f64, max: f64) -> Self {
        self.min_aspect = min;
        self.max_aspect = max;
        self
    }

    /// Set the maximum extent relative to the image
    pub fn with_max_extent(mut self, extent: f64) -> Self {
        self.max_extent = extent;
        self
    }

    /// Set the stability tie-break
    pub fn with_prefer_smaller_on_tie(mut self, prefer: bool) -> Self {
        self.prefer_smaller_on_tie = prefer;
        self
    }

    /// Validate options
    pub fn validate(&self) -> RegionResult<()> {
        if self.stability_t == 0 {
            return Err(RegionError::InvalidParameters(
                "stability_t must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.overlap_coef) {
            return Err(RegionError::InvalidParameters(format!(
                "overlap_coef must be in [0, 1), got {}",
                self.overlap_coef
            )));
        }
        if self.min_aspect >= self.max_aspect {
            return Err(RegionError::InvalidParameters(
                "min_aspect must be below max_aspect".to_string(),
            ));
        }
        Ok(())
    }
}

/// Visit order of the selector: iterative traversal with an explicit stack.
///
/// The first-child chain below a node is pushed, then nodes are emitted as
/// they are popped, continuing with the popped node's next sibling. A node is
/// therefore emitted after all of its descendants, so overlap chains are
/// always started from their innermost member.
pub fn traversal_order(tree: &ComponentTree) -> Vec<RegionId> {
    let mut order = Vec::with_capacity(tree.len());
    let mut stack: Vec<RegionId> = Vec::new();
    let mut cursor = tree.root();

    loop {
        while let Some(id) = cursor {
            stack.push(id);
            cursor = tree[id].child;
        }

        let Some(id) = stack.pop() else {
            break;
        };
        order.push(id);
        cursor = tree[id].next;
    }

    order
}

/// Select one stable region per chain of overlapping ancestors.
///
/// `image_width` and `image_height` bound the accepted region size via
/// [`SelectOptions::max_extent`]. The returned handles are in visit order.
/// Marks `done` and fills `stability` on the visited chain members.
pub fn non_maximum_suppression(
    tree: &mut ComponentTree,
    options: &SelectOptions,
    image_width: u32,
    image_height: u32,
) -> RegionResult<Vec<RegionId>> {
    options.validate()?;

    let t = options.stability_t;
    let mut pool = Vec::new();
    let mut chains = 0usize;

    for id in traversal_order(tree) {
        // The sentinel has no ancestor to form a chain with
        if tree[id].done || tree[id].is_sentinel() {
            continue;
        }

        let start = tree[id].bound;
        let mut chain: Vec<RegionId> = Vec::new();
        let mut cursor = Some(id);
        while let Some(ancestor) = cursor {
            let node = &tree[ancestor];
            let ratio = start.intersection_area(&node.bound) as f64 / node.bound.area() as f64;
            if node.done || ratio <= options.overlap_coef {
                break;
            }
            chain.push(ancestor);
            cursor = node.parent;
            tree[ancestor].done = true;
        }

        if chain.len() < t + 1 {
            continue;
        }
        chains += 1;

        for i in 0..chain.len() - t {
            let area = tree[chain[i]].bound.area() as f64;
            let grown = tree[chain[i + t]].bound.area() as f64;
            tree[chain[i]].stability = (grown - area) / area;
        }

        // Chain bounds grow outward, so the earliest of tied members is the
        // smallest one.
        let mut best = 0;
        for i in 1..chain.len() - t {
            let candidate = tree[chain[i]].stability;
            let current = tree[chain[best]].stability;
            if candidate < current || (!options.prefer_smaller_on_tie && candidate == current) {
                best = i;
            }
        }

        let selected = &tree[chain[best]];
        let aspect = selected.bound.aspect_ratio();
        if aspect > options.min_aspect
            && aspect < options.max_aspect
            && selected.area < options.max_area
            && f64::from(selected.bound.h) < f64::from(image_height) * options.max_extent
            && f64::from(selected.bound.w) < f64::from(image_width) * options.max_extent
        {
            pool.push(chain[best]);
        }
    }

    debug!(chains, selected = pool.len(), "non-maximum suppression done");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{Region, SENTINEL_LEVEL};
    use erfilter_core::Box;

    fn region(level: u32, bound: Box) -> Region {
        let mut r = Region::new(level, 0, bound.x, bound.y);
        r.bound = bound;
        r.area = bound.area() as u32;
        r
    }

    /// Sentinel -> a -> b -> c -> d, nested boxes, plus a sibling leaf of d
    fn nested_tree() -> (ComponentTree, Vec<RegionId>) {
        let mut tree = ComponentTree::new(1000, 1000);
        let root = tree.alloc(region(SENTINEL_LEVEL, Box::new_unchecked(0, 0, 1000, 1000)));
        tree.set_root(root);
        let a = tree.alloc(region(40, Box::new_unchecked(100, 100, 22, 42)));
        let b = tree.alloc(region(30, Box::new_unchecked(100, 100, 21, 41)));
        let c = tree.alloc(region(20, Box::new_unchecked(100, 100, 20, 40)));
        let d = tree.alloc(region(10, Box::new_unchecked(100, 100, 20, 39)));
        let e = tree.alloc(region(10, Box::new_unchecked(500, 500, 3, 3)));
        tree.link_child(root, a);
        tree.link_child(a, b);
        tree.link_child(b, c);
        tree.link_child(c, e);
        tree.link_child(c, d);
        (tree, vec![root, a, b, c, d, e])
    }

    #[test]
    fn test_traversal_visits_children_first() {
        let (tree, ids) = nested_tree();
        let order = traversal_order(&tree);
        assert_eq!(order.len(), 6);
        assert_eq!(order[0], ids[4]);
        assert_eq!(order[1], ids[5]);
        assert_eq!(*order.last().unwrap(), ids[0]);
    }

    #[test]
    fn test_single_selection_per_chain() {
        let (mut tree, ids) = nested_tree();
        let pool = non_maximum_suppression(&mut tree, &SelectOptions::default(), 1000, 1000)
            .unwrap();
        // Chain d, c, b, a (the sentinel does not overlap enough);
        // the tiny leaf e forms a chain of one and is skipped.
        assert_eq!(pool.len(), 1);
        assert!(ids[1..5].contains(&pool[0]));
        assert!(ids[1..5].iter().all(|&id| tree[id].done));
    }

    #[test]
    fn test_short_chain_is_skipped() {
        let (mut tree, _) = nested_tree();
        let opts = SelectOptions::default().with_stability_t(4);
        let pool = non_maximum_suppression(&mut tree, &opts, 1000, 1000).unwrap();
        assert!(pool.is_empty());
    }

    /// Sentinel -> a (400) -> b (200) -> c (100), stabilities tie at 1.0
    fn tied_tree() -> (ComponentTree, Vec<RegionId>) {
        let mut tree = ComponentTree::new(1000, 1000);
        let root = tree.alloc(region(SENTINEL_LEVEL, Box::new_unchecked(0, 0, 1000, 1000)));
        tree.set_root(root);
        let a = tree.alloc(region(30, Box::new_unchecked(100, 100, 20, 20)));
        let b = tree.alloc(region(20, Box::new_unchecked(100, 100, 10, 20)));
        let c = tree.alloc(region(10, Box::new_unchecked(100, 100, 10, 10)));
        tree.link_child(root, a);
        tree.link_child(a, b);
        tree.link_child(b, c);
        (tree, vec![root, a, b, c])
    }

    #[test]
    fn test_tie_break() {
        let opts = SelectOptions::default()
            .with_stability_t(1)
            .with_overlap_coef(0.2);

        let (mut tree, ids) = tied_tree();
        let pool = non_maximum_suppression(&mut tree, &opts, 1000, 1000).unwrap();
        assert_eq!(tree[ids[3]].stability, 1.0);
        assert_eq!(tree[ids[2]].stability, 1.0);
        assert_eq!(pool, vec![ids[3]]);

        let (mut tree, ids) = tied_tree();
        let opts = opts.with_prefer_smaller_on_tie(false);
        let pool = non_maximum_suppression(&mut tree, &opts, 1000, 1000).unwrap();
        assert_eq!(pool, vec![ids[2]]);
    }

    #[test]
    fn test_validate() {
        assert!(SelectOptions::new().with_stability_t(0).validate().is_err());
        assert!(SelectOptions::new().with_overlap_coef(1.5).validate().is_err());
        assert!(SelectOptions::new().with_aspect_range(2.0, 1.0).validate().is_err());
        assert!(SelectOptions::new().validate().is_ok());
    }
}
