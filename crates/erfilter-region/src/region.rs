//! Extremal regions and the component-tree arena
//!
//! A [`ComponentTree`] owns every [`Region`] produced while flooding an
//! image. Tree links are [`RegionId`] indices into the arena rather than
//! owning pointers: `parent`, `child` (first child) and `next` (next sibling)
//! encode the first-child/next-sibling hierarchy. Regions discarded by the
//! merge policy go back to a free list and their slot is reused.

use erfilter_core::{Box, Point};

/// Grey level of the sentinel root, above every quantized level
pub const SENTINEL_LEVEL: u32 = 256;

/// Stable handle of a region inside a [`ComponentTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(pub(crate) u32);

impl RegionId {
    /// Arena slot of this region
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One extremal region: a connected component at one grey level.
///
/// The struct carries both the tree-building fields and the fields the
/// grouping and recognition stages fill in later (`score`, `color`,
/// `label`, sibling links), so a single type flows through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Quantized grey level (`SENTINEL_LEVEL` for the root)
    pub level: u32,
    /// Offset of the pixel that opened the region
    pub pixel: u32,
    /// Number of pixels absorbed so far
    pub area: u32,
    /// Minimal rectangle covering every absorbed pixel
    pub bound: Box,
    /// Relative bound growth over the stability window (selection only)
    pub stability: f64,
    /// Set once the selector has placed the region in an overlap chain
    pub done: bool,

    pub parent: Option<RegionId>,
    pub child: Option<RegionId>,
    pub next: Option<RegionId>,

    /// Center of `bound`
    pub center: Point,
    /// Per-channel mean color of the region's pixels
    pub color: [f64; 3],
    /// Classifier confidence
    pub score: f64,
    /// Recognized character
    pub label: Option<char>,
    /// Recognizer confidence in `[0, 1)`
    pub confidence: f64,
    /// Index of the channel image the region was extracted from
    pub channel: usize,

    /// Nearest left neighbour in the grouping pool (pool index)
    pub sibling_left: Option<usize>,
    /// Nearest right neighbour in the grouping pool (pool index)
    pub sibling_right: Option<usize>,
}

impl Region {
    /// Create an empty region at `level`, opened by pixel `(x, y)`.
    ///
    /// The bound starts at the opening pixel, which is always absorbed into
    /// this region (or into the region it is merged into) later on. The area
    /// stays zero until pixels are accumulated.
    pub fn new(level: u32, pixel: u32, x: i32, y: i32) -> Self {
        Self {
            level,
            pixel,
            area: 0,
            bound: Box::from_pixel(x, y),
            stability: 0.0,
            done: false,
            parent: None,
            child: None,
            next: None,
            center: Point::default(),
            color: [0.0; 3],
            score: 0.0,
            label: None,
            confidence: 0.0,
            channel: 0,
            sibling_left: None,
            sibling_right: None,
        }
    }

    /// Whether this is the sentinel root
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.level == SENTINEL_LEVEL
    }

    /// Water saturates pixel `(x, y)`: grow the area and the bound.
    #[inline]
    pub fn accumulate(&mut self, x: i32, y: i32) {
        if self.area == 0 {
            self.bound = Box::from_pixel(x, y);
        } else {
            self.bound.include_pixel(x, y);
        }
        self.area += 1;
    }

    /// Absorb the pixels of `other` (area and bound only, no links).
    #[inline]
    pub fn absorb(&mut self, other: &Region) {
        self.area += other.area;
        self.bound = self.bound.union(&other.bound);
    }

    /// Copy of this region detached from any tree.
    pub fn detached(&self) -> Region {
        Region {
            parent: None,
            child: None,
            next: None,
            sibling_left: None,
            sibling_right: None,
            ..self.clone()
        }
    }
}

/// Arena owning every region of one component tree
#[derive(Debug, Clone, Default)]
pub struct ComponentTree {
    slots: Vec<Option<Region>>,
    free: Vec<RegionId>,
    root: Option<RegionId>,
    width: u32,
    height: u32,
}

impl ComponentTree {
    /// Create an empty arena for a `width` x `height` image
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
            width,
            height,
        }
    }

    /// Width of the image the tree was built from
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the image the tree was built from
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The sentinel root, once the tree is complete
    #[inline]
    pub fn root(&self) -> Option<RegionId> {
        self.root
    }

    pub(crate) fn set_root(&mut self, id: RegionId) {
        self.root = Some(id);
    }

    /// Number of live regions in the arena
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether the arena holds no live region
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a region and return its handle, reusing a freed slot if any
    pub fn alloc(&mut self, region: Region) -> RegionId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(region);
                id
            }
            None => {
                let id = RegionId(self.slots.len() as u32);
                self.slots.push(Some(region));
                id
            }
        }
    }

    /// Release a region slot. Its links are not touched.
    pub fn free(&mut self, id: RegionId) {
        if self.slots[id.index()].take().is_some() {
            self.free.push(id);
        }
    }

    /// Get a live region
    #[inline]
    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Get a live region mutably
    #[inline]
    pub fn get_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Children of `id` in sibling-chain order
    pub fn children(&self, id: RegionId) -> Children<'_> {
        Children {
            tree: self,
            cursor: self[id].child,
        }
    }

    /// Make `child` the first child of `parent`.
    pub fn link_child(&mut self, parent: RegionId, child: RegionId) {
        let first = self[parent].child;
        let node = &mut self[child];
        node.next = first;
        node.parent = Some(parent);
        self[parent].child = Some(child);
    }

    /// Move the whole child list of `from` to the front of `to`'s list.
    pub fn relink_children(&mut self, from: RegionId, to: RegionId) {
        let Some(first) = self[from].child.take() else {
            return;
        };

        let mut last = first;
        loop {
            self[last].parent = Some(to);
            match self[last].next {
                Some(next) => last = next,
                None => break,
            }
        }

        self[last].next = self[to].child;
        self[to].child = Some(first);
    }

    /// Every region reachable from the root, visited in preorder
    pub fn descendants(&self) -> Vec<RegionId> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack: Vec<RegionId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            let mut kids: Vec<RegionId> = self.children(id).collect();
            kids.reverse();
            stack.extend(kids);
        }
        order
    }

    /// Copy the selected regions out of the tree into an owned pool.
    ///
    /// Tree links are cleared, `center` is filled in from the bound and every
    /// region is tagged with `channel`. Dropping the tree afterwards releases
    /// all remaining regions at once.
    pub fn collect(&self, ids: &[RegionId], channel: usize) -> Vec<Region> {
        ids.iter()
            .filter_map(|&id| self.get(id))
            .map(|r| {
                let mut region = r.detached();
                region.center = region.bound.center();
                region.channel = channel;
                region
            })
            .collect()
    }
}

impl std::ops::Index<RegionId> for ComponentTree {
    type Output = Region;

    fn index(&self, id: RegionId) -> &Region {
        self.slots[id.index()]
            .as_ref()
            .unwrap_or_else(|| panic!("region {} was freed", id.index()))
    }
}

impl std::ops::IndexMut<RegionId> for ComponentTree {
    fn index_mut(&mut self, id: RegionId) -> &mut Region {
        self.slots[id.index()]
            .as_mut()
            .unwrap_or_else(|| panic!("region {} was freed", id.index()))
    }
}

/// Iterator over a region's child list
pub struct Children<'a> {
    tree: &'a ComponentTree,
    cursor: Option<RegionId>,
}

impl Iterator for Children<'_> {
    type Item = RegionId;

    fn next(&mut self) -> Option<RegionId> {
        let id = self.cursor?;
        self.cursor = self.tree[id].next;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_sets_bound_from_first_pixel() {
        let mut r = Region::new(3, 0, 9, 9);
        r.accumulate(2, 2);
        assert_eq!(r.area, 1);
        assert_eq!(r.bound, Box::from_pixel(2, 2));
        r.accumulate(4, 3);
        assert_eq!(r.area, 2);
        assert_eq!(r.bound, Box::new_unchecked(2, 2, 3, 2));
    }

    #[test]
    fn test_alloc_reuses_freed_slot() {
        let mut tree = ComponentTree::new(4, 4);
        let a = tree.alloc(Region::new(1, 0, 0, 0));
        let b = tree.alloc(Region::new(2, 1, 1, 0));
        assert_eq!(tree.len(), 2);
        tree.free(a);
        assert_eq!(tree.len(), 1);
        assert!(tree.get(a).is_none());
        let c = tree.alloc(Region::new(3, 2, 2, 0));
        assert_eq!(c, a);
        assert_eq!(tree[b].level, 2);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_link_and_relink_children() {
        let mut tree = ComponentTree::new(4, 4);
        let p = tree.alloc(Region::new(10, 0, 0, 0));
        let q = tree.alloc(Region::new(9, 0, 0, 0));
        let c1 = tree.alloc(Region::new(1, 0, 0, 0));
        let c2 = tree.alloc(Region::new(2, 0, 0, 0));
        let c3 = tree.alloc(Region::new(3, 0, 0, 0));

        tree.link_child(q, c1);
        tree.link_child(q, c2);
        tree.link_child(p, c3);
        assert_eq!(tree.children(q).collect::<Vec<_>>(), vec![c2, c1]);

        tree.relink_children(q, p);
        assert_eq!(tree.children(p).collect::<Vec<_>>(), vec![c2, c1, c3]);
        assert!(tree.children(q).next().is_none());
        assert_eq!(tree[c1].parent, Some(p));
        assert_eq!(tree[c2].parent, Some(p));
    }

    #[test]
    fn test_collect_detaches() {
        let mut tree = ComponentTree::new(10, 10);
        let p = tree.alloc(Region::new(10, 0, 0, 0));
        let mut r = Region::new(4, 0, 2, 2);
        r.accumulate(2, 2);
        r.accumulate(5, 6);
        let c = tree.alloc(r);
        tree.link_child(p, c);

        let pool = tree.collect(&[c], 2);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].parent, None);
        assert_eq!(pool[0].channel, 2);
        assert_eq!(pool[0].center, Point::new(4, 4));
    }
}
