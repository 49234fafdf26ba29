//! Box - Rectangle regions
//!
//! Axis-aligned rectangles used as region bounds and line boxes.

use crate::error::{Error, Result};
use crate::point::Point;

/// A rectangle region
///
/// A small `Copy` type: `(x, y)` is the top-left corner, `w`/`h` the extent.
/// The right and bottom edges are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Box {
    /// Left x coordinate
    pub x: i32,
    /// Top y coordinate
    pub y: i32,
    /// Width
    pub w: i32,
    /// Height
    pub h: i32,
}

impl Box {
    /// Create a new box
    ///
    /// # Errors
    ///
    /// Returns an error if width or height is negative.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Result<Self> {
        if w < 0 || h < 0 {
            return Err(Error::InvalidParameter(format!(
                "box dimensions must be non-negative: w={}, h={}",
                w, h
            )));
        }
        Ok(Self { x, y, w, h })
    }

    /// Create a box without validation
    pub const fn new_unchecked(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Create the 1x1 box covering a single pixel
    pub const fn from_pixel(x: i32, y: i32) -> Self {
        Self { x, y, w: 1, h: 1 }
    }

    /// Get the right x coordinate (exclusive)
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Get the bottom y coordinate (exclusive)
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Top-left corner
    #[inline]
    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Bottom-left corner (exclusive bottom edge)
    #[inline]
    pub fn bottom_left(&self) -> Point {
        Point::new(self.x, self.bottom())
    }

    /// Center point (integer division, biased toward the top-left)
    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    /// Get the area
    #[inline]
    pub fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    /// Width divided by height
    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.w) / f64::from(self.h)
    }

    /// Check if the box is empty (zero area)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Check if this box contains another box
    pub fn contains_box(&self, other: &Box) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Compute the intersection of two boxes
    pub fn intersect(&self, other: &Box) -> Option<Box> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Box {
                x,
                y,
                w: right - x,
                h: bottom - y,
            })
        } else {
            None
        }
    }

    /// Area of the intersection, 0 when the boxes are disjoint
    #[inline]
    pub fn intersection_area(&self, other: &Box) -> i64 {
        self.intersect(other).map_or(0, |b| b.area())
    }

    /// Compute the union (bounding box) of two boxes
    pub fn union(&self, other: &Box) -> Box {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        Box {
            x,
            y,
            w: right - x,
            h: bottom - y,
        }
    }

    /// Grow the box in place so that it covers pixel `(x, y)`
    pub fn include_pixel(&mut self, x: i32, y: i32) {
        let x1 = self.x.min(x);
        let y1 = self.y.min(y);
        let x2 = (self.right() - 1).max(x);
        let y2 = (self.bottom() - 1).max(y);
        *self = Box::new_unchecked(x1, y1, x2 - x1 + 1, y2 - y1 + 1);
    }

    /// Clip the box to fit within bounds
    pub fn clip(&self, width: i32, height: i32) -> Option<Box> {
        let x = self.x.max(0);
        let y = self.y.max(0);
        let right = self.right().min(width);
        let bottom = self.bottom().min(height);

        if x < right && y < bottom {
            Some(Box {
                x,
                y,
                w: right - x,
                h: bottom - y,
            })
        } else {
            None
        }
    }
}

/// Bounding box of a sequence of boxes, `None` when the sequence is empty
pub fn union_all<'a>(boxes: impl IntoIterator<Item = &'a Box>) -> Option<Box> {
    boxes
        .into_iter()
        .fold(None, |acc: Option<Box>, b| match acc {
            Some(u) => Some(u.union(b)),
            None => Some(*b),
        })
}
