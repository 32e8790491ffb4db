//! Axis-aligned geometry used by every detector.
//!
//! Coordinates follow page space: `x` grows to the right, and in the
//! standard PDF convention `y` grows upwards, so `y` is the bottom edge
//! and `y + height` the top edge of a box.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box.
///
/// Width and height are never negative; the empty set maps to
/// [`BBox::zero`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge
    pub x: f32,
    /// Bottom edge (standard convention) or top edge (inverted convention)
    pub y: f32,
    /// Horizontal extent
    pub width: f32,
    /// Vertical extent
    pub height: f32,
}

impl BBox {
    /// Create a new box, clamping negative extents to zero.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// The zero box.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build a box from its edges.
    pub fn from_edges(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self::new(left, bottom, right - left, top - bottom)
    }

    /// Union of all boxes, or the zero box when the iterator is empty.
    pub fn union_all<I: IntoIterator<Item = BBox>>(boxes: I) -> Self {
        boxes
            .into_iter()
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_default()
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge.
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Check whether the box has no extent at all.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }

    /// Smallest box enclosing both boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.top().max(other.top()),
        )
    }

    /// Length of the shared horizontal range (0 when disjoint).
    pub fn horizontal_overlap(&self, other: &BBox) -> f32 {
        (self.right().min(other.right()) - self.x.max(other.x)).max(0.0)
    }

    /// Length of the shared vertical range (0 when disjoint).
    pub fn vertical_overlap(&self, other: &BBox) -> f32 {
        (self.top().min(other.top()) - self.y.max(other.y)).max(0.0)
    }

    /// Area of the intersection of both boxes.
    pub fn intersection_area(&self, other: &BBox) -> f32 {
        self.horizontal_overlap(other) * self.vertical_overlap(other)
    }

    /// Check whether the horizontal ranges touch or overlap.
    pub fn overlaps_horizontally(&self, other: &BBox) -> bool {
        self.x <= other.right() && other.x <= self.right()
    }

    /// Check whether the boxes intersect (touching edges count).
    pub fn intersects(&self, other: &BBox) -> bool {
        self.overlaps_horizontally(other) && self.y <= other.top() && other.y <= self.top()
    }

    /// Check whether a point lies inside the box (edges inclusive).
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.top()
    }

    /// Check whether `other` lies fully inside this box, with a small slack.
    pub fn contains(&self, other: &BBox, slack: f32) -> bool {
        other.x >= self.x - slack
            && other.right() <= self.right() + slack
            && other.y >= self.y - slack
            && other.top() <= self.top() + slack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_extent_is_clamped() {
        let b = BBox::new(10.0, 10.0, -5.0, -1.0);
        assert_eq!(b.width, 0.0);
        assert_eq!(b.height, 0.0);
    }

    #[test]
    fn test_union_all_empty_is_zero() {
        assert_eq!(BBox::union_all(Vec::new()), BBox::zero());
    }

    #[test]
    fn test_union_and_intersection() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(5.0, 5.0, 10.0, 10.0);
        let u = a.union(&b);
        assert_eq!(u, BBox::new(0.0, 0.0, 15.0, 15.0));
        assert_eq!(a.intersection_area(&b), 25.0);
        assert!(a.intersects(&b));

        let c = BBox::new(20.0, 0.0, 5.0, 5.0);
        assert_eq!(a.intersection_area(&c), 0.0);
        assert!(!a.overlaps_horizontally(&c));
    }

    #[test]
    fn test_contains() {
        let outer = BBox::new(0.0, 0.0, 100.0, 100.0);
        let inner = BBox::new(10.0, 10.0, 20.0, 20.0);
        assert!(outer.contains(&inner, 0.0));
        assert!(!inner.contains(&outer, 0.0));
        assert!(outer.contains_point(100.0, 0.0));
    }
}
