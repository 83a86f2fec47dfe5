//! Geometric primitives

use serde::Serialize;

use crate::path::Point;
use crate::transform::Transform2D;

/// An axis-aligned box `{x, y, width, height}`.
///
/// `right == x + width` and `bottom == y + height` always hold; the edge
/// accessors derive from the stored origin and size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[repr(C)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub const ZERO: BoundingBox = BoundingBox::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_points(p1: Point, p2: Point) -> Self {
        let x = p1.x.min(p2.x);
        let y = p1.y.min(p2.y);
        let width = (p2.x - p1.x).abs();
        let height = (p2.y - p1.y).abs();
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from its edges.
    pub fn from_edges(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    /// Axis-aligned union of all boxes.
    ///
    /// A single box is returned unchanged. An empty input yields
    /// [`BoundingBox::ZERO`] so degenerate callers never see NaN.
    pub fn from_boxes<'a>(boxes: impl IntoIterator<Item = &'a BoundingBox>) -> Self {
        let mut iter = boxes.into_iter();
        let Some(first) = iter.next() else {
            return Self::ZERO;
        };
        iter.fold(*first, |acc, b| acc.union(b))
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    /// Whether `other` lies entirely inside this box (within `epsilon`).
    pub fn contains_box(&self, other: &BoundingBox, epsilon: f32) -> bool {
        other.left() >= self.left() - epsilon
            && other.top() >= self.top() - epsilon
            && other.right() <= self.right() + epsilon
            && other.bottom() <= self.bottom() + epsilon
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        Self::from_edges(
            self.left().min(other.left()),
            self.top().min(other.top()),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    pub fn translate(&self, dx: f32, dy: f32) -> BoundingBox {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grows every edge by `amount`.
    pub fn inflate(&self, amount: f32) -> BoundingBox {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }

    /// Bounds of the four transformed corners.
    pub fn transform(&self, transform: &Transform2D) -> BoundingBox {
        let corners = [
            transform.apply(Point::new(self.left(), self.top())),
            transform.apply(Point::new(self.right(), self.top())),
            transform.apply(Point::new(self.left(), self.bottom())),
            transform.apply(Point::new(self.right(), self.bottom())),
        ];
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in corners {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Self::from_edges(min_x, min_y, max_x, max_y)
    }
}

/// A circle
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Circle {
    pub center: Point,
    pub radius: f32,
}

impl Circle {
    pub const fn new(center: Point, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(
            self.center.x - self.radius,
            self.center.y - self.radius,
            self.radius * 2.0,
            self.radius * 2.0,
        )
    }
}

/// Shadow parameters
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct Shadow {
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur_radius: f32,
    pub color: crate::color::Color,
}

impl Shadow {
    pub const fn none() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            blur_radius: 0.0,
            color: crate::color::Color::TRANSPARENT,
        }
    }

    pub fn is_visible(&self) -> bool {
        !self.color.is_transparent()
            && (self.offset_x != 0.0 || self.offset_y != 0.0 || self.blur_radius > 0.0)
    }

    /// Extends `rect` by the area the shadow can paint into.
    pub fn extend(&self, rect: &BoundingBox) -> BoundingBox {
        if !self.is_visible() {
            return *rect;
        }
        rect.union(
            &rect
                .translate(self.offset_x, self.offset_y)
                .inflate(self.blur_radius),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_of_single_box_is_identity() {
        let b = BoundingBox::new(3.0, -2.0, 10.5, 4.25);
        assert_eq!(BoundingBox::from_boxes([&b]), b);
    }

    #[test]
    fn union_of_no_boxes_is_zero() {
        assert_eq!(BoundingBox::from_boxes(std::iter::empty()), BoundingBox::ZERO);
    }

    #[test]
    fn union_spans_all_edges() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, -5.0, 10.0, 5.0);
        let u = BoundingBox::from_boxes([&a, &b]);
        assert_eq!(u, BoundingBox::new(0.0, -5.0, 15.0, 15.0));
        assert_eq!(u.right(), u.x + u.width);
        assert_eq!(u.bottom(), u.y + u.height);
    }

    #[test]
    fn shadow_extends_by_offset_and_blur() {
        let shadow = Shadow {
            offset_x: 4.0,
            offset_y: 2.0,
            blur_radius: 1.0,
            color: crate::color::Color::BLACK,
        };
        let rect = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(shadow.extend(&rect), BoundingBox::new(0.0, 0.0, 15.0, 13.0));
    }
}
