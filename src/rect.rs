//! Rectangle types.
//!
//! Rectangles describe detection bounding boxes and crop regions, in normalized [0,1] texture
//! coordinates.

use std::{fmt, ops::RangeInclusive};

use nalgebra::{Point2, Vector2};

/// An axis-aligned rectangle.
///
/// Rectangles are allowed to have zero height and/or width. Negative dimensions are not allowed.
#[derive(Clone, Copy, PartialEq)]
pub struct Rect {
    center: Point2<f32>,
    size: Vector2<f32>,
}

impl Rect {
    /// Creates a rectangle extending outwards from a center point.
    #[inline]
    pub fn from_center(x_center: f32, y_center: f32, width: f32, height: f32) -> Self {
        Self {
            center: Point2::new(x_center, y_center),
            size: Vector2::new(width, height),
        }
    }

    /// Creates a rectangle extending downwards and right from a point.
    #[inline]
    pub fn from_top_left(top_left_x: f32, top_left_y: f32, width: f32, height: f32) -> Self {
        Self::from_center(
            top_left_x + width * 0.5,
            top_left_y + height * 0.5,
            width,
            height,
        )
    }

    /// Constructs a [`Rect`] that spans a range of X and Y coordinates.
    pub fn from_ranges(x: RangeInclusive<f32>, y: RangeInclusive<f32>) -> Self {
        Self::span_inner(*x.start(), *y.start(), *x.end(), *y.end())
    }

    /// Computes the (axis-aligned) bounding rectangle that encompasses `points`.
    ///
    /// Returns [`None`] if `points` is an empty iterator.
    pub fn bounding<I: IntoIterator<Item = T>, T: Into<Point2<f32>>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();

        let first: Point2<f32> = iter.next()?.into();
        let (mut min, mut max) = (first.coords, first.coords);

        for pt in iter {
            let pt = pt.into();
            min = min.inf(&pt.coords);
            max = max.sup(&pt.coords);
        }

        Some(Self::span_inner(min.x, min.y, max.x, max.y))
    }

    fn span_inner(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        assert!(x_min <= x_max, "x_min={}, x_max={}", x_min, x_max);
        assert!(y_min <= y_max, "y_min={}, y_max={}", y_min, y_max);
        Self::from_top_left(x_min, y_min, x_max - x_min, y_max - y_min)
    }

    /// Returns the smallest square with the same center that contains `self`.
    ///
    /// Both dimensions of the result equal `max(width, height)`. A zero-size rectangle stays a
    /// zero-size square.
    #[must_use]
    pub fn to_square(&self) -> Self {
        let side = self.size.x.max(self.size.y);
        Self {
            center: self.center,
            size: Vector2::new(side, side),
        }
    }

    #[inline]
    pub fn top_left(&self) -> Point2<f32> {
        self.center - self.size * 0.5
    }

    /// Returns the X coordinate of the left side of the rectangle.
    #[inline]
    pub fn x(&self) -> f32 {
        self.top_left().x
    }

    /// Returns the Y coordinate of the top side of the rectangle.
    #[inline]
    pub fn y(&self) -> f32 {
        self.top_left().y
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.size.y
    }

    /// Returns the area covered by `self`, in normalized units.
    #[inline]
    pub fn area(&self) -> f32 {
        self.size.x * self.size.y
    }

    #[inline]
    pub fn center(&self) -> Point2<f32> {
        self.center
    }

    #[inline]
    pub fn size(&self) -> Vector2<f32> {
        self.size
    }

    /// Computes the intersection of `self` and `other`.
    ///
    /// Returns [`None`] when the intersection is empty (ie. the rectangles do not overlap).
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let min = self.top_left().coords.sup(&other.top_left().coords);
        let max = (self.top_left().coords + self.size())
            .inf(&(other.top_left().coords + other.size()));
        if min.x > max.x || min.y > max.y {
            return None;
        }

        Some(Rect::span_inner(min.x, min.y, max.x, max.y))
    }

    fn intersection_area(&self, other: &Self) -> f32 {
        self.intersection(other).map_or(0.0, |rect| rect.area())
    }

    fn union_area(&self, other: &Self) -> f32 {
        self.area() + other.area() - self.intersection_area(other)
    }

    /// Computes the Intersection over Union (IOU) of `self` and `other`.
    pub fn iou(&self, other: &Self) -> f32 {
        self.intersection_area(other) / self.union_area(other)
    }

    pub fn contains_point(&self, point: impl Into<Point2<f32>>) -> bool {
        let p: Point2<f32> = point.into();
        self.x() <= p.x
            && self.y() <= p.y
            && self.x() + self.width() >= p.x
            && self.y() + self.height() >= p.y
    }

    /// Returns the rectangle's corners: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point2<f32>; 4] {
        let [x, y] = [self.x(), self.y()];
        let [w, h] = [self.width(), self.height()];
        [
            Point2::new(x, y),
            Point2::new(x + w, y),
            Point2::new(x + w, y + h),
            Point2::new(x, y + h),
        ]
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect @ ({},{})/{}x{}",
            self.center.x, self.center.y, self.size.x, self.size.y
        )
    }
}
