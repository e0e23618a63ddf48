// THEORY:
// `Point` and `LineSegment` are the "dumb" data containers of the vector side of
// the pipeline. A `Point` is an integer pixel coordinate. A `LineSegment` joins
// two points and, when it was produced by the tracer, remembers which cluster
// points it came from. Segments built later (by merging or rescaling) carry no
// cluster indices.
//
// Segments are immutable once built. The optimizer and the rescaler never edit a
// segment; they build new ones from old ones.

use crate::core_modules::vec2::vec2::Vec2;

/// An integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f32 {
        Vec2::from_points(*self, *other).length()
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point::new(x, y)
    }
}

/// A straight line between two pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Point,
    pub end: Point,
    /// Index of the cluster point `start` was traced from, if any.
    pub idx_start: Option<usize>,
    /// Index of the cluster point `end` was traced from, if any.
    pub idx_end: Option<usize>,
}

impl LineSegment {
    /// A synthesized segment with no link back to cluster points.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            idx_start: None,
            idx_end: None,
        }
    }

    /// A segment produced by the tracer between two cluster points.
    pub fn traced(start: Point, end: Point, idx_start: usize, idx_end: usize) -> Self {
        Self {
            start,
            end,
            idx_start: Some(idx_start),
            idx_end: Some(idx_end),
        }
    }

    pub fn direction(&self) -> Vec2 {
        Vec2::from_points(self.start, self.end)
    }

    pub fn length(&self) -> f32 {
        self.direction().length()
    }

    /// True when `next` starts exactly where this segment ends.
    pub fn connects_to(&self, next: &LineSegment) -> bool {
        self.end == next.start
    }
}
