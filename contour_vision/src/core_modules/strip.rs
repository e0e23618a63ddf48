// THEORY:
// A `Strip` is a polyline: consecutive points joined by lines. Storing a run of
// connected segments as a strip writes every shared endpoint once instead of
// twice, which roughly halves the size of a traced frame.
//
// Strip formation walks the segment list and keeps appending end points while
// each segment starts where the previous one ended. A gap closes the strip. A
// strip is also closed when it reaches `MAX_STRIP_POINTS`, because its length
// must fit in one count byte; the next strip then starts again at the last
// point written, so the seam point appears in both strips.

use crate::core_modules::line_segment::{LineSegment, Point};
use log::debug;

/// Largest number of points a strip can hold (its count is one byte).
pub const MAX_STRIP_POINTS: usize = 255;

/// An ordered run of points, each joined to the next by a line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Strip {
    pub points: Vec<Point>,
}

impl Strip {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The segments joining consecutive points. A strip of fewer than two points
    /// has none.
    pub fn to_segments(&self) -> Vec<LineSegment> {
        self.points
            .windows(2)
            .map(|pair| LineSegment::new(pair[0], pair[1]))
            .collect()
    }
}

/// Groups an ordered segment list into strips.
pub fn segments_to_strips(segments: &[LineSegment]) -> Vec<Strip> {
    let mut strips = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    for ls in segments {
        if current.last().is_some_and(|last| *last != ls.start) {
            close_strip(&mut strips, &mut current);
        }
        if current.is_empty() {
            current.push(ls.start);
        }
        current.push(ls.end);

        if current.len() == MAX_STRIP_POINTS {
            debug!("strip reached {MAX_STRIP_POINTS} points, splitting");
            let seam = ls.end;
            close_strip(&mut strips, &mut current);
            current.push(seam);
        }
    }
    close_strip(&mut strips, &mut current);
    strips
}

/// Flattens strips back into segments. Segments never cross strip boundaries.
pub fn strips_to_segments(strips: &[Strip]) -> Vec<LineSegment> {
    strips.iter().flat_map(Strip::to_segments).collect()
}

fn close_strip(strips: &mut Vec<Strip>, current: &mut Vec<Point>) {
    let points = std::mem::take(current);
    if points.len() >= 2 {
        strips.push(Strip::new(points));
    }
}
