// THEORY:
// The `ContourCluster` is the working set of the tracer: every contour point of a
// frame, in discovery order, each with a "used" flag. Tracing consumes points by
// marking them used; nothing is ever removed, so a point's index stays valid for
// the lifetime of the frame.
//
// Key architectural principles:
// 1.  **Stable Indices**: `points[i].index == i` for every point. Segments and
//     distance records refer to points by index only.
// 2.  **Lookup-Only Block Link**: A point remembers the slot of the block it was
//     found in. The slot is a plain index into the `BlockIndex`; the point owns
//     nothing.
// 3.  **Two Search Strategies**: `local_search` only measures points in the
//     neighborhood of the origin's block, `full_search` measures every unused
//     point. Neither sorts; ordering is the tracer's job.

use crate::core_modules::block_index::BlockIndex;
use crate::core_modules::line_segment::{LineSegment, Point};
use crate::core_modules::vec2::vec2::Vec2;

/// A pixel flagged as an edge by the luminance gradient test.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourPoint {
    pub pt: Point,
    /// Position of this point in its cluster.
    pub index: usize,
    /// Slot of the block the point was discovered in.
    pub block: Option<usize>,
    pub used: bool,
}

impl ContourPoint {
    pub fn new(pt: Point, index: usize, block: Option<usize>) -> Self {
        Self {
            pt,
            index,
            block,
            used: false,
        }
    }

    pub fn distance(&self, other: &ContourPoint) -> f32 {
        self.pt.distance(&other.pt)
    }
}

/// Distance from a search origin to one candidate point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointDistance {
    pub distance: f32,
    pub index: usize,
}

/// All contour points of one frame.
#[derive(Debug, Clone)]
pub struct ContourCluster {
    points: Vec<ContourPoint>,
    blocks: Option<BlockIndex>,
}

impl ContourCluster {
    /// Builds a cluster from bare coordinates. Without a block index only full
    /// search is available.
    pub fn from_points(points: Vec<Point>) -> Self {
        let points = points
            .into_iter()
            .enumerate()
            .map(|(i, pt)| ContourPoint::new(pt, i, None))
            .collect();
        Self { points, blocks: None }
    }

    /// Builds a cluster from the output of `BlockIndex::extract_contour_points`,
    /// keeping the index for local search.
    ///
    /// Every point's `index` must equal its position, since `Block::points`
    /// refers to points by that index.
    pub fn from_blocks(points: Vec<ContourPoint>, blocks: BlockIndex) -> Self {
        debug_assert!(
            points.iter().enumerate().all(|(i, p)| p.index == i),
            "contour point indices must match their positions"
        );
        Self {
            points,
            blocks: Some(blocks),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn at(&self, idx: usize) -> &ContourPoint {
        &self.points[idx]
    }

    pub fn points(&self) -> &[ContourPoint] {
        &self.points
    }

    pub fn block_index(&self) -> Option<&BlockIndex> {
        self.blocks.as_ref()
    }

    pub fn mark_used(&mut self, idx: usize) {
        self.points[idx].used = true;
    }

    /// Clears every used flag so the cluster can be traced again.
    pub fn reset_usage(&mut self) {
        for p in &mut self.points {
            p.used = false;
        }
    }

    /// Segment between two cluster points, remembering their indices.
    pub fn segment(&self, idx_a: usize, idx_b: usize) -> LineSegment {
        LineSegment::traced(self.points[idx_a].pt, self.points[idx_b].pt, idx_a, idx_b)
    }

    /// Displacement from point `idx_a` to point `idx_b`.
    pub fn vector(&self, idx_a: usize, idx_b: usize) -> Vec2 {
        Vec2::from_points(self.points[idx_a].pt, self.points[idx_b].pt)
    }

    /// Distances from `origin` to every unused point in the surrounding blocks.
    ///
    /// Returns `None` when the cluster has no block index or the origin has no
    /// block, in which case only full search makes sense.
    pub fn local_search(&self, origin: usize) -> Option<Vec<PointDistance>> {
        let index = self.blocks.as_ref()?;
        let slot = self.points[origin].block?;

        let mut distances = Vec::new();
        for neighbor in index.local_neighborhood(slot) {
            for &candidate in &index.block(neighbor).points {
                self.push_candidate(origin, candidate, &mut distances);
            }
        }
        Some(distances)
    }

    /// Distances from `origin` to every unused point of the cluster.
    pub fn full_search(&self, origin: usize) -> Vec<PointDistance> {
        let mut distances = Vec::with_capacity(self.points.len());
        for candidate in 0..self.points.len() {
            self.push_candidate(origin, candidate, &mut distances);
        }
        distances
    }

    fn push_candidate(&self, origin: usize, candidate: usize, out: &mut Vec<PointDistance>) {
        if candidate == origin || self.points[candidate].used {
            return;
        }
        out.push(PointDistance {
            distance: self.points[origin].distance(&self.points[candidate]),
            index: candidate,
        });
    }
}
