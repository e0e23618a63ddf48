// THEORY:
// The `BlockIndex` owns the full grid of `Block`s for one frame. It turns the raw
// image into an ordered list of contour points and later answers "which blocks
// surround this one?" for the tracer's local search.
//
// Key architectural principles:
// 1.  **Whole Tiles Only**: The grid holds `width / block_size` by
//     `height / block_size` blocks. A partial tile at the right or bottom edge is
//     dropped, so edges that only live in that strip are never reported.
// 2.  **Keyed Lookup**: Blocks sit in a row-major `Vec`. A `HashMap` keyed by the
//     block's top-left coordinate finds a neighbor from `origin +/- block_size`.
//     A missing key means "off-image", never an error.
// 3.  **Flood Fill Discovery**: Points are discovered by a depth-first flood fill
//     over the block grid (left, up, right, down) using an explicit stack. The fill
//     restarts from the next unvisited block in row-major order until every block
//     has been visited, so disconnected regions are all covered. The order of
//     discovery defines each point's index in the cluster.
// 4.  **Per-Run Statistics**: Counters are returned in `ScanStats` instead of
//     being accumulated in shared state.

use crate::core_modules::block::block::{Block, BlockKey};
use crate::core_modules::contour_cluster::ContourPoint;
use crate::core_modules::error::{ContourError, Result};
use crate::core_modules::line_segment::Point;
use crate::core_modules::sampler::PixelSampler;
use log::debug;
use std::collections::HashMap;

/// The four direct neighbors of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Up,
    Right,
    Down,
}

impl Direction {
    /// Order in which the flood fill descends into neighbors.
    pub const FLOOD_ORDER: [Direction; 4] = [Direction::Left, Direction::Up, Direction::Right, Direction::Down];

    fn offset(self) -> (i64, i64) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
        }
    }
}

/// Counters collected while scanning one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Number of blocks in the grid.
    pub blocks_total: usize,
    /// Blocks reached by the flood fill.
    pub blocks_visited: usize,
    /// Blocks that produced at least one contour point.
    pub blocks_scanned: usize,
    /// Contour points discovered.
    pub points: usize,
}

/// The grid of blocks covering one image.
#[derive(Debug, Clone)]
pub struct BlockIndex {
    /// Width of the grid in blocks.
    grid_width: u32,
    /// Height of the grid in blocks.
    grid_height: u32,
    blocks: Vec<Block>,
    lookup: HashMap<BlockKey, usize>,
}

impl BlockIndex {
    /// Creates one block per whole `block_size` tile of a `width x height` image.
    pub fn new(image_width: u32, image_height: u32, block_size: u32) -> Result<Self> {
        if block_size == 0 {
            return Err(ContourError::InvalidConfig("block size must be at least 1".into()));
        }
        let grid_width = image_width / block_size;
        let grid_height = image_height / block_size;
        let num_blocks = block_count(grid_width, grid_height);

        let mut blocks = Vec::with_capacity(num_blocks);
        let mut lookup = HashMap::with_capacity(num_blocks);
        for i in 0..num_blocks {
            let y = (i / grid_width as usize) as u32;
            let x = (i % grid_width as usize) as u32;
            let origin = Point::new((x * block_size) as i32, (y * block_size) as i32);
            let block = Block::new(origin, block_size);
            lookup.insert(block.key(), i);
            blocks.push(block);
        }

        Ok(Self {
            grid_width,
            grid_height,
            blocks,
            lookup,
        })
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn grid_dimensions(&self) -> (u32, u32) {
        (self.grid_width, self.grid_height)
    }

    pub fn block(&self, slot: usize) -> &Block {
        &self.blocks[slot]
    }

    /// Slot of the block whose top-left corner is `key`, if it exists.
    pub fn slot_of(&self, key: BlockKey) -> Option<usize> {
        self.lookup.get(&key).copied()
    }

    /// Slot of the block next to `slot` in direction `dir`.
    pub fn neighbor(&self, slot: usize, dir: Direction) -> Option<usize> {
        let (dx, dy) = dir.offset();
        self.slot_of(self.blocks[slot].neighbor_key(dx, dy))
    }

    /// The block itself, its left and right neighbors, and the up and down
    /// neighbors each followed by their own left and right neighbors.
    pub fn local_neighborhood(&self, slot: usize) -> Vec<usize> {
        let mut slots = Vec::with_capacity(9);
        slots.push(slot);
        slots.extend(self.neighbor(slot, Direction::Left));
        slots.extend(self.neighbor(slot, Direction::Right));
        for vertical in [Direction::Up, Direction::Down] {
            if let Some(v) = self.neighbor(slot, vertical) {
                slots.push(v);
                slots.extend(self.neighbor(v, Direction::Left));
                slots.extend(self.neighbor(v, Direction::Right));
            }
        }
        slots
    }

    /// Flood-fills the grid, scanning every block for contour points.
    ///
    /// Each returned point's `index` equals its position in the returned vector,
    /// and its owning block lists that index.
    pub fn extract_contour_points<S: PixelSampler + ?Sized>(
        &mut self,
        sampler: &S,
        grey_threshold: u8,
    ) -> (Vec<ContourPoint>, ScanStats) {
        let mut points: Vec<ContourPoint> = Vec::new();
        let mut stats = ScanStats {
            blocks_total: self.blocks.len(),
            ..ScanStats::default()
        };
        let mut stack: Vec<usize> = Vec::new();

        for seed in 0..self.blocks.len() {
            if self.blocks[seed].visited {
                continue;
            }
            stack.push(seed);

            while let Some(slot) = stack.pop() {
                if self.blocks[slot].visited {
                    continue;
                }
                self.blocks[slot].visited = true;
                stats.blocks_visited += 1;

                let found = self.blocks[slot].scan(sampler, grey_threshold);
                if !found.is_empty() {
                    stats.blocks_scanned += 1;
                }
                for pt in found {
                    let index = points.len();
                    self.blocks[slot].points.push(index);
                    points.push(ContourPoint::new(pt, index, Some(slot)));
                }

                // Reversed so the first direction in FLOOD_ORDER is popped first.
                for dir in Direction::FLOOD_ORDER.iter().rev() {
                    if let Some(next) = self.neighbor(slot, *dir) {
                        if !self.blocks[next].visited {
                            stack.push(next);
                        }
                    }
                }
            }
        }

        stats.points = points.len();
        debug!(
            "block scan: {} blocks, {} with edges, {} contour points",
            stats.blocks_total, stats.blocks_scanned, stats.points
        );
        (points, stats)
    }
}

/// Number of blocks in a `grid_width x grid_height` grid, counted in `usize`.
fn block_count(grid_width: u32, grid_height: u32) -> usize {
    grid_width as usize * grid_height as usize
}
