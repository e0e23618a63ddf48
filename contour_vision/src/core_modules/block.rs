// THEORY:
// The `Block` module represents a fixed-size square tile of the image. It is the
// unit of edge detection and the unit of locality for nearest-neighbor search.
//
// Key architectural principles:
// 1.  **Spatial Pooling**: Instead of searching the whole frame for the next point
//     of a contour, the tracer only looks at the handful of blocks around the
//     current point. The block remembers which contour points were found inside
//     it so that lookup stays cheap.
// 2.  **No Pixel Ownership**: A block only knows its top-left coordinate and size.
//     Pixels are read through the caller's `PixelSampler`, which is passed in.
// 3.  **Edge Test**: A pixel is a contour point when its luminance differs from its
//     left or upper neighbor by more than the grey threshold. The scan covers one
//     extra row and column past the block body so an edge on the boundary with
//     the next block is not missed.

pub mod block {
    use crate::core_modules::line_segment::Point;
    use crate::core_modules::sampler::PixelSampler;

    /// Lookup key of a block: the pixel coordinate of its top-left corner.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BlockKey {
        pub x: i64,
        pub y: i64,
    }

    /// A `size x size` tile of the image plus the contour points found in it.
    #[derive(Debug, Clone)]
    pub struct Block {
        /// Top-left pixel of the tile.
        pub origin: Point,
        /// Edge length of the tile in pixels.
        pub size: u32,
        /// Set once the flood fill has reached this block.
        pub visited: bool,
        /// Cluster indices of the contour points discovered in this block.
        pub points: Vec<usize>,
    }

    impl Block {
        pub fn new(origin: Point, size: u32) -> Self {
            Self {
                origin,
                size,
                visited: false,
                points: Vec::new(),
            }
        }

        pub fn key(&self) -> BlockKey {
            BlockKey {
                x: self.origin.x as i64,
                y: self.origin.y as i64,
            }
        }

        /// Key of the block `dx`, `dy` tiles away from this one.
        pub fn neighbor_key(&self, dx: i64, dy: i64) -> BlockKey {
            let step = self.size as i64;
            BlockKey {
                x: self.origin.x as i64 + dx * step,
                y: self.origin.y as i64 + dy * step,
            }
        }

        /// Number of body pixels brighter than `threshold`.
        pub fn filled_pixels<S: PixelSampler + ?Sized>(&self, sampler: &S, threshold: u8) -> usize {
            let mut filled = 0;
            for y in 0..self.size as i64 {
                for x in 0..self.size as i64 {
                    let px = self.origin.x as i64 + x;
                    let py = self.origin.y as i64 + y;
                    if sampler.contains(px, py) && sampler.luma(px as u32, py as u32) > threshold {
                        filled += 1;
                    }
                }
            }
            filled
        }

        /// Runs the gradient test over the block and returns every pixel that
        /// qualifies as a contour point, in row-major order.
        pub fn scan<S: PixelSampler + ?Sized>(&self, sampler: &S, threshold: u8) -> Vec<Point> {
            let mut found = Vec::new();
            if self.filled_pixels(sampler, threshold) == 0 {
                return found;
            }

            let t = threshold as i16;
            for y in 0..=self.size as i64 {
                for x in 0..=self.size as i64 {
                    let px = self.origin.x as i64 + x;
                    let py = self.origin.y as i64 + y;
                    if !sampler.contains(px, py)
                        || !sampler.contains(px - 1, py)
                        || !sampler.contains(px, py - 1)
                    {
                        continue;
                    }

                    let c = sampler.luma(px as u32, py as u32) as i16;
                    let l = sampler.luma((px - 1) as u32, py as u32) as i16;
                    let u = sampler.luma(px as u32, (py - 1) as u32) as i16;

                    if (l - c).abs() > t || (u - c).abs() > t {
                        found.push(Point::new(px as i32, py as i32));
                    }
                }
            }
            found
        }
    }
}

#[cfg(test)]
mod tests {
    use super::block::*;
    use crate::core_modules::line_segment::Point;
    use image::{GrayImage, Luma};

    fn vertical_edge(width: u32, height: u32, edge_x: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| if x >= edge_x { Luma([255]) } else { Luma([0]) })
    }

    #[test]
    fn dark_block_is_skipped() {
        let img = GrayImage::new(16, 16);
        let block = Block::new(Point::new(0, 0), 8);
        assert_eq!(block.filled_pixels(&img, 32), 0);
        assert!(block.scan(&img, 32).is_empty());
    }

    #[test]
    fn scan_finds_vertical_edge_column() {
        let img = vertical_edge(16, 16, 4);
        let block = Block::new(Point::new(0, 0), 8);
        let points = block.scan(&img, 32);
        // row 0 has no upper neighbor, so rows 1..=8 report the edge at x = 4
        assert_eq!(points.len(), 8);
        assert!(points.iter().all(|p| p.x == 4));
        assert_eq!(points.first(), Some(&Point::new(4, 1)));
        assert_eq!(points.last(), Some(&Point::new(4, 8)));
    }

    #[test]
    fn scan_includes_one_extra_column() {
        // the edge sits on the first column of the right-hand block
        let mut img = vertical_edge(16, 16, 8);
        // one bright corner pixel so the left block passes the fill pre-filter
        img.put_pixel(0, 0, Luma([255]));
        let left = Block::new(Point::new(0, 0), 8);
        let points = left.scan(&img, 32);
        assert_eq!(points.len(), 8);
        assert!(points.iter().all(|p| p.x == 8));
    }

    #[test]
    fn neighbor_keys_step_by_block_size() {
        let block = Block::new(Point::new(16, 8), 8);
        assert_eq!(block.key(), BlockKey { x: 16, y: 8 });
        assert_eq!(block.neighbor_key(-1, 0), BlockKey { x: 8, y: 8 });
        assert_eq!(block.neighbor_key(0, 1), BlockKey { x: 16, y: 16 });
    }
}
