use image::{GrayImage, Luma};

/// Axis-aligned rectangle, `x0..x1` by `y0..y1` (exclusive upper bounds).
#[derive(Debug, Clone, Copy)]
pub struct Rect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Rect {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.x0..self.x1).contains(&x) && (self.y0..self.y1).contains(&y)
    }

    /// True when `(x, y)` lies on one of the pixel rows or columns where the
    /// luminance steps across the rectangle border.
    pub fn on_border(&self, x: i32, y: i32) -> bool {
        let (x0, y0, x1, y1) = (self.x0 as i32, self.y0 as i32, self.x1 as i32, self.y1 as i32);
        let vertical = (x == x0 || x == x1) && (y0..y1).contains(&y);
        let horizontal = (y == y0 || y == y1) && (x0..x1).contains(&x);
        vertical || horizontal
    }
}

/// Bright rectangles on a black background.
pub fn rectangles(width: u32, height: u32, rects: &[Rect]) -> GrayImage {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    GrayImage::from_fn(width, height, |x, y| {
        if rects.iter().any(|r| r.contains(x, y)) {
            Luma([220u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Expands a greyscale image into an RGBA8 buffer with equal color channels.
pub fn grey_to_rgba(img: &GrayImage) -> Vec<u8> {
    img.pixels().flat_map(|p| [p.0[0], p.0[0], p.0[0], 255]).collect()
}

/// Generates a simple high-contrast checkerboard image.
pub fn checkerboard(width: u32, height: u32, cell: u32) -> GrayImage {
    assert!(cell > 0, "cell size must be positive");
    GrayImage::from_fn(width, height, |x, y| {
        if ((x / cell) + (y / cell)) & 1 == 0 {
            Luma([32u8])
        } else {
            Luma([220u8])
        }
    })
}
