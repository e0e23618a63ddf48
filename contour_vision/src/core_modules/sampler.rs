// THEORY:
// The `PixelSampler` is the only way the pipeline sees an image. The caller owns
// the pixels; the pipeline asks for one greyscale value at a time and never
// writes back. This keeps PNG decoding, video capture and every other source of
// pixels outside the core.
//
// Two samplers ship with the crate:
// - `image::GrayImage`, for callers that already decoded to 8-bit luma.
// - `RgbaFrame`, a borrowed RGBA8 frame buffer (the layout video frames arrive
//   in). Its luminance is the Rec. 601 luma of each pixel, computed on demand.

use crate::core_modules::error::{ContourError, Result};
use image::GrayImage;

const CHANNELS: usize = 4;

/// Read-only access to the greyscale luminance of a rectangular image.
pub trait PixelSampler {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Luminance at `(x, y)`. Callers guarantee the coordinate is inside the image.
    fn luma(&self, x: u32, y: u32) -> u8;

    /// True when `(x, y)` lies inside the image.
    fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64
    }
}

impl PixelSampler for GrayImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn luma(&self, x: u32, y: u32) -> u8 {
        self.get_pixel(x, y).0[0]
    }
}

/// A borrowed RGBA8 frame, sampled as Rec. 601 luma.
#[derive(Debug, Clone, Copy)]
pub struct RgbaFrame<'a> {
    width: u32,
    height: u32,
    data: &'a [u8],
}

impl<'a> RgbaFrame<'a> {
    pub fn new(width: u32, height: u32, data: &'a [u8]) -> Result<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(ContourError::FrameSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }
}

impl PixelSampler for RgbaFrame<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn luma(&self, x: u32, y: u32) -> u8 {
        let offset = (y as usize * self.width as usize + x as usize) * CHANNELS;
        let px = &self.data[offset..offset + 3];
        let luminance = 0.299_f64 * px[0] as f64 + 0.587_f64 * px[1] as f64 + 0.114_f64 * px[2] as f64;
        luminance.round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn grey_image_samples_its_own_values() {
        let mut img = GrayImage::new(4, 3);
        img.put_pixel(2, 1, Luma([200]));
        assert_eq!(img.luma(2, 1), 200);
        assert_eq!(img.luma(0, 0), 0);
        assert_eq!(PixelSampler::width(&img), 4);
        assert_eq!(PixelSampler::height(&img), 3);
    }

    #[test]
    fn rgba_frame_uses_rec601_weights() {
        // white, pure red, pure green, pure blue
        let data = [
            255, 255, 255, 255, //
            255, 0, 0, 255, //
            0, 255, 0, 255, //
            0, 0, 255, 255,
        ];
        let frame = RgbaFrame::new(4, 1, &data).expect("valid frame");
        assert_eq!(frame.luma(0, 0), 255);
        assert_eq!(frame.luma(1, 0), 76);
        assert_eq!(frame.luma(2, 0), 150);
        assert_eq!(frame.luma(3, 0), 29);
    }

    #[test]
    fn rgba_frame_rejects_wrong_length() {
        let data = vec![0u8; 10];
        let err = RgbaFrame::new(2, 2, &data).unwrap_err();
        assert_eq!(
            err,
            ContourError::FrameSizeMismatch {
                expected: 16,
                actual: 10
            }
        );
    }

    #[test]
    fn contains_checks_all_edges() {
        let img = GrayImage::new(3, 2);
        assert!(img.contains(0, 0));
        assert!(img.contains(2, 1));
        assert!(!img.contains(-1, 0));
        assert!(!img.contains(0, -1));
        assert!(!img.contains(3, 0));
        assert!(!img.contains(0, 2));
    }
}
