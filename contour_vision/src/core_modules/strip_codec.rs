// THEORY:
// The `StripCodec` is the storage format of a traced frame. Frames are written
// back to back with no outer header, so a file of frames plays back by decoding
// until the stream runs out.
//
// Frame layout:
//
//     u8 strip_count
//     strip_count times:
//         u8 point_count
//         point_count times: x, y   (u8 each, or u16 little-endian each)
//
// Key architectural principles:
// 1.  **Strategy Chosen Once**: The coordinate width is picked when the codec is
//     built. Each width is a `CoordinateCodec` implementation; the frame logic
//     never branches on width per point.
// 2.  **Frame-Level Failure**: A frame that does not fit the format (too many
//     strips, too many points, a coordinate out of range) fails as a whole and
//     writes nothing, so the stream stays decodable.
// 3.  **Clean End**: Running out of bytes where a frame would start is the normal
//     end of the stream. Running out inside a frame is `TruncatedStream`.
//
// The `legacy` module reads and writes the older fixed-record format: four
// signed 16-bit little-endian values per segment, no header.

use crate::core_modules::error::{ContourError, Result};
use crate::core_modules::line_segment::Point;
use crate::core_modules::strip::{MAX_STRIP_POINTS, Strip};
use serde::{Deserialize, Serialize};

/// Largest number of strips a frame can hold (its count is one byte).
pub const MAX_FRAME_STRIPS: usize = 255;

/// Width of each stored coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CoordWidth {
    U8,
    U16,
}

impl CoordWidth {
    pub fn bits(self) -> u8 {
        match self {
            CoordWidth::U8 => 8,
            CoordWidth::U16 => 16,
        }
    }

    /// Largest coordinate this width can store.
    pub fn max_value(self) -> i32 {
        match self {
            CoordWidth::U8 => u8::MAX as i32,
            CoordWidth::U16 => u16::MAX as i32,
        }
    }
}

impl TryFrom<u8> for CoordWidth {
    type Error = ContourError;

    fn try_from(bits: u8) -> Result<Self> {
        match bits {
            8 => Ok(CoordWidth::U8),
            16 => Ok(CoordWidth::U16),
            other => Err(ContourError::UnsupportedCoordinateWidth(other)),
        }
    }
}

impl From<CoordWidth> for u8 {
    fn from(width: CoordWidth) -> u8 {
        width.bits()
    }
}

/// A forward-only reader over an encoded byte stream.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    pub fn read_u16_le(&mut self) -> Option<u16> {
        let bytes = self.data.get(self.pos..self.pos + 2)?;
        self.pos += 2;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_i16_le(&mut self) -> Option<i16> {
        self.read_u16_le().map(|v| v as i16)
    }

    fn truncated(&self) -> ContourError {
        ContourError::TruncatedStream { offset: self.pos }
    }
}

/// Reads and writes a single coordinate value.
pub trait CoordinateCodec: std::fmt::Debug + Send + Sync {
    fn width(&self) -> CoordWidth;

    fn write_coord(&self, value: i32, out: &mut Vec<u8>) -> Result<()>;

    /// `None` when the stream ends before a whole coordinate.
    fn read_coord(&self, reader: &mut ByteReader<'_>) -> Option<i32>;

    fn check_range(&self, value: i32) -> Result<()> {
        let width = self.width();
        if value < 0 || value > width.max_value() {
            return Err(ContourError::CoordinateOutOfRange {
                value,
                bits: width.bits(),
            });
        }
        Ok(())
    }
}

/// One unsigned byte per coordinate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCoords;

impl CoordinateCodec for ByteCoords {
    fn width(&self) -> CoordWidth {
        CoordWidth::U8
    }

    fn write_coord(&self, value: i32, out: &mut Vec<u8>) -> Result<()> {
        self.check_range(value)?;
        out.push(value as u8);
        Ok(())
    }

    fn read_coord(&self, reader: &mut ByteReader<'_>) -> Option<i32> {
        reader.read_u8().map(i32::from)
    }
}

/// One unsigned little-endian 16-bit word per coordinate.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCoords;

impl CoordinateCodec for WordCoords {
    fn width(&self) -> CoordWidth {
        CoordWidth::U16
    }

    fn write_coord(&self, value: i32, out: &mut Vec<u8>) -> Result<()> {
        self.check_range(value)?;
        out.extend_from_slice(&(value as u16).to_le_bytes());
        Ok(())
    }

    fn read_coord(&self, reader: &mut ByteReader<'_>) -> Option<i32> {
        reader.read_u16_le().map(i32::from)
    }
}

/// Encodes and decodes frames of strips with a fixed coordinate width.
#[derive(Debug)]
pub struct StripCodec {
    coords: Box<dyn CoordinateCodec>,
}

impl StripCodec {
    pub fn new(width: CoordWidth) -> Self {
        let coords: Box<dyn CoordinateCodec> = match width {
            CoordWidth::U8 => Box::new(ByteCoords),
            CoordWidth::U16 => Box::new(WordCoords),
        };
        Self { coords }
    }

    /// Appends one frame to `out`. On error nothing is appended.
    pub fn encode_frame(&self, strips: &[Strip], out: &mut Vec<u8>) -> Result<usize> {
        if strips.len() > MAX_FRAME_STRIPS {
            return Err(ContourError::TooManyStrips(strips.len()));
        }

        let mut frame = Vec::new();
        frame.push(strips.len() as u8);
        for (i, strip) in strips.iter().enumerate() {
            if strip.len() > MAX_STRIP_POINTS {
                return Err(ContourError::TooManyPoints {
                    strip: i,
                    points: strip.len(),
                });
            }
            if strip.len() < 2 {
                return Err(ContourError::StripTooShort {
                    strip: i,
                    points: strip.len(),
                });
            }
            frame.push(strip.len() as u8);
            for pt in &strip.points {
                self.coords.write_coord(pt.x, &mut frame)?;
                self.coords.write_coord(pt.y, &mut frame)?;
            }
        }

        out.extend_from_slice(&frame);
        Ok(frame.len())
    }

    /// Reads the next frame, or `None` when the stream ends at a frame boundary.
    pub fn decode_frame(&self, reader: &mut ByteReader<'_>) -> Result<Option<Vec<Strip>>> {
        let Some(strip_count) = reader.read_u8() else {
            return Ok(None);
        };

        let mut strips = Vec::with_capacity(strip_count as usize);
        for _ in 0..strip_count {
            let point_count = reader.read_u8().ok_or_else(|| reader.truncated())?;
            let mut points = Vec::with_capacity(point_count as usize);
            for _ in 0..point_count {
                let x = self.coords.read_coord(reader).ok_or_else(|| reader.truncated())?;
                let y = self.coords.read_coord(reader).ok_or_else(|| reader.truncated())?;
                points.push(Point::new(x, y));
            }
            strips.push(Strip::new(points));
        }
        Ok(Some(strips))
    }

    /// Decodes every frame in `data`.
    pub fn decode_stream(&self, data: &[u8]) -> Result<Vec<Vec<Strip>>> {
        let mut reader = ByteReader::new(data);
        let mut frames = Vec::new();
        while let Some(frame) = self.decode_frame(&mut reader)? {
            frames.push(frame);
        }
        Ok(frames)
    }
}

pub mod legacy {
    use super::*;
    use crate::core_modules::line_segment::LineSegment;

    /// Bytes per stored segment: x1, y1, x2, y2 as i16.
    pub const RECORD_SIZE: usize = 8;

    pub fn encode_segments(segments: &[LineSegment]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(segments.len() * RECORD_SIZE);
        for ls in segments {
            for value in [ls.start.x, ls.start.y, ls.end.x, ls.end.y] {
                let word = i16::try_from(value).map_err(|_| ContourError::CoordinateOutOfRange { value, bits: 16 })?;
                out.extend_from_slice(&word.to_le_bytes());
            }
        }
        Ok(out)
    }

    pub fn decode_segments(data: &[u8]) -> Result<Vec<LineSegment>> {
        let mut reader = ByteReader::new(data);
        let mut segments = Vec::with_capacity(data.len() / RECORD_SIZE);
        while !reader.is_at_end() {
            let mut values = [0i32; 4];
            for v in &mut values {
                *v = reader.read_i16_le().ok_or_else(|| reader.truncated())? as i32;
            }
            segments.push(LineSegment::new(
                Point::new(values[0], values[1]),
                Point::new(values[2], values[3]),
            ));
        }
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::line_segment::LineSegment;
    use crate::core_modules::strip::segments_to_strips;

    fn strip(raw: &[(i32, i32)]) -> Strip {
        Strip::new(raw.iter().copied().map(Point::from).collect())
    }

    #[test]
    fn byte_frame_layout() {
        let codec = StripCodec::new(CoordWidth::U8);
        let mut out = Vec::new();
        let written = codec
            .encode_frame(&[strip(&[(1, 2), (3, 4)]), strip(&[(250, 0), (0, 255), (7, 7)])], &mut out)
            .expect("frame fits");
        assert_eq!(out, vec![2, 2, 1, 2, 3, 4, 3, 250, 0, 0, 255, 7, 7]);
        assert_eq!(written, out.len());
    }

    #[test]
    fn word_frame_is_little_endian() {
        let codec = StripCodec::new(CoordWidth::U16);
        let mut out = Vec::new();
        codec
            .encode_frame(&[strip(&[(0x0102, 3), (65535, 256)])], &mut out)
            .expect("frame fits");
        assert_eq!(out, vec![1, 2, 0x02, 0x01, 3, 0, 0xFF, 0xFF, 0x00, 0x01]);
    }

    #[test]
    fn frames_round_trip_in_both_widths() {
        let frame = vec![strip(&[(0, 0), (255, 255), (17, 200)]), strip(&[(9, 8), (7, 6)])];
        for width in [CoordWidth::U8, CoordWidth::U16] {
            let codec = StripCodec::new(width);
            let mut out = Vec::new();
            codec.encode_frame(&frame, &mut out).expect("frame fits");
            let decoded = codec.decode_stream(&out).expect("well formed");
            assert_eq!(decoded, vec![frame.clone()]);
        }
    }

    #[test]
    fn concatenated_frames_decode_until_end_of_stream() {
        let codec = StripCodec::new(CoordWidth::U8);
        let first = vec![strip(&[(1, 1), (2, 2)])];
        let second = vec![strip(&[(5, 5), (6, 6), (7, 7)]), strip(&[(9, 9), (10, 10)])];
        let mut out = Vec::new();
        codec.encode_frame(&first, &mut out).expect("frame fits");
        codec.encode_frame(&[], &mut out).expect("empty frame fits");
        codec.encode_frame(&second, &mut out).expect("frame fits");

        let frames = codec.decode_stream(&out).expect("well formed");
        assert_eq!(frames, vec![first, vec![], second]);
    }

    #[test]
    fn empty_stream_has_no_frames() {
        let codec = StripCodec::new(CoordWidth::U16);
        assert!(codec.decode_stream(&[]).expect("empty is fine").is_empty());
    }

    #[test]
    fn truncation_inside_a_frame_is_an_error() {
        let codec = StripCodec::new(CoordWidth::U16);
        let mut out = Vec::new();
        codec.encode_frame(&[strip(&[(1, 2), (3, 4)])], &mut out).expect("frame fits");
        out.pop();
        assert!(matches!(
            codec.decode_stream(&out),
            Err(ContourError::TruncatedStream { .. })
        ));
    }

    #[test]
    fn too_many_strips_fails_without_writing() {
        let codec = StripCodec::new(CoordWidth::U8);
        let strips = vec![strip(&[(0, 0), (1, 1)]); 256];
        let mut out = vec![42];
        assert_eq!(codec.encode_frame(&strips, &mut out), Err(ContourError::TooManyStrips(256)));
        assert_eq!(out, vec![42]);
    }

    #[test]
    fn oversized_strip_is_rejected() {
        let codec = StripCodec::new(CoordWidth::U16);
        let long = Strip::new((0..256).map(|i| Point::new(i, 0)).collect());
        let mut out = Vec::new();
        assert_eq!(
            codec.encode_frame(&[long], &mut out),
            Err(ContourError::TooManyPoints { strip: 0, points: 256 })
        );
        assert!(out.is_empty());
    }

    #[test]
    fn single_point_strip_is_rejected() {
        let codec = StripCodec::new(CoordWidth::U8);
        let mut out = Vec::new();
        assert_eq!(
            codec.encode_frame(&[strip(&[(3, 3)])], &mut out),
            Err(ContourError::StripTooShort { strip: 0, points: 1 })
        );
    }

    #[test]
    fn coordinates_must_fit_the_width() {
        let codec = StripCodec::new(CoordWidth::U8);
        let mut out = Vec::new();
        assert_eq!(
            codec.encode_frame(&[strip(&[(0, 0), (256, 3)])], &mut out),
            Err(ContourError::CoordinateOutOfRange { value: 256, bits: 8 })
        );
        assert_eq!(
            codec.encode_frame(&[strip(&[(0, -1), (2, 3)])], &mut out),
            Err(ContourError::CoordinateOutOfRange { value: -1, bits: 8 })
        );
        assert!(out.is_empty());
    }

    #[test]
    fn width_parses_from_bit_count() {
        assert_eq!(CoordWidth::try_from(8), Ok(CoordWidth::U8));
        assert_eq!(CoordWidth::try_from(16), Ok(CoordWidth::U16));
        assert_eq!(CoordWidth::try_from(12), Err(ContourError::UnsupportedCoordinateWidth(12)));
        assert_eq!(u8::from(CoordWidth::U16), 16);
    }

    #[test]
    fn legacy_records_round_trip_signed_values() {
        let segments = vec![
            LineSegment::new(Point::new(0, 0), Point::new(959, 719)),
            LineSegment::new(Point::new(-4, 3), Point::new(12, -1)),
        ];
        let bytes = legacy::encode_segments(&segments).expect("values fit in i16");
        assert_eq!(bytes.len(), 2 * legacy::RECORD_SIZE);
        assert_eq!(&bytes[..8], &[0, 0, 0, 0, 0xBF, 0x03, 0xCF, 0x02]);
        assert_eq!(legacy::decode_segments(&bytes).expect("whole records"), segments);
    }

    #[test]
    fn legacy_partial_record_is_truncated() {
        let bytes = [1, 0, 2, 0, 3];
        assert!(matches!(
            legacy::decode_segments(&bytes),
            Err(ContourError::TruncatedStream { .. })
        ));
    }

    #[test]
    fn legacy_rejects_values_outside_i16() {
        let segments = [LineSegment::new(Point::new(40_000, 0), Point::new(0, 0))];
        assert_eq!(
            legacy::encode_segments(&segments),
            Err(ContourError::CoordinateOutOfRange { value: 40_000, bits: 16 })
        );
    }

    #[test]
    fn long_run_survives_encoding_split_in_two_strips() {
        // 256 points joined by 255 segments, all inside the 8-bit range
        let points: Vec<Point> = (0..256).map(|i| Point::new(i, (i * 7) % 200)).collect();
        let segments: Vec<LineSegment> = points.windows(2).map(|w| LineSegment::new(w[0], w[1])).collect();
        let strips = segments_to_strips(&segments);

        let codec = StripCodec::new(CoordWidth::U8);
        let mut out = Vec::new();
        codec.encode_frame(&strips, &mut out).expect("both strips fit");
        let frames = codec.decode_stream(&out).expect("well formed");

        assert_eq!(frames.len(), 1);
        let decoded = &frames[0];
        assert_eq!(decoded.iter().map(Strip::len).collect::<Vec<_>>(), vec![MAX_STRIP_POINTS, 2]);
        // the seam point closes the first strip and opens the second
        assert_eq!(decoded[0].points.last(), decoded[1].points.first());

        let mut joined = decoded[0].points.clone();
        joined.extend_from_slice(&decoded[1].points[1..]);
        assert_eq!(joined, points);
    }

    #[test]
    fn full_strip_encodes_at_the_count_limit() {
        let full = Strip::new((0..MAX_STRIP_POINTS as i32).map(|i| Point::new(i, 255 - i)).collect());
        let codec = StripCodec::new(CoordWidth::U16);
        let mut out = Vec::new();
        let written = codec.encode_frame(std::slice::from_ref(&full), &mut out).expect("255 points fit");
        assert_eq!(written, 2 + MAX_STRIP_POINTS * 4);
        assert_eq!(out[1], 255);
        assert_eq!(codec.decode_stream(&out).expect("well formed"), vec![vec![full]]);
    }
}
