// THEORY:
// Every stage of the contour pipeline reports failure through a single typed
// error. A frame that cannot be encoded (too many strips, a strip that outgrew
// its count byte) is a per-frame failure, so the orchestrator can log it and move
// on to the next frame instead of losing the whole batch.
//
// Conditions that are part of normal operation are NOT errors:
// - an exhausted cluster ends tracing (`next_segment` returns `None`),
// - a degenerate segment is dropped by the optimizer and only logged,
// - end-of-stream at a frame boundary ends decoding.

use thiserror::Error;

/// Errors produced by the contour-to-vector pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ContourError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unsupported coordinate width: {0} bits (expected 8 or 16)")]
    UnsupportedCoordinateWidth(u8),

    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    FrameSizeMismatch { expected: usize, actual: usize },

    #[error("frame has {0} strips, at most 255 fit in the count byte")]
    TooManyStrips(usize),

    #[error("strip {strip} has {points} points, at most 255 fit in the count byte")]
    TooManyPoints { strip: usize, points: usize },

    #[error("strip {strip} has {points} points, a strip needs at least 2")]
    StripTooShort { strip: usize, points: usize },

    #[error("coordinate {value} does not fit in a {bits}-bit field")]
    CoordinateOutOfRange { value: i32, bits: u8 },

    #[error("stream ended inside a record at byte {offset}")]
    TruncatedStream { offset: usize },
}

pub type Result<T> = std::result::Result<T, ContourError>;
