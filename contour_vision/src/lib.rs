// THEORY:
// This file is the main entry point for the `contour_vision` library crate.
// It exposes two layers:
//
// - `pipeline`: the frame-level API. A caller hands `ContourPipeline` a pixel
//   sampler and receives line segments and strips, or an encoded strip stream.
// - `core_modules`: every stage of the pipeline (block index, contour cluster,
//   line tracer, segment optimizer, strip codec) for callers that want to run
//   or test a stage on its own.
//
// The crate never decodes image files or touches the filesystem; the
// `contour_tester` binary does that plumbing.

pub mod core_modules;
pub mod pipeline;

pub use core_modules::error::{ContourError, Result};
pub use core_modules::line_segment::{LineSegment, Point};
pub use core_modules::sampler::{PixelSampler, RgbaFrame};
pub use core_modules::strip::Strip;
pub use core_modules::strip_codec::CoordWidth;
pub use pipeline::{ContourPipeline, FrameOutput, FrameStats, PipelineConfig};
