// THEORY:
// The `pipeline` module is the top-level API of the contour engine. It runs every
// stage for one frame and hands back both representations a caller may want:
// line segments for drawing, and strips for storage.
//
// Stages, in order:
// 1.  **Block Scan**: `BlockIndex` tiles the frame and flood-fills its blocks,
//     collecting contour points where the luminance gradient exceeds the grey
//     threshold.
// 2.  **Tracing**: `line_tracer` walks the `ContourCluster` and emits a chain of
//     segments.
// 3.  **Optimization** (optional): `segment_optimizer` folds collinear runs and
//     drops degenerate segments.
// 4.  **Rescale** (optional): segment endpoints are mapped into a smaller
//     coordinate space.
// 5.  **Strips**: the final segment list is grouped into strips, ready for the
//     `StripCodec`.
//
// Key architectural principles:
// 1.  **Frames Are Independent**: All per-frame state (block visited flags, point
//     used flags) is built and dropped inside `process_frame`. The pipeline only
//     keeps read-only configuration and a frame counter, so a caller may run one
//     pipeline per thread.
// 2.  **Validate Once**: The configuration is checked when the pipeline is built.
//     A frame can still fail at encode time (a strip list too large for the
//     format) and that failure is reported for that frame alone.

use crate::core_modules::block_index::BlockIndex;
use crate::core_modules::contour_cluster::ContourCluster;
use crate::core_modules::error::{ContourError, Result};
use crate::core_modules::line_segment::LineSegment;
use crate::core_modules::line_tracer::{TracerSettings, line_tracer};
use crate::core_modules::sampler::PixelSampler;
use crate::core_modules::segment_optimizer::segment_optimizer;
use crate::core_modules::strip::{Strip, segments_to_strips};
use crate::core_modules::strip_codec::{CoordWidth, StripCodec};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Configuration for the ContourPipeline. Missing JSON fields take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum luminance difference to a neighbor that marks a pixel as an edge.
    /// Blocks whose pixels are all at or below it are skipped.
    pub grey_threshold: u8,
    /// A start point whose nearest candidate is farther than this begins a new
    /// cluster instead of a segment.
    pub cluster_cutoff_distance: f32,
    /// A candidate farther than this from the start closes the segment.
    pub line_cutoff_distance: f32,
    /// Cosine of the largest direction change tolerated in long-line mode.
    pub line_cutoff_angle: f32,
    /// Distance from the start after which the segment direction is fixed.
    pub long_line_distance: f32,
    /// Cosine threshold for merging consecutive segments.
    pub optimization_cutoff_angle: f32,
    /// Side of one square block, in pixels.
    pub block_size: u32,
    pub coord_width: CoordWidth,
    /// Search the block neighborhood first instead of every point.
    pub local_search: bool,
    pub optimize: bool,
    /// Target `(width, height)` to rescale segment endpoints into.
    pub rescale: Option<(u32, u32)>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            grey_threshold: 32,
            cluster_cutoff_distance: 50.0,
            line_cutoff_distance: 10.0,
            line_cutoff_angle: 0.5,
            long_line_distance: 3.0,
            optimization_cutoff_angle: 0.97,
            block_size: 8,
            coord_width: CoordWidth::U16,
            local_search: true,
            optimize: true,
            rescale: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        let distances = [
            ("cluster_cutoff_distance", self.cluster_cutoff_distance),
            ("line_cutoff_distance", self.line_cutoff_distance),
            ("long_line_distance", self.long_line_distance),
        ];
        for (name, value) in distances {
            if !(value.is_finite() && value > 0.0) {
                return Err(ContourError::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }

        let angles = [
            ("line_cutoff_angle", self.line_cutoff_angle),
            ("optimization_cutoff_angle", self.optimization_cutoff_angle),
        ];
        for (name, value) in angles {
            if !(-1.0..=1.0).contains(&value) {
                return Err(ContourError::InvalidConfig(format!(
                    "{name} is a cosine and must lie in [-1, 1], got {value}"
                )));
            }
        }

        if self.block_size == 0 {
            return Err(ContourError::InvalidConfig("block_size must be at least 1".to_string()));
        }
        if let Some((w, h)) = self.rescale {
            if w == 0 || h == 0 {
                return Err(ContourError::InvalidConfig(format!("rescale target {w}x{h} is empty")));
            }
        }
        Ok(())
    }

    pub fn tracer_settings(&self) -> TracerSettings {
        TracerSettings {
            cluster_cutoff_distance: self.cluster_cutoff_distance,
            line_cutoff_distance: self.line_cutoff_distance,
            line_cutoff_angle: self.line_cutoff_angle,
            long_line_distance: self.long_line_distance,
            local_search: self.local_search,
        }
    }
}

/// Counters for one processed frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub blocks_total: usize,
    /// Blocks that produced at least one contour point.
    pub blocks_scanned: usize,
    pub contour_points: usize,
    pub traced_segments: usize,
    /// Segments left after optimization. Equals `traced_segments` when the
    /// optimizer is off.
    pub optimized_segments: usize,
    pub dropped_segments: usize,
    pub strips: usize,
}

/// Everything produced for one frame.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// Final segments, after optimization and rescale.
    pub segments: Vec<LineSegment>,
    pub strips: Vec<Strip>,
    pub stats: FrameStats,
}

/// The frame-level contour engine.
#[derive(Debug)]
pub struct ContourPipeline {
    config: PipelineConfig,
    codec: StripCodec,
    frames_processed: usize,
}

impl ContourPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let codec = StripCodec::new(config.coord_width);
        Ok(Self {
            config,
            codec,
            frames_processed: 0,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn frames_processed(&self) -> usize {
        self.frames_processed
    }

    /// Runs every stage on one frame.
    pub fn process_frame<S: PixelSampler + ?Sized>(&mut self, sampler: &S) -> Result<FrameOutput> {
        let (width, height) = (sampler.width(), sampler.height());
        let mut stats = FrameStats::default();

        // Stage 1: Block Scan
        let mut index = BlockIndex::new(width, height, self.config.block_size)?;
        let (points, scan) = index.extract_contour_points(sampler, self.config.grey_threshold);
        stats.blocks_total = scan.blocks_total;
        stats.blocks_scanned = scan.blocks_scanned;
        stats.contour_points = scan.points;

        // Stage 2: Tracing
        let mut cluster = ContourCluster::from_blocks(points, index);
        let (traced, trace) = line_tracer::extract_segments(&mut cluster, &self.config.tracer_settings());
        stats.traced_segments = traced.len();
        debug!(
            "trace: {} calls, {} splits, {} angle breaks, {} distance breaks, {} full-search fallbacks",
            trace.next_segment_calls, trace.cluster_splits, trace.angle_breaks, trace.distance_breaks, trace.full_search_fallbacks
        );

        // Stage 3: Optimization
        let mut segments = if self.config.optimize {
            let (optimized, opt) =
                segment_optimizer::optimize_segments(&traced, self.config.optimization_cutoff_angle);
            stats.dropped_segments = opt.dropped_short;
            optimized
        } else {
            traced
        };
        stats.optimized_segments = segments.len();

        // Stage 4: Rescale
        if let Some(target) = self.config.rescale {
            segments = segment_optimizer::rescale_segments(&segments, (width, height), target)?;
        }

        // Stage 5: Strips
        let strips = segments_to_strips(&segments);
        stats.strips = strips.len();

        self.frames_processed += 1;
        info!(
            "frame {}: {} points, {} segments traced, {} kept, {} strips",
            self.frames_processed, stats.contour_points, stats.traced_segments, stats.optimized_segments, stats.strips
        );

        Ok(FrameOutput { segments, strips, stats })
    }

    /// Appends the frame's strips to `out` in the configured coordinate width.
    pub fn encode_frame(&self, frame: &FrameOutput, out: &mut Vec<u8>) -> Result<usize> {
        self.codec.encode_frame(&frame.strips, out)
    }

    /// Decodes a stream written by `encode_frame` with the same coordinate width.
    pub fn decode_stream(&self, data: &[u8]) -> Result<Vec<Vec<Strip>>> {
        self.codec.decode_stream(data)
    }
}
