// THEORY:
// The `SegmentOptimizer` shrinks the tracer's output. The tracer tends to cut a
// long straight edge into several short segments; whenever consecutive segments
// are connected end to start and point the same way, the optimizer replaces the
// run with one segment from the first start to the last end.
//
// Key architectural principles:
// 1.  **Continuity First**: Only segments that meet exactly can be merged. A gap
//     always starts a fresh run.
// 2.  **Fixed Reference**: Every candidate in a run is compared against the
//     direction of the run's first segment, not its immediate predecessor, so a
//     slow curve cannot be folded into one long chord.
// 3.  **Uniform Discard**: Any output segment shorter than `MIN_SEGMENT_LENGTH`,
//     merged or not, is dropped. Short segments are a data-quality issue, not an
//     error, and are only logged.
//
// Rescaling lives here too: it maps endpoints into a smaller coordinate space
// (for example to fit 8-bit strip coordinates) and builds new segments.

use crate::core_modules::error::{ContourError, Result};
use crate::core_modules::line_segment::{LineSegment, Point};

/// Segments shorter than this many pixels are dropped.
pub const MIN_SEGMENT_LENGTH: f32 = 2.0;

/// Counters collected while optimizing one segment list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    pub segments_in: usize,
    pub segments_out: usize,
    /// Runs of two or more segments replaced by one.
    pub merged_runs: usize,
    /// Segments dropped for being shorter than `MIN_SEGMENT_LENGTH`.
    pub dropped_short: usize,
}

pub mod segment_optimizer {
    use super::*;
    use log::{debug, info};

    /// Merges runs of connected, nearly collinear segments.
    ///
    /// `cutoff_angle` is a cosine: two directions are collinear enough when their
    /// normalized dot product exceeds it.
    pub fn optimize_segments(segments: &[LineSegment], cutoff_angle: f32) -> (Vec<LineSegment>, OptimizeStats) {
        let mut stats = OptimizeStats {
            segments_in: segments.len(),
            ..OptimizeStats::default()
        };
        let mut optimized = Vec::with_capacity(segments.len());

        let mut i = 0;
        while i < segments.len() {
            let first = &segments[i];
            let reference = first.direction().normalized();
            let mut last = i;

            if let Some(reference) = reference {
                while last + 1 < segments.len() && segments[last].connects_to(&segments[last + 1]) {
                    let aligned = segments[last + 1]
                        .direction()
                        .normalized()
                        .is_some_and(|dir| reference.dot(&dir) > cutoff_angle);
                    if !aligned {
                        break;
                    }
                    last += 1;
                }
            }

            let candidate = if last > i {
                debug!("merged segments {i}..={last}");
                stats.merged_runs += 1;
                LineSegment::new(first.start, segments[last].end)
            } else {
                *first
            };

            if candidate.length() < MIN_SEGMENT_LENGTH {
                debug!(
                    "dropping short segment ({},{})-({},{}), length {:.2}",
                    candidate.start.x,
                    candidate.start.y,
                    candidate.end.x,
                    candidate.end.y,
                    candidate.length()
                );
                stats.dropped_short += 1;
            } else {
                optimized.push(candidate);
            }
            i = last + 1;
        }

        stats.segments_out = optimized.len();
        info!("optimization, segments before: {}, after: {}", stats.segments_in, stats.segments_out);
        (optimized, stats)
    }

    /// Maps every endpoint from a `from` sized image into a `to` sized one.
    ///
    /// Coordinates are scaled by `to / from` and truncated. The result carries no
    /// cluster indices.
    pub fn rescale_segments(segments: &[LineSegment], from: (u32, u32), to: (u32, u32)) -> Result<Vec<LineSegment>> {
        if from.0 == 0 || from.1 == 0 {
            return Err(ContourError::InvalidConfig(format!(
                "cannot rescale from an empty {}x{} image",
                from.0, from.1
            )));
        }
        let scale = |p: Point| {
            Point::new(
                (p.x as i64 * to.0 as i64 / from.0 as i64) as i32,
                (p.y as i64 * to.1 as i64 / from.1 as i64) as i32,
            )
        };
        Ok(segments
            .iter()
            .map(|ls| LineSegment::new(scale(ls.start), scale(ls.end)))
            .collect())
    }
}
