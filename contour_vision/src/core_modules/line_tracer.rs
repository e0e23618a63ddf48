// THEORY:
// The `LineTracer` is the engine of the vectorization layer. It turns the
// unordered cloud of contour points into an ordered chain of line segments by
// walking from point to point in nearest-neighbor order.
//
// Algorithm for one segment (`next_segment`):
// 1.  **Rank Candidates**: Measure the distance from the start point to every
//     unused candidate (local block neighborhood, or the whole cluster) and sort
//     them nearest first. Fewer than two candidates means the cluster is used up.
// 2.  **Cluster Split**: If even the nearest candidate is farther than
//     `cluster_cutoff_distance`, the start point is an isolated end. The candidate
//     is consumed and tracing restarts from it, so a segment never bridges two
//     separate regions.
// 3.  **Accumulate**: Candidates are consumed one by one. Until the walk has gone
//     `long_line_distance` away from the start it does not trust any direction,
//     which keeps thick or noisy edges from producing a corner on every pixel.
// 4.  **Long-Line Mode**: Past that distance the direction from the start to the
//     current candidate is frozen as the reference. Every later candidate whose
//     direction deviates so far that the dot product drops under
//     `line_cutoff_angle` closes the segment at the previous candidate. A
//     candidate farther than `line_cutoff_distance` closes it as well.
// 5.  **Out of Range**: If every candidate was consumed without a break, the
//     segment ends at the last consumed point.
//
// `extract_segments` chains these calls: each segment's end point is where the
// next one starts.

use crate::core_modules::contour_cluster::{ContourCluster, PointDistance};
use crate::core_modules::line_segment::LineSegment;
use crate::core_modules::vec2::vec2::Vec2;

/// A local search that finds this many candidates or fewer is not trusted and
/// the full cluster is searched instead.
pub const LOCAL_SEARCH_MIN_CANDIDATES: usize = 4;

/// Thresholds that steer the tracer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracerSettings {
    pub cluster_cutoff_distance: f32,
    pub line_cutoff_distance: f32,
    /// Cosine of the largest deviation allowed in long-line mode.
    pub line_cutoff_angle: f32,
    pub long_line_distance: f32,
    pub local_search: bool,
}

/// Counters collected while tracing one cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceStats {
    pub next_segment_calls: usize,
    pub segments: usize,
    pub points_consumed: usize,
    pub cluster_splits: usize,
    pub angle_breaks: usize,
    pub distance_breaks: usize,
    pub range_ends: usize,
    pub local_searches: usize,
    pub full_search_fallbacks: usize,
}

pub mod line_tracer {
    use super::*;
    use log::debug;

    /// Traces the whole cluster starting at point 0.
    ///
    /// Clusters with fewer than two points produce no segments. At most
    /// `cluster.len()` calls to `next_segment` are made.
    pub fn extract_segments(cluster: &mut ContourCluster, settings: &TracerSettings) -> (Vec<LineSegment>, TraceStats) {
        let mut stats = TraceStats::default();
        let mut segments = Vec::new();

        if cluster.len() < 2 {
            debug!("cluster has {} points, nothing to trace", cluster.len());
            return (segments, stats);
        }

        let mut idx_start = 0;
        for _ in 0..cluster.len() {
            let Some((ls, idx_end)) = next_segment(cluster, idx_start, settings, &mut stats) else {
                debug!("next segment exhausted the cluster");
                break;
            };
            segments.push(ls);
            idx_start = idx_end;
        }

        stats.segments = segments.len();
        (segments, stats)
    }

    /// Produces the next segment starting at `idx_start`, or `None` once fewer
    /// than two unused candidates are left.
    ///
    /// Returns the segment together with the cluster index of its end point.
    pub fn next_segment(
        cluster: &mut ContourCluster,
        idx_start: usize,
        settings: &TracerSettings,
        stats: &mut TraceStats,
    ) -> Option<(LineSegment, usize)> {
        stats.next_segment_calls += 1;
        let mut start = idx_start;

        'restart: loop {
            let mut candidates = rank_candidates(cluster, start, settings, stats);
            if candidates.len() < 2 {
                debug!("too few points left around {start}: {}", candidates.len());
                return None;
            }
            // sort_by is stable, so equal distances keep search order
            candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));

            let mut long_line_mode = false;
            let mut v_prev = Vec2::default();
            let mut dp = 0.0f32;
            let mut previous: Option<usize> = None;

            for pd in &candidates {
                if previous.is_none() && pd.distance > settings.cluster_cutoff_distance {
                    debug!("new cluster at {} (distance {:.2}), restarting", pd.index, pd.distance);
                    cluster.mark_used(pd.index);
                    stats.points_consumed += 1;
                    stats.cluster_splits += 1;
                    start = pd.index;
                    continue 'restart;
                }

                if long_line_mode {
                    dp = match cluster.vector(start, pd.index).normalized() {
                        Some(v_current) => v_prev.dot(&v_current),
                        None => 1.0,
                    };
                }

                if let Some(prev) = previous {
                    if long_line_mode && dp < settings.line_cutoff_angle {
                        debug!("angle cutoff: {start} -> {prev}, dist {:.2}, dp {dp:.3}", pd.distance);
                        stats.angle_breaks += 1;
                        return Some((cluster.segment(start, prev), prev));
                    }
                    if pd.distance > settings.line_cutoff_distance {
                        debug!("distance cutoff: {start} -> {prev}, dist {:.2}", pd.distance);
                        stats.distance_breaks += 1;
                        return Some((cluster.segment(start, prev), prev));
                    }
                }

                if !long_line_mode && pd.distance > settings.long_line_distance {
                    if let Some(v) = cluster.vector(start, pd.index).normalized() {
                        long_line_mode = true;
                        v_prev = v;
                    }
                }

                cluster.mark_used(pd.index);
                stats.points_consumed += 1;
                previous = Some(pd.index);
            }

            let prev = previous?;
            debug!("out of range: {start} -> {prev}, {} candidates", candidates.len());
            stats.range_ends += 1;
            return Some((cluster.segment(start, prev), prev));
        }
    }

    /// Unsorted candidates for `origin`, from the local neighborhood when it is
    /// enabled and dense enough, otherwise from the whole cluster.
    fn rank_candidates(
        cluster: &ContourCluster,
        origin: usize,
        settings: &TracerSettings,
        stats: &mut TraceStats,
    ) -> Vec<PointDistance> {
        if settings.local_search {
            if let Some(local) = cluster.local_search(origin) {
                stats.local_searches += 1;
                if local.len() > LOCAL_SEARCH_MIN_CANDIDATES {
                    return local;
                }
                stats.full_search_fallbacks += 1;
            }
        }
        cluster.full_search(origin)
    }
}
