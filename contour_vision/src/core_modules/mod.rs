pub mod block;
pub mod block_index;
pub mod contour_cluster;
pub mod error;
pub mod line_segment;
pub mod line_tracer;
pub mod sampler;
pub mod segment_optimizer;
pub mod strip;
pub mod strip_codec;
pub mod vec2;
