//! PBGI Renderer - ray tracing and point-based global illumination.
//!
//! Two drivers share the scene from `pbgi_core`:
//!
//! - [`RayTracer`]: direct lighting, or path tracing with a fixed bounce
//!   count ([`TraceMode`])
//! - [`PointBasedRenderer`]: bakes the scene into a surfel [`PointCloud`],
//!   builds a [`SurfelHierarchy`] over it and gathers light at each visible
//!   point with a [`MicroBuffer`]
//!
//! Images are rendered in parallel buckets and returned as linear RGB
//! [`ImageBuffer`]s.

mod bsh;
mod bucket;
mod micro_buffer;
mod point_based;
mod point_cloud;
mod ray_tracer;
mod renderer;
mod sampling;
mod surfel;

pub use bsh::{BshKind, BshNode, SurfelHierarchy};
pub use bucket::{generate_buckets, render_bucket, render_buckets, Bucket, BucketResult};
pub use micro_buffer::{Cell, MicroBuffer};
pub use point_based::{PointBasedRenderer, GATHER_OFFSET};
pub use point_cloud::PointCloud;
pub use ray_tracer::{shade_direct, RayTracer, TraceMode, SHADOW_EPSILON};
pub use renderer::{clamp_01, color_to_rgba, linear_to_gamma, ImageBuffer, RenderConfig};
pub use sampling::{concentric_disc, cosine_hemisphere, gen_f32, mix_seed, stratified_barycentrics};
pub use surfel::Surfel;

/// Re-export common math and scene types
pub use pbgi_core::{Color, NodeId};
pub use pbgi_math::{Ray, Vec3};
