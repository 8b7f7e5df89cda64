//! PBGI Core - scene description for the ray tracer and point-based renderer.
//!
//! This crate provides:
//!
//! - **Geometry**: `Mesh` with per-vertex normals and a `quad` primitive
//! - **Shading inputs**: `Material` (GGX / emissive), `LightSource`, `Camera`
//! - **Visibility**: the per-mesh triangle BVH and the `Scene` that owns it
//!
//! # Example
//!
//! ```ignore
//! use pbgi_core::{Camera, Material, Mesh, Scene};
//! use pbgi_math::Vec3;
//!
//! let mut scene = Scene::new(Camera::default());
//! scene.add_mesh(Mesh::quad(Vec3::ZERO, Vec3::Y, Vec3::X, 1.0, Material::diffuse(Vec3::ONE)))?;
//! scene.build_bvh();
//! ```

pub mod bvh;
pub mod camera;
pub mod error;
pub mod light;
pub mod material;
pub mod mesh;
pub mod scene;

// Re-export commonly used types
pub use bvh::{median_split, BvhNode, MeshHit, NodeId, SceneBvh, TriangleBvh};
pub use camera::Camera;
pub use error::{SceneError, SceneResult};
pub use light::LightSource;
pub use material::{Color, Material};
pub use mesh::Mesh;
pub use scene::{Scene, SceneHit};
