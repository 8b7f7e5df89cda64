//! Geometry primitives shared by the scene description and the renderers.
//!
//! Everything here is plain `Copy` data plus closed-form queries; no
//! allocation and no randomness.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod frame;
mod interval;
mod intersect;
mod ray;
mod sphere;

pub use aabb::Aabb;
pub use frame::Frame;
pub use interval::Interval;
pub use intersect::{intersect_disc, intersect_plane, intersect_triangle, TriangleHit};
pub use ray::Ray;
pub use sphere::BoundingSphere;

/// Component of `v` along axis `n` (0=X, 1=Y, anything else=Z).
#[inline]
pub fn axis_component(v: Vec3, n: usize) -> f32 {
    match n {
        0 => v.x,
        1 => v.y,
        _ => v.z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_component() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(axis_component(v, 0), 1.0);
        assert_eq!(axis_component(v, 1), 2.0);
        assert_eq!(axis_component(v, 2), 3.0);
    }
}
