//! Closed-form ray/primitive intersection routines.

use crate::{Ray, Vec3};

/// Determinant magnitude below which a ray counts as parallel to a triangle.
const PARALLEL_EPSILON: f32 = 1e-8;

/// Hits closer than this are treated as self-intersections and rejected.
const MIN_HIT_DISTANCE: f32 = 1e-4;

/// Result of a ray/triangle test.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TriangleHit {
    /// Ray parameter of the hit.
    pub t: f32,
    /// Weight of the second vertex.
    pub u: f32,
    /// Weight of the third vertex.
    pub v: f32,
}

impl TriangleHit {
    /// Barycentric weights of the three vertices, summing to one.
    pub fn barycentric(&self) -> Vec3 {
        Vec3::new(1.0 - self.u - self.v, self.u, self.v)
    }
}

/// Möller-Trumbore ray/triangle intersection.
pub fn intersect_triangle(ray: &Ray, triangle: [Vec3; 3]) -> Option<TriangleHit> {
    let [v0, v1, v2] = triangle;
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < PARALLEL_EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t.is_nan() || t <= MIN_HIT_DISTANCE {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Ray parameter where the ray crosses the plane through `point` with
/// normal `normal`, if it does so in front of the origin.
pub fn intersect_plane(ray: &Ray, point: Vec3, normal: Vec3) -> Option<f32> {
    let denom = ray.direction.dot(normal);
    if denom.abs() <= 1e-6 {
        return None;
    }
    let t = (point - ray.origin).dot(normal) / denom;
    (t >= 0.0).then_some(t)
}

/// Ray parameter of the hit with a disc (surfel) of the given radius.
pub fn intersect_disc(ray: &Ray, center: Vec3, normal: Vec3, radius: f32) -> Option<f32> {
    let t = intersect_plane(ray, center, normal)?;
    ((ray.at(t) - center).length_squared() <= radius * radius).then_some(t)
}
