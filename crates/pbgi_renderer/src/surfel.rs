//! Disc-shaped surface samples.

use pbgi_core::Color;
use pbgi_math::{intersect_disc, Ray, Vec3};

/// Oriented disc carrying the radiance baked at its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surfel {
    pub position: Vec3,
    /// Unit normal
    pub normal: Vec3,
    /// Unit tangent, perpendicular to `normal`
    pub tangent: Vec3,
    /// Outgoing radiance from direct lighting
    pub color: Color,
    pub radius: f32,
}

impl Surfel {
    pub fn new(position: Vec3, normal: Vec3, tangent: Vec3, color: Color, radius: f32) -> Self {
        Self {
            position,
            normal: normal.normalize(),
            tangent,
            color,
            radius,
        }
    }

    /// Ray parameter where `ray` crosses the disc, from either side.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        intersect_disc(ray, self.position, self.normal, self.radius)
    }

    /// Two triangles spanning the disc's inscribed diamond.
    pub fn triangles(&self) -> [[Vec3; 3]; 2] {
        let p = self.position;
        let u = self.tangent * self.radius;
        let v = self.normal.cross(self.tangent).normalize_or_zero() * self.radius;
        [[p + u, p + v, p - v], [p - u, p - v, p + v]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upward() -> Surfel {
        Surfel::new(Vec3::ZERO, Vec3::Y * 3.0, Vec3::X, Color::ONE, 0.5)
    }

    #[test]
    fn test_new_normalizes_normal() {
        assert_eq!(upward().normal, Vec3::Y);
    }

    #[test]
    fn test_intersect_respects_radius() {
        let surfel = upward();

        let inside = Ray::new(Vec3::new(0.3, 2.0, 0.3), Vec3::NEG_Y);
        assert!((surfel.intersect(&inside).unwrap() - 2.0).abs() < 1e-5);

        let from_below = Ray::new(Vec3::new(0.0, -1.0, 0.2), Vec3::Y);
        assert!(surfel.intersect(&from_below).is_some());

        let outside = Ray::new(Vec3::new(0.4, 2.0, 0.4), Vec3::NEG_Y);
        assert!(surfel.intersect(&outside).is_none());
    }

    #[test]
    fn test_triangles_lie_in_disc_plane() {
        for tri in upward().triangles() {
            for p in tri {
                assert!(p.y.abs() < 1e-6);
                assert!(p.length() <= 0.5 + 1e-5);
            }
        }
    }
}
