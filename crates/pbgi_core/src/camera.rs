//! Pinhole camera for primary ray generation.

use pbgi_math::{Ray, Vec3};

/// Perspective pinhole camera.
///
/// Image-plane coordinates `(u, v)` run from `(0, 0)` at the bottom-left
/// corner to `(1, 1)` at the top-right.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    position: Vec3,
    bottom_left: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
}

impl Camera {
    /// Create a camera at `position` looking at `look_at`.
    ///
    /// - `vfov`: vertical field of view in degrees
    /// - `aspect`: image width / height
    pub fn new(position: Vec3, look_at: Vec3, up: Vec3, vfov: f32, aspect: f32) -> Self {
        let half_height = (vfov.to_radians() * 0.5).tan();
        let half_width = aspect * half_height;

        let w = (position - look_at).normalize();
        let u = up.cross(w).normalize();
        let v = w.cross(u);

        Self {
            position,
            bottom_left: position - w - u * half_width - v * half_height,
            horizontal: u * (2.0 * half_width),
            vertical: v * (2.0 * half_height),
        }
    }

    /// Same camera with a new aspect ratio (e.g. after the output size changed).
    pub fn with_aspect(&self, aspect: f32) -> Self {
        let w = (self.position - (self.bottom_left + (self.horizontal + self.vertical) * 0.5)).normalize();
        let half_height = self.vertical.length() * 0.5;
        let u = self.horizontal.normalize();
        let v = self.vertical.normalize();
        let half_width = aspect * half_height;
        Self {
            position: self.position,
            bottom_left: self.position - w - u * half_width - v * half_height,
            horizontal: u * (2.0 * half_width),
            vertical: v * (2.0 * half_height),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit-direction ray through image-plane point `(u, v)`.
    pub fn ray_at(&self, u: f32, v: f32) -> Ray {
        let target = self.bottom_left + self.horizontal * u + self.vertical * v;
        Ray::towards(self.position, target)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 1.2), Vec3::ZERO, Vec3::Y, 60.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 1.2), Vec3::ZERO, Vec3::Y, 60.0, 1.0);
        let ray = camera.ray_at(0.5, 0.5);

        assert_eq!(ray.origin, camera.position());
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_corners_respect_fov() {
        let camera = Camera::new(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y, 90.0, 1.0);

        let top = camera.ray_at(0.5, 1.0).direction;
        assert!((top - Vec3::new(0.0, 1.0, -1.0).normalize()).length() < 1e-5);

        let left = camera.ray_at(0.0, 0.5).direction;
        assert!((left - Vec3::new(-1.0, 0.0, -1.0).normalize()).length() < 1e-5);
    }

    #[test]
    fn test_with_aspect_widens_view() {
        let camera = Camera::new(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y, 90.0, 1.0).with_aspect(2.0);

        let right = camera.ray_at(1.0, 0.5).direction;
        assert!((right - Vec3::new(2.0, 0.0, -1.0).normalize()).length() < 1e-5);
        let center = camera.ray_at(0.5, 0.5).direction;
        assert!((center - Vec3::NEG_Z).length() < 1e-5);
    }
}
