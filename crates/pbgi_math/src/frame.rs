use crate::Vec3;

/// Orthonormal basis around a surface normal.
///
/// `horizontal` and `vertical` span the tangent plane; together with
/// `normal` they form a right-handed frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub horizontal: Vec3,
    pub vertical: Vec3,
    pub normal: Vec3,
}

impl Frame {
    /// Build a frame from a (not necessarily unit) normal.
    ///
    /// World up (+Y) is the reference direction; near-vertical normals use
    /// -Z instead so the cross product never degenerates.
    pub fn from_normal(normal: Vec3) -> Self {
        let normal = if normal.length_squared() > 0.0 { normal.normalize() } else { Vec3::Y };
        let up = if normal.y.abs() > 0.999 { Vec3::NEG_Z } else { Vec3::Y };
        let horizontal = up.cross(normal).normalize();
        let vertical = normal.cross(horizontal).normalize();
        Self {
            horizontal,
            vertical,
            normal,
        }
    }

    /// Local `(x, y, z)` coordinates to world space.
    #[inline]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.horizontal * local.x + self.vertical * local.y + self.normal * local.z
    }

    /// World-space vector to local `(x, y, z)` coordinates.
    #[inline]
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        Vec3::new(
            world.dot(self.horizontal),
            world.dot(self.vertical),
            world.dot(self.normal),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(frame: &Frame) {
        assert!((frame.horizontal.length() - 1.0).abs() < 1e-5);
        assert!((frame.vertical.length() - 1.0).abs() < 1e-5);
        assert!(frame.horizontal.dot(frame.vertical).abs() < 1e-5);
        assert!(frame.horizontal.dot(frame.normal).abs() < 1e-5);
        assert!(frame.vertical.dot(frame.normal).abs() < 1e-5);
    }

    #[test]
    fn test_frames_are_orthonormal() {
        for n in [
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::X,
            Vec3::new(0.3, 0.9, -0.2),
            Vec3::new(0.0001, 1.0, 0.0),
        ] {
            assert_orthonormal(&Frame::from_normal(n));
        }
    }

    #[test]
    fn test_local_world_roundtrip() {
        let frame = Frame::from_normal(Vec3::new(1.0, 2.0, 3.0));
        let v = Vec3::new(-0.4, 0.7, 0.2);
        let back = frame.to_world(frame.to_local(v));
        assert!((back - v).length() < 1e-5);
        assert!((frame.to_world(Vec3::Z) - frame.normal).length() < 1e-6);
    }
}
