use crate::{Interval, Ray, Vec3};

/// Bounding sphere used by the surfel hierarchy.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Approximate minimal sphere around `points` (Ritter's algorithm).
    ///
    /// The seed sphere spans the pair of axis-extreme points that are
    /// farthest apart; every point still outside it then grows the sphere
    /// just enough to touch that point. Each growth step contains the
    /// previous sphere, so all visited points remain enclosed.
    pub fn enclosing(points: &[Vec3]) -> Self {
        let Some(&first) = points.first() else {
            return Self::default();
        };

        let mut min_pts = [first; 3];
        let mut max_pts = [first; 3];
        for &p in points {
            for axis in 0..3 {
                if p[axis] < min_pts[axis][axis] {
                    min_pts[axis] = p;
                }
                if p[axis] > max_pts[axis][axis] {
                    max_pts[axis] = p;
                }
            }
        }

        let mut seed_axis = 0;
        let mut max_span = (max_pts[0] - min_pts[0]).length_squared();
        for axis in 1..3 {
            let span = (max_pts[axis] - min_pts[axis]).length_squared();
            if span > max_span {
                max_span = span;
                seed_axis = axis;
            }
        }

        let center = (min_pts[seed_axis] + max_pts[seed_axis]) * 0.5;
        let mut sphere = Self::new(center, (max_pts[seed_axis] - center).length());
        for &p in points {
            sphere.grow_to_include(p);
        }
        sphere
    }

    /// Enlarge (and recenter) the sphere so that `point` lies on or inside it.
    pub fn grow_to_include(&mut self, point: Vec3) {
        let offset = point - self.center;
        let dist = offset.length();
        if dist <= self.radius {
            return;
        }
        let new_radius = (dist + self.radius) * 0.5;
        self.center += offset * ((new_radius - self.radius) / dist);
        self.radius = new_radius;
    }

    /// Point containment with an absolute tolerance for accumulated
    /// rounding in [`BoundingSphere::grow_to_include`].
    pub fn contains(&self, point: Vec3, tolerance: f32) -> bool {
        (point - self.center).length() <= self.radius + tolerance
    }

    /// Parametric range where the ray is inside the sphere, clipped to `ray_t`.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Interval> {
        let oc = self.center - ray.origin;
        let a = ray.direction.length_squared();
        if a == 0.0 {
            return None;
        }
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();
        let t0 = ((h - sqrtd) / a).max(ray_t.min);
        let t1 = ((h + sqrtd) / a).min(ray_t.max);
        (t0 <= t1).then(|| Interval::new(t0, t1))
    }
}
