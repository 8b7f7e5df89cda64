use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box for the triangle BVH.
///
/// The default value is the inverted box (`min = +inf`, `max = -inf`), which
/// represents "empty" and becomes valid after the first [`Aabb::extend`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// The empty (inverted) box.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Smallest box containing every point of `points`.
    pub fn enclosing<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        points.into_iter().fold(Aabb::EMPTY, |mut acc, p| {
            acc.extend(p);
            acc
        })
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            min: box0.min.min(box1.min),
            max: box0.max.max(box1.max),
        }
    }

    /// Grow the box to include `point`.
    #[inline]
    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// True until a point has been merged in.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Inclusive point containment.
    pub fn contains(&self, p: Vec3) -> bool {
        self.min.cmple(p).all() && p.cmple(self.max).all()
    }

    /// Per-axis size. Negative for the empty box.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    ///
    /// Ties resolve in axis order: X wins if it is at least as long as both
    /// others, then Y, then Z.
    pub fn longest_axis(&self) -> usize {
        let d = self.extent();
        if d.x >= d.y.max(d.z) {
            0
        } else if d.y >= d.x.max(d.z) {
            1
        } else {
            2
        }
    }

    /// Pad axes thinner than `delta` so flat geometry still has a volume the
    /// slab test can enter.
    pub fn padded(&self, delta: f32) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        let mut padded = *self;
        let extent = self.extent();
        for axis in 0..3 {
            if extent[axis] < delta {
                padded.min[axis] -= delta * 0.5;
                padded.max[axis] += delta * 0.5;
            }
        }
        padded
    }

    /// Slab test restricted to `ray_t`.
    ///
    /// Returns the parametric `[t_min, t_max]` overlap of the ray with the
    /// box, or `None` as soon as the running interval becomes empty
    /// (`t_max <= t_min`) on some axis. A zero direction component yields an
    /// infinite inverse, so the slab on that axis is either the whole line or
    /// nothing, without a division error.
    pub fn hit(&self, ray: &Ray, mut ray_t: Interval) -> Option<Interval> {
        let inv = ray.inv_direction();

        for axis in 0..3 {
            let adinv = inv[axis];
            let mut t0 = (self.min[axis] - ray.origin[axis]) * adinv;
            let mut t1 = (self.max[axis] - ray.origin[axis]) * adinv;
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            // f32::max/min drop a NaN operand (0 * inf on a slab boundary).
            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max <= ray_t.min {
                return None;
            }
        }

        Some(ray_t)
    }

    /// Slab test over the whole forward half of the ray.
    pub fn intersects(&self, ray: &Ray) -> Option<Interval> {
        self.hit(ray, Interval::FORWARD)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Aabb::EMPTY
    }
}
