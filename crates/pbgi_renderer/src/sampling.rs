//! Random sampling helpers shared by the renderers.
//!
//! All functions take an explicit generator so each render task can own
//! its own seeded [`rand::rngs::StdRng`].

use pbgi_math::{Frame, Vec2, Vec3};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use std::f32::consts::{FRAC_PI_4, PI};

/// Uniform float in `[0, 1)`.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Derive an independent seed from a base seed and a task key.
///
/// SplitMix64 finaliser over the combined inputs, so neighbouring keys give
/// unrelated streams.
pub fn mix_seed(seed: u64, key: &[u64]) -> u64 {
    let mut h = seed ^ 0x9E37_79B9_7F4A_7C15;
    for &k in key {
        h ^= k.wrapping_add(0x9E37_79B9_7F4A_7C15);
        h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        h ^= h >> 31;
    }
    h
}

/// Shirley-Chiu concentric mapping of `[0,1)²` onto the unit disc.
pub fn concentric_disc(u: Vec2) -> Vec2 {
    let offset = u * 2.0 - Vec2::ONE;
    if offset.x == 0.0 && offset.y == 0.0 {
        return Vec2::ZERO;
    }

    let (r, theta) = if offset.x.abs() > offset.y.abs() {
        (offset.x, FRAC_PI_4 * (offset.y / offset.x))
    } else {
        (offset.y, PI / 2.0 - FRAC_PI_4 * (offset.x / offset.y))
    };
    Vec2::new(theta.cos(), theta.sin()) * r
}

/// Cosine-weighted direction on the hemisphere around `normal`.
///
/// Returns the unit direction and its density `cos θ / π`.
pub fn cosine_hemisphere(normal: Vec3, rng: &mut dyn RngCore) -> (Vec3, f32) {
    let d = concentric_disc(Vec2::new(gen_f32(rng), gen_f32(rng)));
    let z = (1.0 - d.length_squared()).max(0.0).sqrt();
    let direction = Frame::from_normal(normal).to_world(Vec3::new(d.x, d.y, z));
    (direction, z / PI)
}

/// `count` stratified barycentric weights over a triangle.
///
/// Lays an `m × m` jittered grid over `(u, v)` with `m = ⌈√(2·count)⌉ + 1`,
/// keeps the samples with `u + v ≤ 1`, shuffles them and truncates to
/// `count`. The grid holds at least `m(m-1)/2 ≥ count` cells entirely
/// below the diagonal, so the result always has exactly `count` entries.
/// Weights are `(1 - u - v, u, v)`, one per triangle vertex.
pub fn stratified_barycentrics(count: usize, rng: &mut dyn RngCore) -> Vec<Vec3> {
    if count == 0 {
        return Vec::new();
    }

    let m = ((2 * count) as f32).sqrt().ceil() as usize + 1;
    let cell = 1.0 / m as f32;

    let mut samples = Vec::with_capacity(m * m / 2 + m);
    for a in 0..m {
        for b in 0..m {
            let u = (a as f32 + gen_f32(rng)) * cell;
            let v = (b as f32 + gen_f32(rng)) * cell;
            if u + v <= 1.0 {
                samples.push(Vec3::new(1.0 - u - v, u, v));
            }
        }
    }

    samples.shuffle(rng);
    samples.truncate(count);
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_mix_seed_separates_keys() {
        assert_eq!(mix_seed(7, &[1, 2]), mix_seed(7, &[1, 2]));
        assert_ne!(mix_seed(7, &[1, 2]), mix_seed(7, &[2, 1]));
        assert_ne!(mix_seed(7, &[0]), mix_seed(8, &[0]));
    }

    #[test]
    fn test_concentric_disc_stays_inside() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let p = concentric_disc(Vec2::new(gen_f32(&mut rng), gen_f32(&mut rng)));
            assert!(p.length() <= 1.0 + 1e-5);
        }
        assert_eq!(concentric_disc(Vec2::splat(0.5)), Vec2::ZERO);
    }

    #[test]
    fn test_cosine_hemisphere_is_above_surface() {
        let mut rng = StdRng::seed_from_u64(11);
        let normal = Vec3::new(1.0, 2.0, -0.5).normalize();

        let mut mean_cos = 0.0;
        for _ in 0..4000 {
            let (dir, pdf) = cosine_hemisphere(normal, &mut rng);
            let cos = dir.dot(normal);
            assert!(cos >= -1e-5);
            assert!((dir.length() - 1.0).abs() < 1e-4);
            assert!((pdf - cos / PI).abs() < 1e-4);
            mean_cos += cos;
        }
        // E[cos θ] under a cosine density is 2/3.
        assert!((mean_cos / 4000.0 - 2.0 / 3.0).abs() < 0.03);
    }

    #[test]
    fn test_stratified_barycentrics_count_and_range() {
        let mut rng = StdRng::seed_from_u64(5);
        for count in [1, 2, 3, 10, 57, 400] {
            let samples = stratified_barycentrics(count, &mut rng);
            assert_eq!(samples.len(), count);
            for w in samples {
                assert!(w.min_element() >= -1e-6);
                assert!((w.element_sum() - 1.0).abs() < 1e-5);
            }
        }
        assert!(stratified_barycentrics(0, &mut rng).is_empty());
    }
}
