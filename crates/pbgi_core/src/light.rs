//! Explicit light sources used for direct lighting.

use pbgi_math::{Frame, Vec3};
use rand::{Rng, RngCore};

use crate::material::Color;

/// A light that shadow rays can be aimed at.
///
/// Lights have no distance falloff: an unoccluded light contributes
/// `color * intensity` weighted by the receiving material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightSource {
    Point {
        position: Vec3,
        color: Color,
        intensity: f32,
    },
    /// Square emitter of edge length `side`, facing `normal`.
    Area {
        center: Vec3,
        normal: Vec3,
        side: f32,
        color: Color,
        intensity: f32,
    },
}

impl LightSource {
    pub fn point(position: Vec3, color: Color, intensity: f32) -> Self {
        LightSource::Point {
            position,
            color,
            intensity,
        }
    }

    /// Square area light at `center` aimed at `look_at`.
    pub fn area(center: Vec3, look_at: Vec3, side: f32, color: Color, intensity: f32) -> Self {
        LightSource::Area {
            center,
            normal: (look_at - center).normalize_or_zero(),
            side,
            color,
            intensity,
        }
    }

    /// Radiance carried by every shadow ray that reaches the light.
    pub fn radiance(&self) -> Color {
        match *self {
            LightSource::Point {
                color, intensity, ..
            }
            | LightSource::Area {
                color, intensity, ..
            } => color * intensity,
        }
    }

    /// Representative position (the point itself, or the emitter center).
    pub fn position(&self) -> Vec3 {
        match *self {
            LightSource::Point { position, .. } => position,
            LightSource::Area { center, .. } => center,
        }
    }

    /// Point on the light to aim a shadow ray at.
    ///
    /// Area lights are sampled uniformly over their surface.
    pub fn sample_position(&self, rng: &mut dyn RngCore) -> Vec3 {
        match *self {
            LightSource::Point { position, .. } => position,
            LightSource::Area {
                center,
                normal,
                side,
                ..
            } => {
                let frame = Frame::from_normal(normal);
                let s = rng.gen::<f32>() - 0.5;
                let t = rng.gen::<f32>() - 0.5;
                center + (frame.horizontal * s + frame.vertical * t) * side
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_point_light_is_fixed() {
        let light = LightSource::point(Vec3::new(0.2, 0.0, 1.0), Color::ONE, 2.0);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(light.radiance(), Color::splat(2.0));
        assert_eq!(light.sample_position(&mut rng), Vec3::new(0.2, 0.0, 1.0));
    }

    #[test]
    fn test_area_samples_stay_on_square() {
        let light = LightSource::area(Vec3::new(0.0, 0.45, 0.0), Vec3::ZERO, 0.2, Color::ONE, 1.0);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..256 {
            let p = light.sample_position(&mut rng);
            assert!((p.y - 0.45).abs() < 1e-5);
            assert!(p.x.abs() <= 0.1 + 1e-5);
            assert!(p.z.abs() <= 0.1 + 1e-5);
        }
    }
}
