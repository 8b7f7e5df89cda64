//! Surface materials.
//!
//! A closed set of variants matched in the shading loop instead of trait
//! objects: every variant answers [`Material::evaluate`].

use std::f32::consts::PI;

use pbgi_math::Vec3;

/// Color type alias (linear RGB)
pub type Color = Vec3;

/// Smallest GGX alpha; keeps the distribution finite for roughness 0.
const MIN_ALPHA: f32 = 1e-3;

/// Surface response model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Lambertian diffuse plus a GGX microfacet specular lobe.
    Ggx {
        albedo: Color,
        roughness: f32,
        metallic: f32,
    },
    /// Light-emitting surface; returns its emission in every direction.
    Emissive { color: Color, strength: f32 },
}

impl Material {
    /// Rough dielectric: mostly diffuse with a faint, wide highlight.
    pub fn diffuse(albedo: Color) -> Self {
        Material::Ggx {
            albedo,
            roughness: 1.0,
            metallic: 0.0,
        }
    }

    pub fn ggx(albedo: Color, roughness: f32, metallic: f32) -> Self {
        Material::Ggx {
            albedo,
            roughness: roughness.clamp(0.0, 1.0),
            metallic: metallic.clamp(0.0, 1.0),
        }
    }

    pub fn emissive(color: Color, strength: f32) -> Self {
        Material::Emissive { color, strength }
    }

    pub fn is_emissive(&self) -> bool {
        matches!(self, Material::Emissive { .. })
    }

    /// Emitted radiance (zero for non-emitters).
    pub fn emission(&self) -> Color {
        match *self {
            Material::Emissive { color, strength } => color * strength,
            Material::Ggx { .. } => Color::ZERO,
        }
    }

    /// Cosine-weighted BRDF for light arriving from `direction` at
    /// `position`, seen from `view_point`.
    ///
    /// For GGX this is `(albedo/π + specular) * max(n·ωi, 0)`; `direction`
    /// and `normal` are expected to be unit length.
    pub fn evaluate(&self, position: Vec3, normal: Vec3, direction: Vec3, view_point: Vec3) -> Color {
        match *self {
            Material::Emissive { color, strength } => color * strength,
            Material::Ggx {
                albedo,
                roughness,
                metallic,
            } => {
                let n_dot_wi = normal.dot(direction);
                if n_dot_wi <= 0.0 {
                    return Color::ZERO;
                }
                let wo = (view_point - position).normalize_or_zero();
                let diffuse = albedo / PI;
                let specular = ggx_specular(direction, wo, normal, albedo, roughness, metallic);
                (diffuse + specular) * n_dot_wi
            }
        }
    }
}

/// Cook-Torrance specular term with GGX distribution, Smith masking and
/// Schlick Fresnel. Zero below either horizon.
fn ggx_specular(wi: Vec3, wo: Vec3, n: Vec3, albedo: Color, roughness: f32, metallic: f32) -> Color {
    let n_dot_wi = n.dot(wi);
    let n_dot_wo = n.dot(wo);
    if n_dot_wi <= 0.0 || n_dot_wo <= 0.0 {
        return Color::ZERO;
    }

    let alpha = (roughness * roughness).max(MIN_ALPHA);
    let alpha2 = alpha * alpha;
    let wh = (wi + wo).normalize_or_zero();

    let g = smith_g1(n_dot_wi, alpha2) * smith_g1(n_dot_wo, alpha2);

    let f0 = Color::splat(0.04).lerp(albedo, metallic);
    let cos_h = wi.dot(wh).max(0.0);
    let f = f0 + (Color::ONE - f0) * (1.0 - cos_h).powi(5);

    let n_dot_h = n.dot(wh);
    let denom = 1.0 + n_dot_h * n_dot_h * (alpha2 - 1.0);
    let d = alpha2 / (PI * denom * denom);

    f * (g * d / (4.0 * n_dot_wi * n_dot_wo))
}

#[inline]
fn smith_g1(n_dot_w: f32, alpha2: f32) -> f32 {
    2.0 * n_dot_w / (n_dot_w + (alpha2 + (1.0 - alpha2) * n_dot_w * n_dot_w).sqrt())
}

impl Default for Material {
    fn default() -> Self {
        Material::diffuse(Color::splat(0.5))
    }
}
