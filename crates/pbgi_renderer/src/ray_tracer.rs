//! Ray tracing driver: direct lighting and a path-traced variant.

use std::time::Instant;

use log::info;
use pbgi_core::{Camera, Color, Material, Scene, SceneHit, SceneResult};
use pbgi_math::{Ray, Vec3};
use rand::RngCore;

use crate::bucket::render_buckets;
use crate::renderer::{ImageBuffer, RenderConfig};
use crate::sampling::{cosine_hemisphere, gen_f32};

/// Offset for secondary ray origins and tolerance for shadow hits near
/// the light sample.
pub const SHADOW_EPSILON: f32 = 1e-3;

/// Direct radiance leaving `position` toward `view_point`.
///
/// Every light is sampled once; an unoccluded light contributes its
/// radiance weighted by the material response. Emissive materials return
/// their emission instead. The scene hierarchy must already be built
/// (see [`Scene::bvh`]); shadow rays are traced through it.
pub fn shade_direct(
    scene: &Scene,
    position: Vec3,
    normal: Vec3,
    material: &Material,
    view_point: Vec3,
    rng: &mut dyn RngCore,
) -> Color {
    if material.is_emissive() {
        return material.emission();
    }

    let origin = position + normal * SHADOW_EPSILON;
    let mut radiance = Color::ZERO;
    for light in scene.lights() {
        let target = light.sample_position(rng);
        if scene.occluded(origin, target, SHADOW_EPSILON) {
            continue;
        }
        let direction = (target - position).normalize_or_zero();
        radiance += light.radiance() * material.evaluate(position, normal, direction, view_point);
    }
    radiance
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceMode {
    /// Direct lighting at the first hit
    #[default]
    Direct,
    /// Direct lighting at every vertex of a cosine-sampled path
    Path,
}

#[derive(Debug, Clone)]
pub struct RayTracer {
    config: RenderConfig,
    mode: TraceMode,
}

impl RayTracer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            mode: TraceMode::Direct,
        }
    }

    pub fn with_mode(mut self, mode: TraceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn mode(&self) -> TraceMode {
        self.mode
    }

    /// Render `scene` through its camera.
    pub fn render(&self, scene: &Scene) -> SceneResult<ImageBuffer> {
        self.config.validate()?;
        scene.bvh()?;

        let camera = scene.camera().with_aspect(self.config.aspect());
        let start = Instant::now();
        let image = render_buckets(&self.config, |x, y, rng| {
            self.render_pixel(scene, &camera, x, y, rng)
        });
        info!(
            "Ray traced {}x{} ({:?}, {} spp) in {:.2?}",
            self.config.width,
            self.config.height,
            self.mode,
            self.config.samples_per_pixel,
            start.elapsed()
        );
        Ok(image)
    }

    /// Average of jittered samples through pixel `(x, y)`, or `None` when no
    /// sample hits geometry. Missed samples count as black.
    pub fn render_pixel(
        &self,
        scene: &Scene,
        camera: &Camera,
        x: u32,
        y: u32,
        rng: &mut dyn RngCore,
    ) -> Option<Color> {
        let samples = self.config.samples_per_pixel.max(1);
        let width = self.config.width as f32;
        let height = self.config.height as f32;

        let mut total = Color::ZERO;
        let mut any_hit = false;
        for _ in 0..samples {
            let u = (x as f32 + gen_f32(rng)) / width;
            let v = 1.0 - (y as f32 + gen_f32(rng)) / height;
            if let Some(color) = self.trace(scene, &camera.ray_at(u, v), rng) {
                total += color;
                any_hit = true;
            }
        }
        any_hit.then(|| total / samples as f32)
    }

    pub fn trace_closest_hit(&self, scene: &Scene, ray: &Ray) -> Option<SceneHit> {
        scene.trace_closest_hit(ray)
    }

    /// Radiance along a camera ray, `None` on a miss.
    pub fn trace(&self, scene: &Scene, ray: &Ray, rng: &mut dyn RngCore) -> Option<Color> {
        match self.mode {
            TraceMode::Direct => {
                let hit = self.trace_closest_hit(scene, ray)?;
                Some(shade_direct(
                    scene,
                    hit.position,
                    hit.normal,
                    &hit.material,
                    ray.origin,
                    rng,
                ))
            }
            TraceMode::Path => self.trace_path(scene, ray, rng),
        }
    }

    /// Path-traced radiance along a camera ray.
    ///
    /// Direct lighting is added at every vertex; the path stops after
    /// `max_bounces` indirect bounces, on a miss, or on an emitter (its
    /// light is already counted through the light sources).
    pub fn trace_path(&self, scene: &Scene, ray: &Ray, rng: &mut dyn RngCore) -> Option<Color> {
        let mut hit = self.trace_closest_hit(scene, ray)?;
        if hit.material.is_emissive() {
            return Some(hit.material.emission());
        }

        let mut radiance = Color::ZERO;
        let mut throughput = Color::ONE;
        let mut view_point = ray.origin;

        for bounce in 0..=self.config.max_bounces {
            radiance += throughput
                * shade_direct(scene, hit.position, hit.normal, &hit.material, view_point, rng);
            if bounce == self.config.max_bounces {
                break;
            }

            let (direction, pdf) = cosine_hemisphere(hit.normal, rng);
            if pdf <= 0.0 {
                break;
            }
            throughput *= hit.material.evaluate(hit.position, hit.normal, direction, view_point) / pdf;

            let bounce_ray = Ray::new(hit.position + hit.normal * SHADOW_EPSILON, direction);
            let Some(next) = self.trace_closest_hit(scene, &bounce_ray) else {
                break;
            };
            if next.material.is_emissive() {
                break;
            }
            view_point = hit.position;
            hit = next;
        }

        Some(radiance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbgi_core::{LightSource, Mesh};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f32::consts::PI;

    fn grey() -> Material {
        Material::diffuse(Color::splat(0.5))
    }

    /// Floor at y = 0, a wall at x = -1 and a point light above the floor.
    fn corner_scene() -> Scene {
        let camera = Camera::new(Vec3::new(0.0, 2.0, 2.0), Vec3::ZERO, Vec3::Y, 50.0, 1.0);
        let mut scene = Scene::new(camera);
        scene
            .add_mesh(Mesh::quad(Vec3::ZERO, Vec3::Y, Vec3::X, 2.0, grey()))
            .unwrap();
        scene
            .add_mesh(Mesh::quad(Vec3::new(-1.0, 1.0, 0.0), Vec3::X, Vec3::Y, 2.0, grey()))
            .unwrap();
        scene.add_light(LightSource::point(Vec3::new(0.0, 1.0, 0.0), Color::ONE, 1.0));
        scene.build_bvh();
        scene
    }

    #[test]
    fn test_shade_direct_unoccluded_point_light() {
        let scene = corner_scene();
        let mut rng = StdRng::seed_from_u64(0);
        let p = Vec3::new(0.0, 0.0, 0.0);

        let color = shade_direct(&scene, p, Vec3::Y, &grey(), Vec3::new(0.0, 1.0, 0.0), &mut rng);
        let expected = Color::splat(0.5 / PI + 0.01 / PI);
        assert!((color - expected).length() < 1e-4);
    }

    #[test]
    fn test_shade_direct_blocked_light() {
        let mut scene = corner_scene();
        scene
            .add_mesh(Mesh::quad(Vec3::new(0.2, 0.5, 0.2), Vec3::Y, Vec3::X, 0.2, grey()))
            .unwrap();
        scene.build_bvh();
        let mut rng = StdRng::seed_from_u64(0);

        let shadowed = shade_direct(&scene, Vec3::new(0.3, 0.0, 0.3), Vec3::Y, &grey(), Vec3::Y, &mut rng);
        assert_eq!(shadowed, Color::ZERO);

        let lit = shade_direct(&scene, Vec3::new(-0.5, 0.0, -0.5), Vec3::Y, &grey(), Vec3::Y, &mut rng);
        assert!(lit.min_element() > 0.0);
    }

    #[test]
    fn test_shade_direct_emissive_returns_emission() {
        let scene = corner_scene();
        let mut rng = StdRng::seed_from_u64(0);
        let light = Material::emissive(Color::new(1.0, 0.5, 0.25), 2.0);

        let color = shade_direct(&scene, Vec3::ZERO, Vec3::Y, &light, Vec3::Y, &mut rng);
        assert_eq!(color, Color::new(2.0, 1.0, 0.5));
    }

    #[test]
    fn test_path_without_bounces_matches_direct() {
        let scene = corner_scene();
        let config = RenderConfig {
            max_bounces: 0,
            ..Default::default()
        };
        let direct = RayTracer::new(config.clone());
        let path = RayTracer::new(config).with_mode(TraceMode::Path);

        let ray = Ray::towards(Vec3::new(0.0, 2.0, 2.0), Vec3::new(0.2, 0.0, 0.1));
        let mut rng = StdRng::seed_from_u64(1);
        let a = direct.trace(&scene, &ray, &mut rng).unwrap();
        let b = path.trace(&scene, &ray, &mut rng).unwrap();
        assert!((a - b).length() < 1e-6);
    }

    #[test]
    fn test_bounces_only_add_light() {
        let scene = corner_scene();
        let direct = RayTracer::new(RenderConfig::default());
        let path = RayTracer::new(RenderConfig {
            max_bounces: 3,
            ..Default::default()
        })
        .with_mode(TraceMode::Path);

        // Floor point next to the wall: bounces pick up the lit wall.
        let ray = Ray::towards(Vec3::new(0.0, 2.0, 2.0), Vec3::new(-0.8, 0.0, 0.0));
        let mut rng = StdRng::seed_from_u64(2);
        let base = direct.trace(&scene, &ray, &mut rng).unwrap();

        let mut mean = Color::ZERO;
        for _ in 0..256 {
            let c = path.trace(&scene, &ray, &mut rng).unwrap();
            assert!((c - base).min_element() > -1e-5);
            mean += c / 256.0;
        }
        assert!(mean.x > base.x);
    }

    #[test]
    fn test_render_requires_bvh() {
        let mut scene = corner_scene();
        scene
            .add_mesh(Mesh::quad(Vec3::ZERO, Vec3::Z, Vec3::X, 1.0, grey()))
            .unwrap();
        let tracer = RayTracer::new(RenderConfig {
            width: 4,
            height: 4,
            ..Default::default()
        });
        assert!(tracer.render(&scene).is_err());
    }

    #[test]
    fn test_render_small_image() {
        let scene = corner_scene();
        let config = RenderConfig {
            width: 16,
            height: 16,
            samples_per_pixel: 2,
            bucket_size: 8,
            ..Default::default()
        };
        let image = RayTracer::new(config.clone()).render(&scene).unwrap();

        assert_eq!(image.pixels.len(), 256);
        // The camera looks down at the lit floor.
        let center = image.get(8, 8);
        assert!(center.min_element() > 0.0);
        assert_ne!(center, config.background(8));
    }
}
