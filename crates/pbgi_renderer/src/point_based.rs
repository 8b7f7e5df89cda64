//! Point-based global illumination driver.
//!
//! Camera rays find the visible surface with the triangle BVH; the light
//! arriving there is gathered from the surfel hierarchy with a micro-buffer.

use std::time::Instant;

use log::info;
use pbgi_core::{Camera, Color, Scene, SceneResult};
use pbgi_math::Ray;

use crate::bsh::SurfelHierarchy;
use crate::bucket::render_buckets;
use crate::micro_buffer::MicroBuffer;
use crate::point_cloud::PointCloud;
use crate::renderer::{ImageBuffer, RenderConfig};

/// Gathering points are lifted off the surface along the normal by this much.
pub const GATHER_OFFSET: f32 = 0.01;

#[derive(Debug, Clone)]
pub struct PointBasedRenderer {
    config: RenderConfig,
}

impl PointBasedRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Sample the scene into surfels and build their hierarchy.
    pub fn build_hierarchy(&self, scene: &Scene) -> SceneResult<SurfelHierarchy> {
        self.config.validate()?;
        let cloud = PointCloud::generate(scene, self.config.sampling_rate, self.config.seed)?;
        Ok(SurfelHierarchy::build(&cloud))
    }

    /// Render `scene`, gathering indirect light from `hierarchy`.
    ///
    /// One ray through each pixel center; emitters show their emission.
    pub fn render(&self, scene: &Scene, hierarchy: &SurfelHierarchy) -> SceneResult<ImageBuffer> {
        self.config.validate()?;
        scene.bvh()?;

        let camera = scene.camera().with_aspect(self.config.aspect());
        let start = Instant::now();
        let image = render_buckets(&self.config, |x, y, _| {
            self.shade_pixel(scene, hierarchy, &pixel_center_ray(&camera, &self.config, x, y))
        });
        info!(
            "Point-based render {}x{} (micro-buffer {}) in {:.2?}",
            self.config.width,
            self.config.height,
            self.config.micro_buffer_size,
            start.elapsed()
        );
        Ok(image)
    }

    /// Radiance seen along `ray`, `None` on a miss.
    pub fn shade_pixel(&self, scene: &Scene, hierarchy: &SurfelHierarchy, ray: &Ray) -> Option<Color> {
        let hit = scene.trace_closest_hit(ray)?;
        if hit.material.is_emissive() {
            return Some(hit.material.emission());
        }

        Some(MicroBuffer::gather(
            self.config.micro_buffer_size,
            hit.position + hit.normal * GATHER_OFFSET,
            hit.normal,
            hierarchy,
            &hit.material,
            ray.origin,
        ))
    }

    /// Debug view of the point cloud: each pixel shows the baked color of
    /// the closest surfel disc along its center ray.
    pub fn render_surfels(&self, scene: &Scene, hierarchy: &SurfelHierarchy) -> SceneResult<ImageBuffer> {
        self.config.validate()?;

        let camera = scene.camera().with_aspect(self.config.aspect());
        let start = Instant::now();
        let image = render_buckets(&self.config, |x, y, _| {
            let ray = pixel_center_ray(&camera, &self.config, x, y);
            hierarchy
                .closest_disc_hit(&ray)
                .map(|(_, surfel)| hierarchy.surfel(surfel).color)
        });
        info!(
            "Splatted {} surfels at {}x{} in {:.2?}",
            hierarchy.surfels().len(),
            self.config.width,
            self.config.height,
            start.elapsed()
        );
        Ok(image)
    }
}

/// Ray through the center of pixel `(x, y)`, row 0 at the top.
fn pixel_center_ray(camera: &Camera, config: &RenderConfig, x: u32, y: u32) -> Ray {
    let u = (x as f32 + 0.5) / config.width as f32;
    let v = 1.0 - (y as f32 + 0.5) / config.height as f32;
    camera.ray_at(u, v)
}
