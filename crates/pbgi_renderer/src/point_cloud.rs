//! Surfel point cloud generation.
//!
//! Every triangle receives `floor(sampling_rate * area)` stratified samples.
//! Each sample is lit once with direct lighting and stored as a [`Surfel`]
//! whose radius `sqrt(1 / sampling_rate)` makes the discs roughly tile the
//! surface.

use std::time::Instant;

use log::{debug, info, warn};
use pbgi_core::{Scene, SceneResult};
use pbgi_math::{Frame, Vec3};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

use crate::ray_tracer::shade_direct;
use crate::sampling::{mix_seed, stratified_barycentrics};
use crate::surfel::Surfel;

/// Surfels covering every mesh of a scene.
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    surfels: Vec<Surfel>,
    sampling_rate: f32,
}

impl PointCloud {
    pub fn from_surfels(surfels: Vec<Surfel>, sampling_rate: f32) -> Self {
        Self {
            surfels,
            sampling_rate,
        }
    }

    /// Sample all meshes of `scene` at `sampling_rate` surfels per unit area.
    ///
    /// Triangles are processed in parallel, each with a generator seeded
    /// from `(seed, mesh, triangle)`, so the result does not depend on the
    /// thread count. Surfels are baked with the camera position as the
    /// viewer. Requires a built BVH for the shadow rays.
    pub fn generate(scene: &Scene, sampling_rate: f32, seed: u64) -> SceneResult<Self> {
        scene.bvh()?;
        let start = Instant::now();

        let mut tasks = Vec::with_capacity(scene.triangle_count());
        for (mesh_index, mesh) in scene.meshes().iter().enumerate() {
            let degenerate = mesh
                .triangles
                .iter()
                .filter(|&&tri| mesh.area(tri) <= 0.0)
                .count();
            if degenerate > 0 {
                warn!(
                    "Mesh '{}': {} zero-area triangles receive no surfels",
                    mesh.name, degenerate
                );
            }
            tasks.extend((0..mesh.triangle_count()).map(|t| (mesh_index, t)));
        }

        let radius = (1.0 / sampling_rate).sqrt();
        let per_triangle: Vec<Vec<Surfel>> = tasks
            .par_iter()
            .map(|&(mesh_index, triangle_index)| {
                let mut rng =
                    StdRng::seed_from_u64(mix_seed(seed, &[mesh_index as u64, triangle_index as u64]));
                sample_triangle(
                    scene,
                    mesh_index,
                    triangle_index,
                    sampling_rate,
                    radius,
                    &mut rng,
                )
            })
            .collect();

        let surfels: Vec<Surfel> = per_triangle.into_iter().flatten().collect();
        info!(
            "Generated {} surfels (radius {:.4}) from {} triangles in {:.2?}",
            surfels.len(),
            radius,
            tasks.len(),
            start.elapsed()
        );

        Ok(Self {
            surfels,
            sampling_rate,
        })
    }

    pub fn surfels(&self) -> &[Surfel] {
        &self.surfels
    }

    pub fn sampling_rate(&self) -> f32 {
        self.sampling_rate
    }

    pub fn len(&self) -> usize {
        self.surfels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfels.is_empty()
    }

    /// Two triangles per surfel, for inspecting the cloud in other tools.
    pub fn disc_triangles(&self) -> Vec<[Vec3; 3]> {
        self.surfels.iter().flat_map(Surfel::triangles).collect()
    }
}

fn sample_triangle(
    scene: &Scene,
    mesh_index: usize,
    triangle_index: usize,
    sampling_rate: f32,
    radius: f32,
    rng: &mut dyn RngCore,
) -> Vec<Surfel> {
    let mesh = &scene.meshes()[mesh_index];
    let tri = mesh.triangles[triangle_index];
    let count = (sampling_rate * mesh.area(tri)).floor() as usize;
    if count == 0 {
        return Vec::new();
    }

    let [p0, p1, _] = mesh.vertices(tri);
    let view_point = scene.camera().position();

    let surfels: Vec<Surfel> = stratified_barycentrics(count, rng)
        .into_iter()
        .map(|w| {
            let position = mesh.interpolate_position(tri, w);
            let normal = mesh.interpolate_normal(tri, w);
            let mut tangent = normal.cross(p1 - p0).normalize_or_zero();
            if tangent == Vec3::ZERO {
                tangent = Frame::from_normal(normal).horizontal;
            }
            let color = shade_direct(scene, position, normal, &mesh.material, view_point, rng);
            Surfel::new(position, normal, tangent, color, radius)
        })
        .collect();

    debug!(
        "Mesh {} triangle {}: {} surfels",
        mesh_index,
        triangle_index,
        surfels.len()
    );
    surfels
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbgi_core::{Camera, Color, LightSource, Material, Mesh};
    use std::f32::consts::PI;

    /// Diffuse plane at y = 0 under a small downward-facing emitter at y = 1,
    /// seen from straight above.
    fn lit_plane(intensity: f32) -> Scene {
        let camera = Camera::new(Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO, Vec3::Z, 40.0, 1.0);
        let mut scene = Scene::new(camera);
        scene
            .add_mesh(Mesh::quad(
                Vec3::ZERO,
                Vec3::Y,
                Vec3::X,
                0.2,
                Material::diffuse(Color::new(0.8, 0.6, 0.4)),
            ))
            .unwrap();
        scene
            .add_mesh(Mesh::quad(
                Vec3::Y,
                Vec3::NEG_Y,
                Vec3::X,
                0.1,
                Material::emissive(Color::ONE, intensity),
            ))
            .unwrap();
        scene.add_light(LightSource::area(Vec3::Y, Vec3::ZERO, 0.1, Color::ONE, intensity));
        scene.build_bvh();
        scene
    }

    #[test]
    fn test_generate_requires_bvh() {
        let scene = Scene::new(Camera::default());
        assert!(PointCloud::generate(&scene, 100.0, 0).is_err());
    }

    #[test]
    fn test_sample_count_follows_area() {
        let _ = env_logger::builder().is_test(true).try_init();
        let scene = lit_plane(2.0);
        let cloud = PointCloud::generate(&scene, 1025.0, 1).unwrap();

        // Plane triangles: 0.02 area -> 20.5 -> 20 each. Emitter: 0.005 -> 5 each.
        assert_eq!(cloud.len(), 2 * 20 + 2 * 5);
        let expected_radius = (1.0f32 / 1025.0).sqrt();
        assert!(cloud
            .surfels()
            .iter()
            .all(|s| (s.radius - expected_radius).abs() < 1e-6));
    }

    #[test]
    fn test_low_rate_skips_small_triangles() {
        let scene = lit_plane(2.0);
        let cloud = PointCloud::generate(&scene, 10.0, 1).unwrap();
        assert!(cloud.is_empty());
    }

    #[test]
    fn test_generation_is_reproducible() {
        let scene = lit_plane(2.0);
        let a = PointCloud::generate(&scene, 2025.0, 42).unwrap();
        let b = PointCloud::generate(&scene, 2025.0, 42).unwrap();
        assert_eq!(a.surfels(), b.surfels());
    }

    #[test]
    fn test_plane_surfels_match_analytic_direct_light() {
        let intensity = 3.0;
        let scene = lit_plane(intensity);
        let cloud = PointCloud::generate(&scene, 2025.0, 9).unwrap();

        let albedo = Color::new(0.8, 0.6, 0.4);
        // Normal incidence: Lambert term plus the F0 = 0.04 GGX lobe at alpha 1.
        let expected = albedo * (intensity / PI) + Color::splat(intensity * 0.01 / PI);

        let plane: Vec<&Surfel> = cloud
            .surfels()
            .iter()
            .filter(|s| s.position.y.abs() < 1e-4)
            .collect();
        assert_eq!(plane.len(), 80);

        for surfel in plane {
            assert!((surfel.normal - Vec3::Y).length() < 1e-5);
            let ratio = surfel.color / expected;
            assert!(
                ratio.min_element() > 0.95 && ratio.max_element() < 1.05,
                "baked {:?}, expected {:?}",
                surfel.color,
                expected
            );
        }
    }

    #[test]
    fn test_emitter_surfels_carry_emission() {
        let scene = lit_plane(2.0);
        let cloud = PointCloud::generate(&scene, 2025.0, 9).unwrap();
        let emitter: Vec<&Surfel> = cloud
            .surfels()
            .iter()
            .filter(|s| (s.position.y - 1.0).abs() < 1e-4)
            .collect();

        assert!(!emitter.is_empty());
        assert!(emitter.iter().all(|s| s.color == Color::splat(2.0)));
    }

    #[test]
    fn test_disc_triangles_two_per_surfel() {
        let scene = lit_plane(1.0);
        let cloud = PointCloud::generate(&scene, 1000.0, 3).unwrap();
        assert_eq!(cloud.disc_triangles().len(), 2 * cloud.len());
    }
}
