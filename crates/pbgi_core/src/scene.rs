//! Scene container: meshes, lights, camera and the triangle hierarchy.
//!
//! Meshes and lights are added first, then [`Scene::build_bvh`] builds the
//! visibility structure once. Every ray query after that only reads the
//! scene, so a `&Scene` can be shared freely between render threads.

use std::time::Instant;

use log::{info, warn};
use pbgi_math::{Aabb, Ray, Vec3};

use crate::bvh::SceneBvh;
use crate::camera::Camera;
use crate::error::{SceneError, SceneResult};
use crate::light::LightSource;
use crate::material::Material;
use crate::mesh::Mesh;

/// Closest surface intersection along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    pub t: f32,
    pub position: Vec3,
    /// Unit shading normal, flipped to face the incoming ray
    pub normal: Vec3,
    /// Whether the ray arrived on the side the mesh normal points to
    pub front_face: bool,
    pub material: Material,
    pub mesh_index: usize,
    pub triangle_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    meshes: Vec<Mesh>,
    lights: Vec<LightSource>,
    camera: Camera,
    bvh: Option<SceneBvh>,
}

impl Scene {
    /// Create an empty scene seen through `camera`.
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            ..Default::default()
        }
    }

    /// Add a mesh and return its index.
    ///
    /// The mesh is validated first. Adding a mesh discards a previously
    /// built hierarchy.
    pub fn add_mesh(&mut self, mesh: Mesh) -> SceneResult<usize> {
        mesh.validate()?;
        if mesh.triangles.is_empty() {
            warn!("Mesh '{}' has no triangles", mesh.name);
        }
        self.bvh = None;
        self.meshes.push(mesh);
        Ok(self.meshes.len() - 1)
    }

    pub fn add_light(&mut self, light: LightSource) {
        self.lights.push(light);
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn lights(&self) -> &[LightSource] {
        &self.lights
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Build the per-mesh triangle trees. Must run before any ray query.
    pub fn build_bvh(&mut self) {
        let start = Instant::now();
        let bvh = SceneBvh::build(&self.meshes);
        info!(
            "Built BVH over {} triangles ({} nodes) in {:.2?}",
            self.triangle_count(),
            bvh.node_count(),
            start.elapsed()
        );
        self.bvh = Some(bvh);
    }

    /// The built hierarchy, or [`SceneError::BvhNotBuilt`].
    pub fn bvh(&self) -> SceneResult<&SceneBvh> {
        self.bvh.as_ref().ok_or(SceneError::BvhNotBuilt)
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }

    /// Bounding box of every mesh.
    pub fn bounds(&self) -> Aabb {
        self.meshes
            .iter()
            .fold(Aabb::EMPTY, |acc, mesh| Aabb::surrounding(&acc, &mesh.bounds))
    }

    /// Closest hit along `ray`. Returns `None` on a miss, and also when the
    /// hierarchy has not been built (callers check [`Scene::bvh`] up front).
    pub fn trace_closest_hit(&self, ray: &Ray) -> Option<SceneHit> {
        let bvh = self.bvh.as_ref()?;
        let hit = bvh.hit(&self.meshes, ray)?;

        let mesh = &self.meshes[hit.mesh_index];
        let tri = mesh.triangles[hit.triangle_index];
        let weights = hit.hit.barycentric();

        let outward = mesh.interpolate_normal(tri, weights);
        let front_face = ray.direction.dot(outward) < 0.0;

        Some(SceneHit {
            t: hit.t,
            position: ray.at(hit.t),
            normal: if front_face { outward } else { -outward },
            front_face,
            material: mesh.material,
            mesh_index: hit.mesh_index,
            triangle_index: hit.triangle_index,
        })
    }

    /// Whether anything blocks the segment from `origin` to `target`.
    ///
    /// Hits within `epsilon` of the target do not count, so a light sitting
    /// on an emissive surface is not shadowed by that surface. The
    /// hierarchy must be built; without it nothing is ever occluded.
    pub fn occluded(&self, origin: Vec3, target: Vec3, epsilon: f32) -> bool {
        debug_assert!(self.bvh.is_some(), "occlusion query before Scene::build_bvh");
        let distance = (target - origin).length();
        if distance <= epsilon {
            return false;
        }
        let ray = Ray::towards(origin, target);
        self.trace_closest_hit(&ray)
            .is_some_and(|hit| hit.t < distance - epsilon)
    }
}
