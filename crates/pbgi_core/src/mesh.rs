//! Triangle mesh geometry.
//!
//! Meshes are plain position/normal/index arrays plus one material. File
//! parsing lives outside this crate; loaders fill a `Mesh` and hand it to
//! [`crate::Scene::add_mesh`], which checks the invariants below.

use pbgi_math::{Aabb, Vec3};

use crate::error::{SceneError, SceneResult};
use crate::material::Material;

/// A mesh consisting of vertex positions, optional normals, and triangles.
///
/// Invariants (checked by [`Mesh::validate`]): every triangle index is a
/// valid vertex index, and `normals` is either empty or has one entry per
/// vertex.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Name used in log and error messages
    pub name: String,

    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (empty means "use the face normal")
    pub normals: Vec<Vec3>,

    /// Triangle vertex indices
    pub triangles: Vec<[u32; 3]>,

    /// Surface material
    pub material: Material,

    /// Axis-aligned bounding box of all positions
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and triangles, optionally with normals.
    ///
    /// Missing normals are NOT computed; call [`Mesh::compute_normals`]
    /// explicitly if smooth shading is wanted.
    pub fn new(
        positions: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
        normals: Option<Vec<Vec3>>,
        material: Material,
    ) -> Self {
        let bounds = Aabb::enclosing(positions.iter().copied());
        Self {
            name: String::from("mesh"),
            positions,
            normals: normals.unwrap_or_default(),
            triangles,
            material,
            bounds,
        }
    }

    /// Set the mesh name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Square made of two triangles, centered at `center`, facing `normal`.
    ///
    /// `u` orients one pair of edges; it does not need to be exactly
    /// perpendicular to `normal`.
    pub fn quad(center: Vec3, normal: Vec3, u: Vec3, side: f32, material: Material) -> Self {
        let n = normal.normalize();
        let v = n.cross(u).normalize();
        let u = v.cross(n);
        let half = side * 0.5;

        let positions = vec![
            center - (u + v) * half,
            center + (v - u) * half,
            center + (u + v) * half,
            center + (u - v) * half,
        ];
        // Wound so the geometric normal agrees with `normal`.
        let triangles = vec![[0, 2, 1], [0, 3, 2]];

        Self::new(positions, triangles, Some(vec![n; 4]), material).with_name("quad")
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Face normals are accumulated unnormalized, so larger faces weigh more.
    /// Vertices that belong to no (non-degenerate) face get +Y.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];

        for &tri in &self.triangles {
            let [p0, p1, p2] = self.vertices(tri);
            let face_normal = (p1 - p0).cross(p2 - p0);
            for index in tri {
                if let Some(n) = normals.get_mut(index as usize) {
                    *n += face_normal;
                }
            }
        }

        for normal in &mut normals {
            *normal = if normal.length_squared() > 0.0 {
                normal.normalize()
            } else {
                Vec3::Y
            };
        }

        self.normals = normals;
    }

    /// Check the index and normal invariants.
    pub fn validate(&self) -> SceneResult<()> {
        let vertex_count = self.positions.len();

        if !self.normals.is_empty() && self.normals.len() != vertex_count {
            return Err(SceneError::NormalCountMismatch {
                mesh: self.name.clone(),
                normal_count: self.normals.len(),
                vertex_count,
            });
        }

        for (triangle, tri) in self.triangles.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(SceneError::InvalidTriangle {
                    mesh: self.name.clone(),
                    triangle,
                    index,
                    vertex_count,
                });
            }
        }

        Ok(())
    }

    /// Uniformly scale all positions about the origin.
    pub fn scale(&mut self, factor: f32) {
        for p in &mut self.positions {
            *p *= factor;
        }
        self.bounds = Aabb::enclosing(self.positions.iter().copied());
    }

    /// Move all positions by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p += offset;
        }
        self.bounds = Aabb::enclosing(self.positions.iter().copied());
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Positions of the three vertices referenced by `tri`.
    #[inline]
    pub fn vertices(&self, tri: [u32; 3]) -> [Vec3; 3] {
        tri.map(|i| self.positions[i as usize])
    }

    /// Positions of triangle number `index`.
    #[inline]
    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        self.vertices(self.triangles[index])
    }

    /// Unit geometric normal, from the winding order.
    pub fn face_normal(&self, tri: [u32; 3]) -> Vec3 {
        let [p0, p1, p2] = self.vertices(tri);
        (p1 - p0).cross(p2 - p0).normalize_or_zero()
    }

    pub fn area(&self, tri: [u32; 3]) -> f32 {
        let [p0, p1, p2] = self.vertices(tri);
        (p1 - p0).cross(p2 - p0).length() * 0.5
    }

    pub fn barycenter(&self, tri: [u32; 3]) -> Vec3 {
        let [p0, p1, p2] = self.vertices(tri);
        (p0 + p1 + p2) / 3.0
    }

    /// Position at barycentric weights `w` (one weight per vertex).
    pub fn interpolate_position(&self, tri: [u32; 3], w: Vec3) -> Vec3 {
        let [p0, p1, p2] = self.vertices(tri);
        p0 * w.x + p1 * w.y + p2 * w.z
    }

    /// Unit shading normal at barycentric weights `w`.
    ///
    /// Falls back to the face normal when the mesh has no vertex normals or
    /// the interpolated normal vanishes.
    pub fn interpolate_normal(&self, tri: [u32; 3], w: Vec3) -> Vec3 {
        if self.normals.is_empty() {
            return self.face_normal(tri);
        }
        let [n0, n1, n2] = tri.map(|i| self.normals[i as usize]);
        let n = n0 * w.x + n1 * w.y + n2 * w.z;
        if n.length_squared() > 0.0 {
            n.normalize()
        } else {
            self.face_normal(tri)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grey() -> Material {
        Material::diffuse(Vec3::splat(0.5))
    }

    fn single_triangle() -> Mesh {
        Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![[0, 1, 2]],
            None,
            grey(),
        )
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = single_triangle();

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.normals.is_empty());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_compute_normals() {
        let mut mesh = single_triangle();
        mesh.compute_normals();

        assert_eq!(mesh.normals.len(), 3);
        // Counter-clockwise in XY viewed from +Z
        for normal in &mesh.normals {
            assert!((normal.z - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_bounds_computation() {
        let mesh = Mesh::new(
            vec![Vec3::new(-1.0, -2.0, -3.0), Vec3::new(4.0, 5.0, 6.0), Vec3::ZERO],
            vec![[0, 1, 2]],
            None,
            grey(),
        );

        assert_eq!(mesh.bounds.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(mesh.bounds.max, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 3]], None, grey());

        assert!(matches!(
            mesh.validate(),
            Err(SceneError::InvalidTriangle { index: 3, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_normal_mismatch() {
        let mesh = Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![[0, 1, 2]],
            Some(vec![Vec3::Z]),
            grey(),
        );

        assert!(matches!(
            mesh.validate(),
            Err(SceneError::NormalCountMismatch { normal_count: 1, .. })
        ));
    }

    #[test]
    fn test_quad_geometry() {
        let quad = Mesh::quad(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y, Vec3::X, 2.0, grey());

        assert_eq!(quad.triangle_count(), 2);
        let total_area: f32 = quad.triangles.iter().map(|&t| quad.area(t)).sum();
        assert!((total_area - 4.0).abs() < 1e-5);
        for &tri in &quad.triangles {
            assert!((quad.face_normal(tri) - Vec3::NEG_Y).length() < 1e-5);
        }
        assert!((quad.bounds.min.y - 1.0).abs() < 1e-6);
        assert!((quad.bounds.max.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_interpolation() {
        let mesh = single_triangle();
        let p = mesh.interpolate_position([0, 1, 2], Vec3::new(0.5, 0.25, 0.25));

        assert!((p - Vec3::new(0.25, 0.25, 0.0)).length() < 1e-6);
        assert!((mesh.interpolate_normal([0, 1, 2], Vec3::splat(1.0 / 3.0)) - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_translate_updates_bounds() {
        let mut mesh = single_triangle();
        mesh.translate(Vec3::new(0.0, -0.35, 0.0));
        mesh.scale(2.0);

        assert!((mesh.bounds.min.y + 0.7).abs() < 1e-6);
        assert!((mesh.bounds.max.x - 2.0).abs() < 1e-6);
    }
}
