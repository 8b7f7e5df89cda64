//! OBJ model import.

use std::path::Path;

use anyhow::{Context, Result};
use pbgi_core::{Material, Mesh};
use pbgi_math::Vec3;

/// Uniform scale applied to imported models so they fit the built-in box.
pub const MODEL_SCALE: f32 = 0.6;

/// Offset that rests a unit-sized model near the floor of the box.
pub const MODEL_OFFSET: Vec3 = Vec3::new(0.0, -0.35, 0.0);

/// Load every model in an OBJ file into a single mesh.
///
/// Faces are triangulated and file normals are ignored; smooth normals are
/// recomputed after the model is placed.
pub fn load_obj(path: impl AsRef<Path>, material: Material) -> Result<Mesh> {
    let path = path.as_ref();
    log::info!("Loading OBJ: {}", path.display());

    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        },
    )
    .with_context(|| format!("Failed to load OBJ file {}", path.display()))?;

    if models.is_empty() {
        anyhow::bail!("No models found in OBJ file {}", path.display());
    }

    let mut positions = Vec::new();
    let mut triangles = Vec::new();

    for model in &models {
        let mesh = &model.mesh;
        let base = positions.len() as u32;

        positions.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2])),
        );
        triangles.extend(
            mesh.indices
                .chunks_exact(3)
                .map(|f| [base + f[0], base + f[1], base + f[2]]),
        );

        log::debug!(
            "  {}: {} vertices, {} triangles",
            model.name,
            mesh.positions.len() / 3,
            mesh.indices.len() / 3
        );
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("model"));

    let mut mesh = Mesh::new(positions, triangles, None, material).with_name(name);
    mesh.scale(MODEL_SCALE);
    mesh.translate(MODEL_OFFSET);
    mesh.compute_normals();

    log::info!(
        "Loaded '{}': {} vertices, {} triangles",
        mesh.name,
        mesh.vertex_count(),
        mesh.triangle_count()
    );

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbgi_core::Color;
    use std::io::Write;

    fn write_temp_obj(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("pbgi_{}_{}.obj", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_quad_is_triangulated_and_placed() {
        let path = write_temp_obj(
            "quad",
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n",
        );
        let mesh = load_obj(&path, Material::diffuse(Color::ONE)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.normals.len(), 4);
        assert!(mesh.validate().is_ok());

        let expected = Vec3::new(1.0, 1.0, 0.0) * MODEL_SCALE + MODEL_OFFSET;
        assert!(mesh.positions.iter().any(|p| p.distance(expected) < 1e-5));
        for n in &mesh.normals {
            assert!(n.distance(Vec3::Z) < 1e-5);
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("pbgi_does_not_exist.obj");
        assert!(load_obj(path, Material::diffuse(Color::ONE)).is_err());
    }
}
