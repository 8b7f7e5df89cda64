//! Built-in scenes.

use pbgi_core::{Camera, Color, LightSource, Material, Mesh, Scene, SceneResult};
use pbgi_math::Vec3;

/// Emission strength of the ceiling and the light panel.
const LIGHT_STRENGTH: f32 = 2.0;

/// Unit Cornell box centered on the origin, open towards +Z.
///
/// The ceiling glows, a smaller panel hangs just below it and a matching
/// area light feeds the direct-lighting pass.
pub fn cornell_box(aspect: f32) -> SceneResult<Scene> {
    let white = Material::diffuse(Color::ONE);
    let red = Material::diffuse(Color::new(0.8, 0.0, 0.0));
    let light = Material::emissive(Color::ONE, LIGHT_STRENGTH);

    let camera = Camera::new(Vec3::new(0.0, 0.0, 1.2), Vec3::ZERO, Vec3::Y, 60.0, aspect);
    let mut scene = Scene::new(camera);

    let walls = [
        ("back", Vec3::new(0.0, 0.0, -0.5), Vec3::Z, Vec3::X, 1.0, white),
        ("left", Vec3::new(-0.5, 0.0, 0.0), Vec3::X, Vec3::NEG_Z, 1.0, red),
        ("right", Vec3::new(0.5, 0.0, 0.0), Vec3::NEG_X, Vec3::Z, 1.0, red),
        ("ceiling", Vec3::new(0.0, 0.5, 0.0), Vec3::NEG_Y, Vec3::X, 1.01, light),
        ("floor", Vec3::new(0.0, -0.5, 0.0), Vec3::Y, Vec3::X, 1.0, white),
        ("light", Vec3::new(0.0, 0.45, 0.0), Vec3::NEG_Y, Vec3::X, 0.2, light),
    ];
    for (name, center, normal, u, side, material) in walls {
        scene.add_mesh(Mesh::quad(center, normal, u, side, material).with_name(name))?;
    }

    scene.add_light(LightSource::area(
        Vec3::new(0.0, 0.45, 0.0),
        Vec3::new(0.0, -0.5, 0.0),
        0.2,
        Color::ONE,
        LIGHT_STRENGTH,
    ));

    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbgi_math::Ray;

    #[test]
    fn test_cornell_box_layout() {
        let mut scene = cornell_box(1.0).unwrap();
        assert_eq!(scene.meshes().len(), 6);
        assert_eq!(scene.lights().len(), 1);
        assert_eq!(scene.triangle_count(), 12);

        scene.build_bvh();
        let hit = scene
            .trace_closest_hit(&Ray::new(Vec3::new(0.1, 0.0, 0.3), Vec3::NEG_Y))
            .unwrap();
        assert!((hit.t - 0.5).abs() < 1e-4);
        assert!(!hit.material.is_emissive());
        assert!(hit.normal.dot(Vec3::Y) > 0.99);
    }

    #[test]
    fn test_light_panel_is_below_ceiling() {
        let mut scene = cornell_box(1.0).unwrap();
        scene.build_bvh();
        let hit = scene
            .trace_closest_hit(&Ray::new(Vec3::new(0.03, 0.0, 0.05), Vec3::Y))
            .unwrap();
        assert!((hit.t - 0.45).abs() < 1e-4);
        assert!(hit.material.is_emissive());
    }
}
