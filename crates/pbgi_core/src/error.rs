use thiserror::Error;

/// Errors raised while assembling or querying a scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Triangle hierarchy has not been built (call Scene::build_bvh first)")]
    BvhNotBuilt,

    #[error("Mesh '{mesh}': triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    InvalidTriangle {
        mesh: String,
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("Mesh '{mesh}': {normal_count} normals for {vertex_count} vertices")]
    NormalCountMismatch {
        mesh: String,
        normal_count: usize,
        vertex_count: usize,
    },

    #[error("Invalid render configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;
