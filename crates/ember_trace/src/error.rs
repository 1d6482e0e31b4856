//! Errors surfaced by the render entry points.

use ember_scene::SceneError;
use thiserror::Error;

/// Invalid render configuration or an unrenderable scene.
///
/// Configuration problems are caught at pass entry; scene problems are
/// caught when the BVH is built. Per-ray numerical issues never surface
/// here, they are recovered locally with zero contributions.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("resolution must be positive, got {0}")]
    InvalidResolution(i32),

    #[error("bounces must be non-negative, got {0}")]
    InvalidBounces(i32),

    #[error("camera film must be non-empty, got {0}x{1}")]
    EmptyFilm(f32, f32),

    #[error("unknown shader \"{0}\"")]
    UnknownShader(String),

    #[error(transparent)]
    Scene(#[from] SceneError),
}
