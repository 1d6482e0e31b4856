//! Ember Trace - CPU path tracing core.
//!
//! A Monte Carlo path tracer over `ember_scene` scenes:
//!
//! - **BVH**: per-shape and instance-level acceleration structures with
//!   flat node arrays and stack traversal
//! - **Shading kernel**: a recursive raytrace integrator plus eyelight,
//!   normal, texcoord and color debug shaders
//! - **Progressive scheduler**: one sample per pixel per pass, row-parallel,
//!   deterministic per-pixel RNG streams, cooperative cancellation
//!
//! # Example
//!
//! ```
//! use ember_math::{Frame, Vec3};
//! use ember_scene::Scene;
//! use ember_trace::{init_bvh, init_state, trace_samples, Params, Shader};
//!
//! let mut scene = Scene::new();
//! let camera = scene.add_camera();
//! scene.camera_mut(camera).set_frame(Frame::look_at(
//!     Vec3::new(0.0, 0.0, 2.0),
//!     Vec3::ZERO,
//!     Vec3::Y,
//! ));
//! let env = scene.add_environment();
//! scene.environment_mut(env).set_emission(Vec3::splat(0.5), None);
//!
//! let params = Params { resolution: 32, samples: 4, ..Default::default() };
//! let bvh = init_bvh(&scene, &params, None).unwrap();
//! let mut state = init_state(scene.camera(camera), &params).unwrap();
//! for _ in 0..params.samples {
//!     trace_samples(&mut state, &scene, &bvh, scene.camera(camera), &params, None).unwrap();
//! }
//! ```

mod bvh;
mod error;
mod shader;
mod state;

pub use bvh::{
    init_bvh, intersect_instance_bvh, intersect_scene_bvh, BvhNode, BvhTree, Intersection,
    ProgressCallback, SceneBvh,
};
pub use error::TraceError;
pub use state::{init_state, trace_samples, Pixel, State};

use std::str::FromStr;

/// The shading function driven over the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shader {
    /// Recursive physically-based estimator.
    #[default]
    Raytrace,
    /// Quick preview: color times view-facing cosine.
    Eyelight,
    /// Shading normal visualization.
    Normal,
    /// Texture coordinate visualization.
    Texcoord,
    /// Flat material color.
    Color,
}

impl FromStr for Shader {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raytrace" => Ok(Shader::Raytrace),
            "eyelight" => Ok(Shader::Eyelight),
            "normal" => Ok(Shader::Normal),
            "texcoord" => Ok(Shader::Texcoord),
            "color" => Ok(Shader::Color),
            other => Err(TraceError::UnknownShader(other.to_string())),
        }
    }
}

/// Render configuration.
#[derive(Debug, Clone)]
pub struct Params {
    /// Image size along the longer film axis, in pixels
    pub resolution: i32,
    /// Which shader to drive over the image
    pub shader: Shader,
    /// Number of passes the caller intends to run
    pub samples: i32,
    /// Recursion depth cap for the raytrace shader
    pub bounces: i32,
    /// Per-sample radiance clamp (chromaticity preserving)
    pub clamp: f32,
    /// RNG seed
    pub seed: u64,
    /// Force single-threaded execution
    pub noparallel: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            resolution: 720,
            shader: Shader::Raytrace,
            samples: 512,
            bounces: 4,
            clamp: 10.0,
            seed: 961748941,
            noparallel: false,
        }
    }
}

impl Params {
    /// Reject configurations the render loop cannot run with.
    pub(crate) fn validate(&self, camera: &ember_scene::Camera) -> Result<(), TraceError> {
        if self.resolution <= 0 {
            return Err(TraceError::InvalidResolution(self.resolution));
        }
        if self.bounces < 0 {
            return Err(TraceError::InvalidBounces(self.bounces));
        }
        if camera.film.x <= 0.0 || camera.film.y <= 0.0 {
            return Err(TraceError::EmptyFilm(camera.film.x, camera.film.y));
        }
        Ok(())
    }
}
