//! Ember Scene - scene graph and evaluation for CPU path tracing.
//!
//! This crate provides:
//!
//! - **Scene graph types**: `Scene`, `Camera`, `Texture`, `Shape`,
//!   `Material`, `Instance`, `Environment`, all owned by value and
//!   cross-referenced through plain index handles
//! - **Evaluation**: texture lookup, camera ray generation, shape attribute
//!   interpolation, and environment emission
//!
//! # Example
//!
//! ```
//! use ember_math::{Frame, Vec3};
//! use ember_scene::Scene;
//!
//! let mut scene = Scene::new();
//! let shape = scene.add_shape();
//! scene.shape_mut(shape).positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
//! scene.shape_mut(shape).triangles = vec![[0, 1, 2]];
//! let material = scene.add_material();
//! scene.add_instance(Frame::IDENTITY, shape, material);
//! assert_eq!(scene.instances.len(), 1);
//! ```

pub mod camera;
pub mod environment;
pub mod material;
pub mod scene;
pub mod shape;
pub mod texture;

pub use camera::Camera;
pub use environment::Environment;
pub use material::Material;
pub use scene::{
    CameraId, EnvironmentId, Instance, InstanceId, MaterialId, Scene, SceneError, ShapeId,
    TextureId,
};
pub use shape::Shape;
pub use texture::{eval_texture, eval_texture_scalar, Texels, Texture};
