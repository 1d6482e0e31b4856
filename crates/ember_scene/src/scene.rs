//! Scene graph container.
//!
//! The scene owns every entity by value in parallel arrays; entities refer
//! to each other through plain index handles. This keeps the ownership graph
//! acyclic and copies trivially safe: an instance is just a frame plus two
//! ids into the shape and material arrays.

use ember_math::Frame;
use thiserror::Error;

use crate::{Camera, Environment, Material, Shape, Texture};

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u32);
    };
}

define_id!(/// Handle to a camera stored on the scene.
    CameraId);
define_id!(/// Handle to a texture stored on the scene.
    TextureId);
define_id!(/// Handle to a shape stored on the scene.
    ShapeId);
define_id!(/// Handle to a material stored on the scene.
    MaterialId);
define_id!(/// Handle to an instance stored on the scene.
    InstanceId);
define_id!(/// Handle to an environment stored on the scene.
    EnvironmentId);

/// A placed shape: world frame plus shape and material references.
///
/// The shape and material are shared between instances and outlive them.
#[derive(Debug, Clone, Copy)]
pub struct Instance {
    pub frame: Frame,
    pub shape: ShapeId,
    pub material: MaterialId,
}

/// Errors reported by [`Scene::validate`] for scenes that cannot be rendered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("shape {shape}: element index {index} out of range for {vertices} vertices")]
    IndexOutOfRange {
        shape: usize,
        index: u32,
        vertices: usize,
    },

    #[error("shape {shape}: {attribute} has {got} entries, expected {vertices}")]
    AttributeLength {
        shape: usize,
        attribute: &'static str,
        got: usize,
        vertices: usize,
    },

    #[error("shape {shape}: points and lines require a per-vertex radius")]
    MissingRadius { shape: usize },

    #[error("instance {instance}: shape id {id} out of range")]
    DanglingShape { instance: usize, id: u32 },

    #[error("instance {instance}: material id {id} out of range")]
    DanglingMaterial { instance: usize, id: u32 },

    #[error("{owner}: texture id {id} out of range")]
    DanglingTexture { owner: String, id: u32 },
}

/// A complete scene: cameras, textures, shapes, materials, instances and
/// environments.
#[derive(Debug, Default)]
pub struct Scene {
    pub cameras: Vec<Camera>,
    pub textures: Vec<Texture>,
    pub shapes: Vec<Shape>,
    pub materials: Vec<Material>,
    pub instances: Vec<Instance>,
    pub environments: Vec<Environment>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a default camera and return its handle.
    pub fn add_camera(&mut self) -> CameraId {
        self.cameras.push(Camera::default());
        CameraId(self.cameras.len() as u32 - 1)
    }

    /// Add an empty texture (evaluates to white) and return its handle.
    pub fn add_texture(&mut self) -> TextureId {
        self.textures.push(Texture::default());
        TextureId(self.textures.len() as u32 - 1)
    }

    /// Add an empty shape and return its handle.
    pub fn add_shape(&mut self) -> ShapeId {
        self.shapes.push(Shape::default());
        ShapeId(self.shapes.len() as u32 - 1)
    }

    /// Add a default material and return its handle.
    pub fn add_material(&mut self) -> MaterialId {
        self.materials.push(Material::default());
        MaterialId(self.materials.len() as u32 - 1)
    }

    /// Add an instance of a shape with a material, placed at `frame`.
    pub fn add_instance(
        &mut self,
        frame: Frame,
        shape: ShapeId,
        material: MaterialId,
    ) -> InstanceId {
        self.instances.push(Instance {
            frame,
            shape,
            material,
        });
        InstanceId(self.instances.len() as u32 - 1)
    }

    /// Add a default environment and return its handle.
    pub fn add_environment(&mut self) -> EnvironmentId {
        self.environments.push(Environment::default());
        EnvironmentId(self.environments.len() as u32 - 1)
    }

    pub fn camera(&self, id: CameraId) -> &Camera {
        &self.cameras[id.0 as usize]
    }

    pub fn camera_mut(&mut self, id: CameraId) -> &mut Camera {
        &mut self.cameras[id.0 as usize]
    }

    pub fn texture_mut(&mut self, id: TextureId) -> &mut Texture {
        &mut self.textures[id.0 as usize]
    }

    pub fn shape(&self, id: ShapeId) -> &Shape {
        &self.shapes[id.0 as usize]
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> &mut Shape {
        &mut self.shapes[id.0 as usize]
    }

    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0 as usize]
    }

    pub fn material_mut(&mut self, id: MaterialId) -> &mut Material {
        &mut self.materials[id.0 as usize]
    }

    pub fn environment_mut(&mut self, id: EnvironmentId) -> &mut Environment {
        &mut self.environments[id.0 as usize]
    }

    /// Resolve an optional texture handle to the texture itself.
    ///
    /// `None` means "no texture", which evaluation treats as white.
    pub fn texture(&self, id: Option<TextureId>) -> Option<&Texture> {
        id.map(|id| &self.textures[id.0 as usize])
    }

    /// Check every cross-reference and per-shape invariant.
    ///
    /// Run before building acceleration structures; a scene that fails here
    /// would index out of bounds during traversal.
    pub fn validate(&self) -> Result<(), SceneError> {
        for (index, shape) in self.shapes.iter().enumerate() {
            validate_shape(index, shape)?;
        }

        for (index, instance) in self.instances.iter().enumerate() {
            if instance.shape.0 as usize >= self.shapes.len() {
                return Err(SceneError::DanglingShape {
                    instance: index,
                    id: instance.shape.0,
                });
            }
            if instance.material.0 as usize >= self.materials.len() {
                return Err(SceneError::DanglingMaterial {
                    instance: index,
                    id: instance.material.0,
                });
            }
        }

        for (index, material) in self.materials.iter().enumerate() {
            for slot in material.texture_slots() {
                self.validate_texture(slot, || format!("material {index}"))?;
            }
        }
        for (index, environment) in self.environments.iter().enumerate() {
            self.validate_texture(environment.emission_tex, || format!("environment {index}"))?;
        }

        Ok(())
    }

    fn validate_texture(
        &self,
        id: Option<TextureId>,
        owner: impl Fn() -> String,
    ) -> Result<(), SceneError> {
        match id {
            Some(id) if id.0 as usize >= self.textures.len() => Err(SceneError::DanglingTexture {
                owner: owner(),
                id: id.0,
            }),
            _ => Ok(()),
        }
    }
}

fn validate_shape(index: usize, shape: &Shape) -> Result<(), SceneError> {
    let vertices = shape.positions.len();

    let check_attr = |attribute: &'static str, got: usize| {
        if got != 0 && got != vertices {
            Err(SceneError::AttributeLength {
                shape: index,
                attribute,
                got,
                vertices,
            })
        } else {
            Ok(())
        }
    };
    check_attr("normals", shape.normals.len())?;
    check_attr("texcoords", shape.texcoords.len())?;
    check_attr("radius", shape.radius.len())?;

    let check_index = |i: u32| {
        if i as usize >= vertices {
            Err(SceneError::IndexOutOfRange {
                shape: index,
                index: i,
                vertices,
            })
        } else {
            Ok(())
        }
    };
    for t in &shape.triangles {
        for &i in t {
            check_index(i)?;
        }
    }
    for l in &shape.lines {
        for &i in l {
            check_index(i)?;
        }
    }
    for &p in &shape.points {
        check_index(p)?;
    }

    if (!shape.points.is_empty() || !shape.lines.is_empty()) && shape.radius.is_empty() {
        return Err(SceneError::MissingRadius { shape: index });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_math::Vec3;

    #[test]
    fn test_builder_handles() {
        let mut scene = Scene::new();
        assert_eq!(scene.add_camera(), CameraId(0));
        assert_eq!(scene.add_camera(), CameraId(1));
        assert_eq!(scene.add_shape(), ShapeId(0));
        assert_eq!(scene.add_material(), MaterialId(0));
        assert_eq!(scene.add_texture(), TextureId(0));
        assert_eq!(scene.add_environment(), EnvironmentId(0));

        let id = scene.add_instance(Frame::IDENTITY, ShapeId(0), MaterialId(0));
        assert_eq!(id, InstanceId(0));
        assert_eq!(scene.instances.len(), 1);
    }

    #[test]
    fn test_validate_ok() {
        let mut scene = Scene::new();
        let shape = scene.add_shape();
        scene.shape_mut(shape).positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        scene.shape_mut(shape).triangles = vec![[0, 1, 2]];
        let material = scene.add_material();
        scene.add_instance(Frame::IDENTITY, shape, material);

        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_validate_index_out_of_range() {
        let mut scene = Scene::new();
        let shape = scene.add_shape();
        scene.shape_mut(shape).positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        scene.shape_mut(shape).triangles = vec![[0, 1, 3]];

        assert!(matches!(
            scene.validate(),
            Err(SceneError::IndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn test_validate_missing_radius() {
        let mut scene = Scene::new();
        let shape = scene.add_shape();
        scene.shape_mut(shape).positions = vec![Vec3::ZERO];
        scene.shape_mut(shape).points = vec![0];

        assert!(matches!(
            scene.validate(),
            Err(SceneError::MissingRadius { shape: 0 })
        ));
    }

    #[test]
    fn test_validate_dangling_instance() {
        let mut scene = Scene::new();
        let shape = scene.add_shape();
        scene.add_instance(Frame::IDENTITY, shape, MaterialId(5));

        assert!(matches!(
            scene.validate(),
            Err(SceneError::DanglingMaterial { id: 5, .. })
        ));
    }

    #[test]
    fn test_validate_attribute_length() {
        let mut scene = Scene::new();
        let shape = scene.add_shape();
        scene.shape_mut(shape).positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        scene.shape_mut(shape).triangles = vec![[0, 1, 2]];
        scene.shape_mut(shape).normals = vec![Vec3::Z];

        assert!(matches!(
            scene.validate(),
            Err(SceneError::AttributeLength { got: 1, .. })
        ));
    }

    #[test]
    fn test_validate_dangling_material_texture() {
        let mut scene = Scene::new();
        let material = scene.add_material();
        scene
            .material_mut(material)
            .set_color(Vec3::ONE, Some(TextureId(9)));

        assert!(matches!(
            scene.validate(),
            Err(SceneError::DanglingTexture { id: 9, .. })
        ));
    }
}
