//! Environment lights and their evaluation on ray misses.

use ember_math::{Frame, Ray, Vec2, Vec3};
use std::f32::consts::PI;

use crate::texture::eval_texture;
use crate::{Scene, TextureId};

/// An environment light: constant emission modulated by an optional
/// lat-long texture, oriented by a frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct Environment {
    pub frame: Frame,
    pub emission: Vec3,
    pub emission_tex: Option<TextureId>,
}

impl Environment {
    pub fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    pub fn set_emission(&mut self, emission: Vec3, emission_tex: Option<TextureId>) {
        self.emission = emission;
        self.emission_tex = emission_tex;
    }
}

impl Scene {
    /// Total environment emission along a ray that missed all geometry.
    ///
    /// The ray direction is mapped into each environment's local frame and
    /// looked up through the lat-long parameterization: azimuth as u
    /// (wrapped to [0, 1)), inclination as v.
    pub fn eval_environment(&self, ray: &Ray) -> Vec3 {
        let mut emission = Vec3::ZERO;
        for environment in &self.environments {
            let local = environment
                .frame
                .inverse(false)
                .transform_direction(ray.direction);
            let mut texcoord = Vec2::new(
                local.z.atan2(local.x) / (2.0 * PI),
                local.y.clamp(-1.0, 1.0).acos() / PI,
            );
            if texcoord.x < 0.0 {
                texcoord.x += 1.0;
            }
            emission += environment.emission
                * eval_texture(self.texture(environment.emission_tex), texcoord, false);
        }
        emission
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Texels;
    use crate::Texture;

    #[test]
    fn test_constant_environment() {
        let mut scene = Scene::new();
        let env = scene.add_environment();
        scene
            .environment_mut(env)
            .set_emission(Vec3::splat(0.5), None);

        for direction in [Vec3::X, -Vec3::X, Vec3::Y, Vec3::Z, -Vec3::Z] {
            let ray = Ray::new(Vec3::ZERO, direction);
            assert!((scene.eval_environment(&ray) - Vec3::splat(0.5)).length() < 1e-6);
        }
    }

    #[test]
    fn test_environments_accumulate() {
        let mut scene = Scene::new();
        for _ in 0..2 {
            let env = scene.add_environment();
            scene.environment_mut(env).set_emission(Vec3::ONE, None);
        }

        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!((scene.eval_environment(&ray) - Vec3::splat(2.0)).length() < 1e-6);
    }

    #[test]
    fn test_latlong_poles() {
        // Texture with distinct top and bottom rows
        let mut scene = Scene::new();
        let tex = scene.add_texture();
        *scene.texture_mut(tex) = Texture::new(
            1,
            2,
            Texels::ColorF(vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)]),
        );
        let env = scene.add_environment();
        scene.environment_mut(env).set_emission(Vec3::ONE, Some(tex));

        // +Y is the zenith (v = 0, top row); the equator lands on v = 0.5,
        // which anchors exactly on the second row
        let up = scene.eval_environment(&Ray::new(Vec3::ZERO, Vec3::Y));
        let equator = scene.eval_environment(&Ray::new(Vec3::ZERO, Vec3::X));
        assert!((up - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
        assert!((equator - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_no_environment_is_black() {
        let scene = Scene::new();
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert_eq!(scene.eval_environment(&ray), Vec3::ZERO);
    }
}
