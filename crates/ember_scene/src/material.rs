//! Material parameters and their texture modulation slots.

use ember_math::Vec3;

use crate::TextureId;

/// Surface material.
///
/// Scalar and color parameters can each be modulated by an optional texture;
/// a `None` slot evaluates to white, leaving the base value unchanged.
/// `roughness` stores the microfacet alpha, i.e. the squared perceptual
/// roughness set through [`Material::set_roughness`].
#[derive(Debug, Clone)]
pub struct Material {
    pub emission: Vec3,
    pub color: Vec3,
    pub specular: f32,
    pub metallic: f32,
    pub ior: f32,
    pub transmission: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub scattering: Vec3,
    pub scanisotropy: f32,
    pub trdepth: f32,
    pub thin: bool,

    pub emission_tex: Option<TextureId>,
    pub color_tex: Option<TextureId>,
    pub specular_tex: Option<TextureId>,
    pub metallic_tex: Option<TextureId>,
    pub roughness_tex: Option<TextureId>,
    pub transmission_tex: Option<TextureId>,
    pub opacity_tex: Option<TextureId>,
    pub scattering_tex: Option<TextureId>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            emission: Vec3::ZERO,
            color: Vec3::ZERO,
            specular: 0.0,
            metallic: 0.0,
            ior: 1.5,
            transmission: 0.0,
            roughness: 0.0,
            opacity: 1.0,
            scattering: Vec3::ZERO,
            scanisotropy: 0.0,
            trdepth: 0.01,
            thin: true,
            emission_tex: None,
            color_tex: None,
            specular_tex: None,
            metallic_tex: None,
            roughness_tex: None,
            transmission_tex: None,
            opacity_tex: None,
            scattering_tex: None,
        }
    }
}

impl Material {
    pub fn set_emission(&mut self, emission: Vec3, emission_tex: Option<TextureId>) {
        self.emission = emission;
        self.emission_tex = emission_tex;
    }

    pub fn set_color(&mut self, color: Vec3, color_tex: Option<TextureId>) {
        self.color = color;
        self.color_tex = color_tex;
    }

    pub fn set_specular(&mut self, specular: f32, specular_tex: Option<TextureId>) {
        self.specular = specular;
        self.specular_tex = specular_tex;
    }

    pub fn set_metallic(&mut self, metallic: f32, metallic_tex: Option<TextureId>) {
        self.metallic = metallic;
        self.metallic_tex = metallic_tex;
    }

    pub fn set_ior(&mut self, ior: f32) {
        self.ior = ior;
    }

    pub fn set_transmission(
        &mut self,
        transmission: f32,
        thin: bool,
        trdepth: f32,
        transmission_tex: Option<TextureId>,
    ) {
        self.transmission = transmission;
        self.thin = thin;
        self.trdepth = trdepth;
        self.transmission_tex = transmission_tex;
    }

    pub fn set_thin(&mut self, thin: bool) {
        self.thin = thin;
    }

    /// Set the perceptual roughness; the stored value is its square, which
    /// is what the microfacet terms consume directly.
    pub fn set_roughness(&mut self, roughness: f32, roughness_tex: Option<TextureId>) {
        self.roughness = roughness * roughness;
        self.roughness_tex = roughness_tex;
    }

    pub fn set_opacity(&mut self, opacity: f32, opacity_tex: Option<TextureId>) {
        self.opacity = opacity;
        self.opacity_tex = opacity_tex;
    }

    pub fn set_scattering(
        &mut self,
        scattering: Vec3,
        scanisotropy: f32,
        scattering_tex: Option<TextureId>,
    ) {
        self.scattering = scattering;
        self.scanisotropy = scanisotropy;
        self.scattering_tex = scattering_tex;
    }

    /// All texture slots, for validation.
    pub fn texture_slots(&self) -> [Option<TextureId>; 8] {
        [
            self.emission_tex,
            self.color_tex,
            self.specular_tex,
            self.metallic_tex,
            self.roughness_tex,
            self.transmission_tex,
            self.opacity_tex,
            self.scattering_tex,
        ]
    }
}
