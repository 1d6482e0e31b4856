//! Texture storage and lookup.
//!
//! A texture is backed by exactly one of four pixel grids: float or byte,
//! color or scalar. Byte grids are display-encoded; lookups decode them to
//! linear unless the caller asks for the raw values (`ldr_as_linear`), which
//! is what non-color parameter maps like roughness or opacity want.

use ember_math::{Vec2, Vec3};

/// The backing pixel grid of a texture.
#[derive(Debug, Clone)]
pub enum Texels {
    /// Linear float RGB.
    ColorF(Vec<Vec3>),
    /// sRGB-encoded byte RGB.
    ColorB(Vec<[u8; 3]>),
    /// Linear float scalar.
    ScalarF(Vec<f32>),
    /// sRGB-encoded byte scalar.
    ScalarB(Vec<u8>),
}

/// A texture image. The default texture is empty and evaluates to white.
#[derive(Debug, Clone)]
pub struct Texture {
    width: usize,
    height: usize,
    texels: Texels,
}

impl Default for Texture {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            texels: Texels::ColorF(Vec::new()),
        }
    }
}

impl Texture {
    /// Create a texture from a pixel grid.
    ///
    /// Panics if the grid length does not match `width * height`; textures
    /// are built programmatically, so a mismatch is a construction bug.
    pub fn new(width: usize, height: usize, texels: Texels) -> Self {
        let len = match &texels {
            Texels::ColorF(p) => p.len(),
            Texels::ColorB(p) => p.len(),
            Texels::ScalarF(p) => p.len(),
            Texels::ScalarB(p) => p.len(),
        };
        assert_eq!(len, width * height, "texel count must match dimensions");
        Self {
            width,
            height,
            texels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Fetch the texel at integer coordinates as linear RGB.
    fn lookup(&self, i: usize, j: usize, ldr_as_linear: bool) -> Vec3 {
        let idx = j * self.width + i;
        match &self.texels {
            Texels::ColorF(pixels) => pixels[idx],
            Texels::ColorB(pixels) => {
                let [r, g, b] = pixels[idx];
                if ldr_as_linear {
                    Vec3::new(byte_to_float(r), byte_to_float(g), byte_to_float(b))
                } else {
                    Vec3::new(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b))
                }
            }
            Texels::ScalarF(pixels) => Vec3::splat(pixels[idx]),
            Texels::ScalarB(pixels) => {
                let s = pixels[idx];
                if ldr_as_linear {
                    Vec3::splat(byte_to_float(s))
                } else {
                    Vec3::splat(srgb_to_linear(s))
                }
            }
        }
    }
}

/// Evaluate a texture at uv with tiled addressing and bilinear filtering.
///
/// A missing or empty texture evaluates to white, so material parameters can
/// multiply by the lookup unconditionally. Coordinates wrap with period one
/// in both axes, including for negative uv.
pub fn eval_texture(texture: Option<&Texture>, uv: Vec2, ldr_as_linear: bool) -> Vec3 {
    let Some(texture) = texture.filter(|t| !t.is_empty()) else {
        return Vec3::ONE;
    };
    let width = texture.width;
    let height = texture.height;

    // coordinates normalized for tiling, negative residues wrapped up
    let mut s = uv.x.fract() * width as f32;
    let mut t = uv.y.fract() * height as f32;
    if s < 0.0 {
        s += width as f32;
    }
    if t < 0.0 {
        t += height as f32;
    }

    // anchor texels and bilinear weights; opposite anchors wrap around
    let i = (s as usize).min(width - 1);
    let j = (t as usize).min(height - 1);
    let ii = (i + 1) % width;
    let jj = (j + 1) % height;
    let u = s - i as f32;
    let v = t - j as f32;

    texture.lookup(i, j, ldr_as_linear) * (1.0 - u) * (1.0 - v)
        + texture.lookup(i, jj, ldr_as_linear) * (1.0 - u) * v
        + texture.lookup(ii, j, ldr_as_linear) * u * (1.0 - v)
        + texture.lookup(ii, jj, ldr_as_linear) * u * v
}

/// Evaluate a texture as a scalar: the first channel of [`eval_texture`].
pub fn eval_texture_scalar(texture: Option<&Texture>, uv: Vec2, ldr_as_linear: bool) -> f32 {
    eval_texture(texture, uv, ldr_as_linear).x
}

/// Scale a byte value to [0, 1] without decoding.
fn byte_to_float(value: u8) -> f32 {
    value as f32 / 255.0
}

/// Convert an sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = byte_to_float(value);
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}
