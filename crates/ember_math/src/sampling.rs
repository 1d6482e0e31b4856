//! Random number generation and the sampling/BSDF helpers the shading
//! kernel is built from.

use crate::{Vec2, Vec3};
use rand::Rng;
use std::f32::consts::PI;

/// The per-pixel random number generator.
///
/// PCG32 keeps pixels decorrelated through its stream id: generators built
/// with the same seed but different streams produce independent sequences,
/// which is what makes renders reproducible per pixel.
pub type RngState = rand_pcg::Pcg32;

/// Construct a PCG32 from an explicit seed and stream id.
pub fn make_rng(seed: u64, stream: u64) -> RngState {
    rand_pcg::Pcg32::new(seed, stream)
}

/// Draw one uniform f32 in [0, 1).
#[inline]
pub fn rand1f(rng: &mut RngState) -> f32 {
    rng.gen()
}

/// Draw two uniform f32 in [0, 1), x first.
#[inline]
pub fn rand2f(rng: &mut RngState) -> Vec2 {
    let x = rng.gen();
    let y = rng.gen();
    Vec2::new(x, y)
}

/// Mirror a direction about a normal; both point away from the surface.
#[inline]
pub fn reflect(w: Vec3, n: Vec3) -> Vec3 {
    2.0 * n.dot(w) * n - w
}

/// Re-orthogonalize `a` against unit vector `b`.
#[inline]
pub fn orthonormalize(a: Vec3, b: Vec3) -> Vec3 {
    (a - b * a.dot(b)).normalize()
}

/// Schlick's approximation of the Fresnel reflection coefficient.
pub fn fresnel_schlick(f0: Vec3, normal: Vec3, outgoing: Vec3) -> Vec3 {
    if f0 == Vec3::ZERO {
        return Vec3::ZERO;
    }
    let cosine = normal.dot(outgoing);
    f0 + (Vec3::ONE - f0) * (1.0 - cosine.abs()).clamp(0.0, 1.0).powi(5)
}

/// GGX microfacet normal distribution.
///
/// `alpha` is the material's stored roughness, which is already the squared
/// perceptual value.
pub fn microfacet_distribution(alpha: f32, normal: Vec3, halfway: Vec3) -> f32 {
    let cosine = normal.dot(halfway);
    if cosine <= 0.0 {
        return 0.0;
    }
    let alpha2 = alpha * alpha;
    let cosine2 = cosine * cosine;
    alpha2 / (PI * (cosine2 * (alpha2 - 1.0) + 1.0).powi(2))
}

fn microfacet_g1(alpha: f32, normal: Vec3, halfway: Vec3, direction: Vec3) -> f32 {
    let cosine = normal.dot(direction);
    if cosine * halfway.dot(direction) <= 0.0 {
        return 0.0;
    }
    let cosine2 = cosine * cosine;
    let tangent2 = ((1.0 - cosine2) / cosine2).max(0.0);
    2.0 / (1.0 + (1.0 + alpha * alpha * tangent2).sqrt())
}

/// Smith masking-shadowing term for the GGX distribution.
pub fn microfacet_shadowing(
    alpha: f32,
    normal: Vec3,
    halfway: Vec3,
    outgoing: Vec3,
    incoming: Vec3,
) -> f32 {
    microfacet_g1(alpha, normal, halfway, outgoing) * microfacet_g1(alpha, normal, halfway, incoming)
}

/// Sample a cosine-weighted direction on the hemisphere around `normal`.
///
/// Uses Malley's method: sample uniformly on the unit disk, project up.
/// The matching density is [`sample_hemisphere_cos_pdf`].
pub fn sample_hemisphere_cos(normal: Vec3, ruv: Vec2) -> Vec3 {
    let radius = ruv.x.sqrt();
    let phi = 2.0 * PI * ruv.y;
    let x = radius * phi.cos();
    let y = radius * phi.sin();
    let z = (1.0 - ruv.x).sqrt();

    let (tangent, bitangent) = build_tangent_basis(normal);
    x * tangent + y * bitangent + z * normal
}

/// Density of [`sample_hemisphere_cos`]: cos(theta) / pi above the surface,
/// zero below.
pub fn sample_hemisphere_cos_pdf(normal: Vec3, direction: Vec3) -> f32 {
    let cosine = normal.dot(direction);
    if cosine <= 0.0 {
        0.0
    } else {
        cosine / PI
    }
}

/// Build an orthonormal tangent/bitangent from a unit normal.
fn build_tangent_basis(n: Vec3) -> (Vec3, Vec3) {
    let sign = if n.z >= 0.0 { 1.0 } else { -1.0 };
    let a = -1.0 / (sign + n.z);
    let b = n.x * n.y * a;

    let tangent = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
    let bitangent = Vec3::new(b, sign + n.y * n.y * a, -n.y);

    (tangent, bitangent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_streams_decorrelate() {
        let mut a = make_rng(42, 1);
        let mut b = make_rng(42, 2);
        let seq_a: Vec<f32> = (0..8).map(|_| rand1f(&mut a)).collect();
        let seq_b: Vec<f32> = (0..8).map(|_| rand1f(&mut b)).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn test_rng_reproducible() {
        let mut a = make_rng(7, 13);
        let mut b = make_rng(7, 13);
        for _ in 0..16 {
            assert_eq!(rand1f(&mut a), rand1f(&mut b));
        }
    }

    #[test]
    fn test_reflect() {
        let n = Vec3::Z;
        let w = Vec3::new(1.0, 0.0, 1.0).normalize();
        let r = reflect(w, n);
        assert!((r - Vec3::new(-1.0, 0.0, 1.0).normalize()).length() < 1e-6);

        // Normal incidence reflects onto itself
        assert!((reflect(Vec3::Z, Vec3::Z) - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_orthonormalize() {
        let a = Vec3::new(1.0, 1.0, 0.0);
        let b = Vec3::X;
        let o = orthonormalize(a, b);
        assert!(o.dot(b).abs() < 1e-6);
        assert!((o.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fresnel_schlick_limits() {
        let f0 = Vec3::splat(0.04);
        // Head-on: the coefficient is f0
        let head_on = fresnel_schlick(f0, Vec3::Z, Vec3::Z);
        assert!((head_on - f0).length() < 1e-6);

        // Grazing: approaches one
        let grazing = fresnel_schlick(f0, Vec3::Z, Vec3::X);
        assert!((grazing - Vec3::ONE).length() < 1e-5);

        // Black f0 stays black
        assert_eq!(fresnel_schlick(Vec3::ZERO, Vec3::Z, Vec3::Z), Vec3::ZERO);
    }

    #[test]
    fn test_microfacet_distribution_normalizes_around_normal() {
        // A smoother surface concentrates density on the normal
        let rough = microfacet_distribution(0.5, Vec3::Z, Vec3::Z);
        let polished = microfacet_distribution(0.05, Vec3::Z, Vec3::Z);
        assert!(polished > rough);

        // Below-horizon halfway vectors contribute nothing
        assert_eq!(microfacet_distribution(0.5, Vec3::Z, -Vec3::Z), 0.0);
    }

    #[test]
    fn test_microfacet_shadowing_range() {
        let n = Vec3::Z;
        let wo = Vec3::new(0.3, 0.0, 1.0).normalize();
        let wi = Vec3::new(-0.4, 0.2, 1.0).normalize();
        let h = (wo + wi).normalize();
        let g = microfacet_shadowing(0.25, n, h, wo, wi);
        assert!(g > 0.0 && g <= 1.0);

        // Below-horizon direction shadows out entirely
        assert_eq!(microfacet_shadowing(0.25, n, h, wo, -wi), 0.0);
    }

    #[test]
    fn test_sample_hemisphere_cos() {
        let mut rng = make_rng(3, 5);
        let normal = Vec3::new(0.3, -0.5, 0.8).normalize();
        for _ in 0..256 {
            let dir = sample_hemisphere_cos(normal, rand2f(&mut rng));
            assert!((dir.length() - 1.0).abs() < 1e-4);
            assert!(normal.dot(dir) >= 0.0);
            assert!(sample_hemisphere_cos_pdf(normal, dir) > 0.0);
        }
    }

    #[test]
    fn test_hemisphere_pdf_below_surface() {
        assert_eq!(sample_hemisphere_cos_pdf(Vec3::Z, -Vec3::Z), 0.0);
    }
}
