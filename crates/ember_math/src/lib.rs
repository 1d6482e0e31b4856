// Re-export glam for convenience
pub use glam::*;

// Ember math types
mod aabb;
mod frame;
mod intersect;
mod ray;
mod sampling;

pub use aabb::Aabb;
pub use frame::Frame;
pub use intersect::{
    intersect_line, intersect_point, intersect_triangle, line_bounds, point_bounds,
    triangle_bounds,
};
pub use ray::{Ray, RAY_EPS};
pub use sampling::{
    fresnel_schlick, make_rng, microfacet_distribution, microfacet_shadowing, orthonormalize,
    rand1f, rand2f, reflect, sample_hemisphere_cos, sample_hemisphere_cos_pdf, RngState,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_reexport() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a * b, Vec3::new(4.0, 10.0, 18.0));
    }
}
