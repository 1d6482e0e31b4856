//! Ray-primitive intersection routines and primitive bounds.
//!
//! These operate on raw vertex data; the BVH feeds them with positions and
//! radii looked up through its primitive permutation. Each test returns the
//! element-local uv and the ray distance on a hit inside `[tmin, tmax]`.

use crate::{Aabb, Ray, Vec2, Vec3};

/// Möller-Trumbore ray-triangle intersection.
///
/// The returned uv are the barycentric weights of `p1` and `p2`, matching
/// the attribute interpolation convention `p0*(1-u-v) + p1*u + p2*v`.
pub fn intersect_triangle(ray: &Ray, p0: Vec3, p1: Vec3, p2: Vec3) -> Option<(Vec2, f32)> {
    let edge1 = p1 - p0;
    let edge2 = p2 - p0;

    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to the triangle plane (also catches zero-area triangles)
    if a.abs() < 1e-8 {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - p0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t < ray.tmin || t > ray.tmax {
        return None;
    }

    Some((Vec2::new(u, v), t))
}

/// Intersect a ray with a line segment of interpolated radius.
///
/// Finds the closest approach between the ray and the segment and accepts
/// the hit when the gap is inside the lerped radius. uv.x is the position
/// along the segment, uv.y the normalized gap.
pub fn intersect_line(
    ray: &Ray,
    p0: Vec3,
    p1: Vec3,
    r0: f32,
    r1: f32,
) -> Option<(Vec2, f32)> {
    let u = ray.direction;
    let v = p1 - p0;
    let w = ray.origin - p0;

    let a = u.dot(u);
    let b = u.dot(v);
    let c = v.dot(v);
    let d = u.dot(w);
    let e = v.dot(w);
    let det = a * c - b * b;

    // Degenerate segment or ray parallel to it
    if det == 0.0 {
        return None;
    }

    let t = (b * e - c * d) / det;
    let s = (a * e - b * d) / det;
    if t < ray.tmin || t > ray.tmax {
        return None;
    }
    let s = s.clamp(0.0, 1.0);

    let on_ray = ray.origin + ray.direction * t;
    let on_line = p0 + (p1 - p0) * s;
    let gap = on_ray - on_line;
    let radius = r0 * (1.0 - s) + r1 * s;
    if radius <= 0.0 {
        return None;
    }
    let dist2 = gap.dot(gap);
    if dist2 > radius * radius {
        return None;
    }

    Some((Vec2::new(s, (dist2.sqrt() / radius).min(1.0)), t))
}

/// Intersect a ray with a point of given radius.
///
/// Tests the closest approach of the ray against the point; a zero radius
/// can never be hit.
pub fn intersect_point(ray: &Ray, p: Vec3, r: f32) -> Option<(Vec2, f32)> {
    if r <= 0.0 {
        return None;
    }
    let w = p - ray.origin;
    let t = w.dot(ray.direction) / ray.direction.dot(ray.direction);
    if t < ray.tmin || t > ray.tmax {
        return None;
    }

    let closest = ray.origin + ray.direction * t;
    let gap = p - closest;
    if gap.dot(gap) > r * r {
        return None;
    }

    Some((Vec2::ZERO, t))
}

/// Bounds of a triangle.
pub fn triangle_bounds(p0: Vec3, p1: Vec3, p2: Vec3) -> Aabb {
    Aabb::from_points(p0, p1).merge_point(p2)
}

/// Bounds of a radius-carrying line segment.
pub fn line_bounds(p0: Vec3, p1: Vec3, r0: f32, r1: f32) -> Aabb {
    Aabb::surrounding(&point_bounds(p0, r0), &point_bounds(p1, r1))
}

/// Bounds of a radius-carrying point.
pub fn point_bounds(p: Vec3, r: f32) -> Aabb {
    Aabb::from_points(p - Vec3::splat(r), p + Vec3::splat(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_hit() {
        // Triangle in XY plane at z=-1
        let p0 = Vec3::new(-1.0, -1.0, -1.0);
        let p1 = Vec3::new(1.0, -1.0, -1.0);
        let p2 = Vec3::new(0.0, 1.0, -1.0);

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let (uv, t) = intersect_triangle(&ray, p0, p1, p2).expect("should hit");
        assert!((t - 1.0).abs() < 1e-5);
        assert!(uv.x >= 0.0 && uv.y >= 0.0 && uv.x + uv.y <= 1.0);
    }

    #[test]
    fn test_triangle_miss() {
        let p0 = Vec3::new(-1.0, -1.0, -1.0);
        let p1 = Vec3::new(1.0, -1.0, -1.0);
        let p2 = Vec3::new(0.0, 1.0, -1.0);

        // Ray pointing away
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        assert!(intersect_triangle(&ray, p0, p1, p2).is_none());
    }

    #[test]
    fn test_triangle_barycentric_interpolation() {
        let p0 = Vec3::new(0.0, 0.0, -1.0);
        let p1 = Vec3::new(2.0, 0.0, -1.0);
        let p2 = Vec3::new(0.0, 2.0, -1.0);

        // Aim at p1: uv should be (1, 0)
        let ray = Ray::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        let (uv, _) = intersect_triangle(&ray, p0, p1, p2).expect("should hit");
        assert!((uv.x - 1.0).abs() < 1e-5);
        assert!(uv.y.abs() < 1e-5);
    }

    #[test]
    fn test_triangle_degenerate() {
        // Zero-area triangle reports no hit
        let p = Vec3::new(0.0, 0.0, -1.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert!(intersect_triangle(&ray, p, p, p).is_none());
    }

    #[test]
    fn test_triangle_respects_tmax() {
        let p0 = Vec3::new(-1.0, -1.0, -5.0);
        let p1 = Vec3::new(1.0, -1.0, -5.0);
        let p2 = Vec3::new(0.0, 1.0, -5.0);

        let ray = Ray::with_range(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 1e-4, 2.0);
        assert!(intersect_triangle(&ray, p0, p1, p2).is_none());
    }

    #[test]
    fn test_point_hit() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let (_, t) = intersect_point(&ray, Vec3::new(0.1, 0.0, -3.0), 0.5).expect("should hit");
        assert!((t - 3.0).abs() < 1e-5);

        // Outside the radius
        assert!(intersect_point(&ray, Vec3::new(1.0, 0.0, -3.0), 0.5).is_none());

        // Zero radius is unhittable
        assert!(intersect_point(&ray, Vec3::new(0.0, 0.0, -3.0), 0.0).is_none());
    }

    #[test]
    fn test_line_hit() {
        let p0 = Vec3::new(-1.0, 0.0, -2.0);
        let p1 = Vec3::new(1.0, 0.0, -2.0);

        let ray = Ray::new(Vec3::new(0.5, 0.05, 0.0), Vec3::new(0.0, 0.0, -1.0));
        let (uv, t) = intersect_line(&ray, p0, p1, 0.1, 0.1).expect("should hit");
        assert!((t - 2.0).abs() < 1e-4);
        assert!((uv.x - 0.75).abs() < 1e-4);

        // Too far from the segment
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(intersect_line(&ray, p0, p1, 0.1, 0.1).is_none());
    }

    #[test]
    fn test_line_degenerate() {
        // Zero-length segment has det == 0
        let p = Vec3::new(0.0, 0.0, -2.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert!(intersect_line(&ray, p, p, 0.1, 0.1).is_none());
    }

    #[test]
    fn test_bounds() {
        let bounds = triangle_bounds(
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, -1.0),
        );
        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 0.0));

        let bounds = point_bounds(Vec3::ZERO, 0.5);
        assert_eq!(bounds.min, Vec3::splat(-0.5));
        assert_eq!(bounds.max, Vec3::splat(0.5));

        let bounds = line_bounds(Vec3::ZERO, Vec3::X, 0.1, 0.2);
        assert_eq!(bounds.min, Vec3::new(-0.1, -0.2, -0.2));
        assert_eq!(bounds.max, Vec3::new(1.2, 0.2, 0.2));
    }
}
