use crate::Vec3;

/// Minimum hit distance used by default for camera and bounce rays.
///
/// Starting rays at a small positive distance avoids re-intersecting the
/// surface they were spawned from.
pub const RAY_EPS: f32 = 1e-4;

/// A ray in 3D space with origin, direction, and a valid `[tmin, tmax]` range.
///
/// Rays represent a line starting at `origin` and traveling in `direction`.
/// Intersections are only reported for distances inside the range; traversal
/// tightens `tmax` as closer hits are found.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub tmin: f32,
    pub tmax: f32,
}

impl Ray {
    /// Create a ray with the default `[RAY_EPS, +inf]` range.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            tmin: RAY_EPS,
            tmax: f32::INFINITY,
        }
    }

    /// Create a ray with an explicit distance range.
    pub fn with_range(origin: Vec3, direction: Vec3, tmin: f32, tmax: f32) -> Self {
        Self {
            origin,
            direction,
            tmin,
            tmax,
        }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
