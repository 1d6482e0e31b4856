use crate::{Aabb, Mat3, Ray, Vec3};

/// A coordinate frame: three basis vectors plus an origin.
///
/// Frames place shapes, cameras, and environments in the world. The basis is
/// orthonormal for rigid placements, but may carry scale or shear, in which
/// case callers must ask for the general (`non_rigid`) inverse.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
    pub origin: Vec3,
}

impl Frame {
    pub const IDENTITY: Frame = Frame {
        x: Vec3::X,
        y: Vec3::Y,
        z: Vec3::Z,
        origin: Vec3::ZERO,
    };

    /// Create a frame from basis vectors and an origin.
    pub fn new(x: Vec3, y: Vec3, z: Vec3, origin: Vec3) -> Self {
        Self { x, y, z, origin }
    }

    /// Create a translation-only frame.
    pub fn from_translation(origin: Vec3) -> Self {
        Self {
            origin,
            ..Self::IDENTITY
        }
    }

    /// Create a frame at `eye` with +Z pointing from `center` towards `eye`.
    ///
    /// This is the camera convention: the view direction is the frame's -Z.
    pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Self {
        let z = (eye - center).normalize();
        let x = up.cross(z).normalize();
        let y = z.cross(x);
        Self {
            x,
            y,
            z,
            origin: eye,
        }
    }

    /// Transform a point (applies basis and origin).
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.x * p.x + self.y * p.y + self.z * p.z + self.origin
    }

    /// Transform a vector (applies basis only, no translation).
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.x * v.x + self.y * v.y + self.z * v.z
    }

    /// Transform a direction: basis only, renormalized.
    pub fn transform_direction(&self, v: Vec3) -> Vec3 {
        self.transform_vector(v).normalize()
    }

    /// Transform a ray, preserving its distance range.
    ///
    /// The direction is transformed as a vector without renormalization, so
    /// the ray parameter t measures the same hit for the original and the
    /// transformed ray under any affine frame.
    pub fn transform_ray(&self, ray: &Ray) -> Ray {
        Ray::with_range(
            self.transform_point(ray.origin),
            self.transform_vector(ray.direction),
            ray.tmin,
            ray.tmax,
        )
    }

    /// Transform an AABB by taking the bounds of its 8 transformed corners.
    pub fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        let first = self.transform_point(aabb.min);
        let mut result = Aabb::from_points(first, first);
        for corner in [
            Vec3::new(aabb.max.x, aabb.min.y, aabb.min.z),
            Vec3::new(aabb.min.x, aabb.max.y, aabb.min.z),
            Vec3::new(aabb.max.x, aabb.max.y, aabb.min.z),
            Vec3::new(aabb.min.x, aabb.min.y, aabb.max.z),
            Vec3::new(aabb.max.x, aabb.min.y, aabb.max.z),
            Vec3::new(aabb.min.x, aabb.max.y, aabb.max.z),
            aabb.max,
        ] {
            result = result.merge_point(self.transform_point(corner));
        }
        result
    }

    /// Invert the frame.
    ///
    /// With `non_rigid` set the basis is inverted as a general 3x3 matrix,
    /// handling scale and shear. Otherwise the basis is assumed orthonormal
    /// and the cheaper transpose is used.
    pub fn inverse(&self, non_rigid: bool) -> Frame {
        let m = Mat3::from_cols(self.x, self.y, self.z);
        let minv = if non_rigid { m.inverse() } else { m.transpose() };
        Frame {
            x: minv.col(0),
            y: minv.col(1),
            z: minv.col(2),
            origin: -(minv * self.origin),
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::IDENTITY
    }
}
