use crate::Vec3;

/// Axis-aligned bounding box for spatial acceleration structures (BVH).
///
/// Stored as min/max corner points. The `EMPTY` box has inverted bounds and
/// absorbs nothing in the slab test, so it can be used as the identity for
/// `surrounding` folds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An empty AABB (contains nothing).
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create an AABB from two corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            min: box0.min.min(box1.min),
            max: box0.max.max(box1.max),
        }
    }

    /// Grow the AABB to contain a point.
    pub fn merge_point(&self, p: Vec3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let size = self.max - self.min;
        if size.x > size.y && size.x > size.z {
            0
        } else if size.y > size.z {
            1
        } else {
            2
        }
    }

    /// Test if a ray intersects this AABB within `[tmin, tmax]`.
    ///
    /// Uses the slab method with a precomputed reciprocal direction, so that
    /// BVH traversal pays the divisions once per ray rather than once per
    /// node. An axis-parallel ray yields signed infinities in `dir_inv` and
    /// falls out of the comparisons correctly.
    pub fn hit(&self, origin: Vec3, dir_inv: Vec3, tmin: f32, tmax: f32) -> bool {
        let it_min = (self.min - origin) * dir_inv;
        let it_max = (self.max - origin) * dir_inv;
        let t_near = it_min.min(it_max);
        let t_far = it_min.max(it_max);
        let t0 = t_near.max_element().max(tmin);
        let t1 = t_far.min_element().min(tmax);
        // conservative widening against slab-boundary float error
        t0 <= t1 * 1.00000024
    }
}
