//! Shape geometry and attribute interpolation.

use ember_math::{Vec2, Vec3};
use std::ops::{Add, Mul};

/// An indexed shape holding one kind of element over shared vertex data.
///
/// Exactly one of `triangles`, `lines`, or `points` should be populated; a
/// shape with none is a valid empty placeholder. Vertex attributes are
/// parallel arrays: `normals` and `texcoords` are optional (empty when
/// absent), `radius` is required for points and lines.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    pub triangles: Vec<[u32; 3]>,
    pub lines: Vec<[u32; 2]>,
    pub points: Vec<u32>,

    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub radius: Vec<f32>,
}

fn interpolate_triangle<T>(p0: T, p1: T, p2: T, uv: Vec2) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    p0 * (1.0 - uv.x - uv.y) + p1 * uv.x + p2 * uv.y
}

fn interpolate_line<T>(p0: T, p1: T, u: f32) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    p0 * (1.0 - u) + p1 * u
}

impl Shape {
    /// Number of elements of whichever kind is populated.
    pub fn element_count(&self) -> usize {
        if !self.triangles.is_empty() {
            self.triangles.len()
        } else if !self.lines.is_empty() {
            self.lines.len()
        } else {
            self.points.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.element_count() == 0
    }

    /// Interpolate the position on an element at its local uv.
    pub fn eval_position(&self, element: usize, uv: Vec2) -> Vec3 {
        if !self.triangles.is_empty() {
            let [a, b, c] = self.triangles[element];
            interpolate_triangle(
                self.positions[a as usize],
                self.positions[b as usize],
                self.positions[c as usize],
                uv,
            )
        } else if !self.lines.is_empty() {
            let [a, b] = self.lines[element];
            interpolate_line(self.positions[a as usize], self.positions[b as usize], uv.x)
        } else if !self.points.is_empty() {
            self.positions[self.points[element] as usize]
        } else {
            Vec3::ZERO
        }
    }

    /// The geometric normal of an element.
    ///
    /// Triangles use the face cross product, lines their tangent, and points
    /// a fixed local +Z.
    pub fn eval_element_normal(&self, element: usize) -> Vec3 {
        if !self.triangles.is_empty() {
            let [a, b, c] = self.triangles[element];
            let p0 = self.positions[a as usize];
            let p1 = self.positions[b as usize];
            let p2 = self.positions[c as usize];
            (p1 - p0).cross(p2 - p0).normalize_or_zero()
        } else if !self.lines.is_empty() {
            let [a, b] = self.lines[element];
            (self.positions[b as usize] - self.positions[a as usize]).normalize_or_zero()
        } else if !self.points.is_empty() {
            Vec3::Z
        } else {
            Vec3::ZERO
        }
    }

    /// The shading normal: interpolated vertex normals when present,
    /// otherwise the element normal.
    pub fn eval_normal(&self, element: usize, uv: Vec2) -> Vec3 {
        if self.normals.is_empty() {
            return self.eval_element_normal(element);
        }
        if !self.triangles.is_empty() {
            let [a, b, c] = self.triangles[element];
            interpolate_triangle(
                self.normals[a as usize],
                self.normals[b as usize],
                self.normals[c as usize],
                uv,
            )
            .normalize()
        } else if !self.lines.is_empty() {
            let [a, b] = self.lines[element];
            interpolate_line(self.normals[a as usize], self.normals[b as usize], uv.x).normalize()
        } else if !self.points.is_empty() {
            self.normals[self.points[element] as usize]
        } else {
            Vec3::ZERO
        }
    }

    /// The texture coordinates at an element's local uv.
    ///
    /// Falls back to the local uv itself when the shape has no texcoords.
    pub fn eval_texcoord(&self, element: usize, uv: Vec2) -> Vec2 {
        if self.texcoords.is_empty() {
            return uv;
        }
        if !self.triangles.is_empty() {
            let [a, b, c] = self.triangles[element];
            interpolate_triangle(
                self.texcoords[a as usize],
                self.texcoords[b as usize],
                self.texcoords[c as usize],
                uv,
            )
        } else if !self.lines.is_empty() {
            let [a, b] = self.lines[element];
            interpolate_line(self.texcoords[a as usize], self.texcoords[b as usize], uv.x)
        } else if !self.points.is_empty() {
            self.texcoords[self.points[element] as usize]
        } else {
            uv
        }
    }
}
