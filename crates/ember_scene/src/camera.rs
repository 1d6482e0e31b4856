//! Camera and primary ray generation.

use ember_math::{Frame, Ray, Vec2, Vec3};

/// A physically-sized pinhole camera.
///
/// The camera sits in its world frame looking down the frame's -Z axis.
/// `film` is the physical film extent in scene units and `lens` the focal
/// length; together they fix the field of view. `aperture` and `focus` are
/// stored for scene interchange but the renderer does not sample the lens.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub frame: Frame,
    pub lens: f32,
    pub film: Vec2,
    pub aperture: f32,
    pub focus: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            frame: Frame::IDENTITY,
            lens: 0.050,
            film: Vec2::new(0.036, 0.024),
            aperture: 0.0,
            focus: f32::MAX,
        }
    }
}

impl Camera {
    /// Set the world frame.
    pub fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    /// Set the focal length and derive the film extent from an aspect ratio.
    ///
    /// `film` is the size of the longer film axis; the shorter axis follows
    /// from `aspect` (width over height).
    pub fn set_lens(&mut self, lens: f32, aspect: f32, film: f32) {
        self.lens = lens;
        self.film = if aspect >= 1.0 {
            Vec2::new(film, film / aspect)
        } else {
            Vec2::new(film * aspect, film)
        };
    }

    /// Set aperture and focus distance.
    pub fn set_focus(&mut self, aperture: f32, focus: f32) {
        self.aperture = aperture;
        self.focus = focus;
    }

    /// Generate the camera ray through normalized image coordinates.
    ///
    /// `uv` is in [0, 1]^2 with v growing down the image. The ray starts at
    /// the frame origin with a unit direction.
    pub fn eval_ray(&self, uv: Vec2) -> Ray {
        let q = Vec3::new(
            self.film.x * (0.5 - uv.x),
            self.film.y * (uv.y - 0.5),
            self.lens,
        );
        Ray::new(
            self.frame.transform_point(Vec3::ZERO),
            self.frame.transform_direction(-q),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_lens_aspect() {
        let mut camera = Camera::default();

        camera.set_lens(0.05, 2.0, 0.036);
        assert_eq!(camera.film, Vec2::new(0.036, 0.018));

        camera.set_lens(0.05, 0.5, 0.036);
        assert_eq!(camera.film, Vec2::new(0.018, 0.036));
    }

    #[test]
    fn test_eval_ray_origin_and_unit_direction() {
        let mut camera = Camera::default();
        let eye = Vec3::new(1.0, 2.0, 3.0);
        camera.set_frame(Frame::look_at(eye, Vec3::ZERO, Vec3::Y));

        for uv in [
            Vec2::new(0.5, 0.5),
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.25, 0.8),
        ] {
            let ray = camera.eval_ray(uv);
            assert!((ray.origin - eye).length() < 1e-6);
            assert!((ray.direction.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_eval_ray_center_looks_forward() {
        let camera = Camera::default();
        let ray = camera.eval_ray(Vec2::new(0.5, 0.5));
        // Identity frame: the view direction is -Z
        assert!((ray.direction - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_eval_ray_image_orientation() {
        let camera = Camera::default();

        // Left of the image (u < 0.5) looks towards -X in camera space...
        let left = camera.eval_ray(Vec2::new(0.0, 0.5));
        assert!(left.direction.x < 0.0);

        // ...and the top of the image (v < 0.5) looks up
        let top = camera.eval_ray(Vec2::new(0.5, 0.0));
        assert!(top.direction.y > 0.0);
    }
}
