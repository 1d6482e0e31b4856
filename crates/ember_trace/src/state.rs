//! Progressive render state and the per-pass sample scheduler.
//!
//! Each pixel owns its RNG, its accumulated radiance and its sample count;
//! the render buffer always holds `accumulated / samples`. A pass adds
//! exactly one sample to every pixel and is parallel across image rows,
//! with each row written by exactly one worker.

use ember_math::{make_rng, rand2f, RngState, Vec2, Vec4};
use ember_scene::{Camera, Scene};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::bvh::SceneBvh;
use crate::shader::{shader_func, ShaderFn};
use crate::{Params, TraceError};

/// Seed of the master generator that assigns per-pixel RNG streams.
const STREAM_SEED: u64 = 1301081;

/// Per-pixel accumulation state.
#[derive(Debug, Clone)]
pub struct Pixel {
    pub rng: RngState,
    pub accumulated: Vec4,
    pub samples: u32,
}

/// Progressive render state for one camera view.
#[derive(Debug)]
pub struct State {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Pixel>,
    pub render: Vec<Vec4>,
}

impl State {
    /// The current estimate for pixel (i, j).
    pub fn render_at(&self, i: usize, j: usize) -> Vec4 {
        self.render[j * self.width + i]
    }

    /// The accumulation state for pixel (i, j).
    pub fn pixel_at(&self, i: usize, j: usize) -> &Pixel {
        &self.pixels[j * self.width + i]
    }
}

/// Allocate render state sized to the camera's film at `params.resolution`.
///
/// The longer film axis gets `resolution` pixels, the shorter follows the
/// aspect. Per-pixel RNGs are seeded deterministically: a master generator
/// with a fixed seed deals each pixel a 31-bit stream id, so pixels are
/// decorrelated and identical runs reproduce exactly.
pub fn init_state(camera: &Camera, params: &Params) -> Result<State, TraceError> {
    params.validate(camera)?;

    let resolution = params.resolution as usize;
    let (width, height) = if camera.film.x > camera.film.y {
        (
            resolution,
            ((resolution as f32 * camera.film.y / camera.film.x).round() as usize).max(1),
        )
    } else {
        (
            ((resolution as f32 * camera.film.x / camera.film.y).round() as usize).max(1),
            resolution,
        )
    };

    let mut master = make_rng(STREAM_SEED, 1);
    let pixels = (0..width * height)
        .map(|_| {
            use rand::Rng;
            let stream = master.gen_range(0..1u32 << 31) / 2 + 1;
            Pixel {
                rng: make_rng(params.seed, stream as u64),
                accumulated: Vec4::ZERO,
                samples: 0,
            }
        })
        .collect();

    Ok(State {
        width,
        height,
        pixels,
        render: vec![Vec4::ZERO; width * height],
    })
}

/// Sample one row of pixels.
fn trace_row(
    pixels: &mut [Pixel],
    render: &mut [Vec4],
    j: usize,
    width: usize,
    height: usize,
    scene: &Scene,
    bvh: &SceneBvh,
    camera: &Camera,
    shader: ShaderFn,
    params: &Params,
) {
    for i in 0..width {
        let pixel = &mut pixels[i];

        // jitter first so the RNG advances the same way every pass
        let jitter = rand2f(&mut pixel.rng);
        let uv = Vec2::new(
            (i as f32 + jitter.x) / width as f32,
            (j as f32 + jitter.y) / height as f32,
        );
        let ray = camera.eval_ray(uv);
        let mut color = shader(scene, bvh, &ray, 0, &mut pixel.rng, params);

        // chromaticity-preserving clamp on the radiance
        let peak = color.x.max(color.y).max(color.z);
        if peak > params.clamp {
            let scale = params.clamp / peak;
            color.x *= scale;
            color.y *= scale;
            color.z *= scale;
        }

        pixel.accumulated += color;
        pixel.samples += 1;
        render[i] = pixel.accumulated / pixel.samples as f32;
    }
}

/// Take one sample per pixel, updating the render estimate.
///
/// Rows are dispatched in parallel with each worker owning whole rows, so
/// no pixel is written by two workers. The optional `stop` flag is polled
/// at row granularity: setting it makes workers return early and the call
/// come back after joining, leaving already-sampled pixels consistent.
/// With `params.noparallel` the same body runs row-major on this thread.
pub fn trace_samples(
    state: &mut State,
    scene: &Scene,
    bvh: &SceneBvh,
    camera: &Camera,
    params: &Params,
    stop: Option<&AtomicBool>,
) -> Result<(), TraceError> {
    params.validate(camera)?;

    // select the shader once per pass
    let shader = shader_func(params.shader);
    let width = state.width;
    let height = state.height;

    let stopped = |stop: Option<&AtomicBool>| stop.is_some_and(|s| s.load(Ordering::Relaxed));

    if params.noparallel {
        for (j, (pixels, render)) in state
            .pixels
            .chunks_mut(width)
            .zip(state.render.chunks_mut(width))
            .enumerate()
        {
            if stopped(stop) {
                break;
            }
            trace_row(
                pixels, render, j, width, height, scene, bvh, camera, shader, params,
            );
        }
    } else {
        state
            .pixels
            .par_chunks_mut(width)
            .zip(state.render.par_chunks_mut(width))
            .enumerate()
            .for_each(|(j, (pixels, render))| {
                if stopped(stop) {
                    return;
                }
                trace_row(
                    pixels, render, j, width, height, scene, bvh, camera, shader, params,
                );
            });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvh::init_bvh;
    use crate::Shader;
    use ember_math::{Frame, Vec3};
    use ember_scene::CameraId;

    /// Environment-only scene with a camera 2 units up the z axis.
    fn environment_scene(emission: Vec3) -> (Scene, CameraId) {
        let mut scene = Scene::new();
        let camera = scene.add_camera();
        scene.camera_mut(camera).set_frame(Frame::look_at(
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::ZERO,
            Vec3::Y,
        ));
        let env = scene.add_environment();
        scene.environment_mut(env).set_emission(emission, None);
        (scene, camera)
    }

    fn small_params() -> Params {
        Params {
            resolution: 16,
            samples: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_init_state_resolution_follows_aspect() {
        let mut camera = Camera::default();
        camera.set_lens(0.05, 1.5, 0.036);
        let params = Params {
            resolution: 300,
            ..Default::default()
        };

        let state = init_state(&camera, &params).unwrap();
        assert_eq!(state.width, 300);
        assert_eq!(state.height, 200);

        // Portrait: the longer axis is vertical
        camera.set_lens(0.05, 0.5, 0.036);
        let state = init_state(&camera, &params).unwrap();
        assert_eq!(state.width, 150);
        assert_eq!(state.height, 300);
    }

    #[test]
    fn test_init_state_rejects_bad_config() {
        let camera = Camera::default();
        let params = Params {
            resolution: -1,
            ..Default::default()
        };
        assert!(init_state(&camera, &params).is_err());
    }

    #[test]
    fn test_samples_count_and_average_invariant() {
        let (scene, camera) = environment_scene(Vec3::splat(0.5));
        let params = small_params();
        let bvh = init_bvh(&scene, &params, None).unwrap();
        let mut state = init_state(scene.camera(camera), &params).unwrap();

        let passes = 3u32;
        for _ in 0..passes {
            trace_samples(&mut state, &scene, &bvh, scene.camera(camera), &params, None).unwrap();
        }

        for j in 0..state.height {
            for i in 0..state.width {
                let pixel = state.pixel_at(i, j);
                assert_eq!(pixel.samples, passes);
                let expected = pixel.accumulated / passes as f32;
                assert!((state.render_at(i, j) - expected).length() < 1e-6);
            }
        }
    }

    #[test]
    fn test_constant_environment_renders_flat() {
        let emission = Vec3::new(0.5, 0.5, 0.5);
        let (scene, camera) = environment_scene(emission);
        let params = Params {
            resolution: 8,
            bounces: 1,
            ..Default::default()
        };
        let bvh = init_bvh(&scene, &params, None).unwrap();
        let mut state = init_state(scene.camera(camera), &params).unwrap();

        trace_samples(&mut state, &scene, &bvh, scene.camera(camera), &params, None).unwrap();

        for pixel in &state.render {
            assert!((pixel.truncate() - emission).length() < 1e-5);
            assert!((pixel.w - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (scene, camera) = environment_scene(Vec3::splat(0.8));
        let params = small_params();
        let bvh = init_bvh(&scene, &params, None).unwrap();

        let sequential = Params {
            noparallel: true,
            ..params.clone()
        };

        let mut par_state = init_state(scene.camera(camera), &params).unwrap();
        let mut seq_state = init_state(scene.camera(camera), &sequential).unwrap();

        for _ in 0..3 {
            trace_samples(&mut par_state, &scene, &bvh, scene.camera(camera), &params, None)
                .unwrap();
            trace_samples(
                &mut seq_state,
                &scene,
                &bvh,
                scene.camera(camera),
                &sequential,
                None,
            )
            .unwrap();
        }

        for (a, b) in par_state.render.iter().zip(seq_state.render.iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_clamp_preserves_chromaticity() {
        // An environment far above the clamp
        let (scene, camera) = environment_scene(Vec3::new(100.0, 50.0, 25.0));
        let params = Params {
            resolution: 4,
            clamp: 10.0,
            ..Default::default()
        };
        let bvh = init_bvh(&scene, &params, None).unwrap();
        let mut state = init_state(scene.camera(camera), &params).unwrap();

        trace_samples(&mut state, &scene, &bvh, scene.camera(camera), &params, None).unwrap();

        for pixel in &state.render {
            assert!((pixel.x - 10.0).abs() < 1e-4);
            assert!((pixel.y - 5.0).abs() < 1e-4);
            assert!((pixel.z - 2.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_stop_flag_short_circuits() {
        let (scene, camera) = environment_scene(Vec3::ONE);
        let params = Params {
            resolution: 16,
            noparallel: true,
            ..Default::default()
        };
        let bvh = init_bvh(&scene, &params, None).unwrap();
        let mut state = init_state(scene.camera(camera), &params).unwrap();

        let stop = AtomicBool::new(true);
        trace_samples(
            &mut state,
            &scene,
            &bvh,
            scene.camera(camera),
            &params,
            Some(&stop),
        )
        .unwrap();

        // Pre-set flag: nothing was sampled, state is still consistent
        assert!(state.pixels.iter().all(|p| p.samples == 0));
        assert!(state.render.iter().all(|&r| r == Vec4::ZERO));
    }

    #[test]
    fn test_per_pixel_streams_differ() {
        let (scene, camera) = environment_scene(Vec3::ONE);
        let params = small_params();
        let state = init_state(scene.camera(camera), &params).unwrap();

        // Two fresh pixels draw different jitter
        let mut a = state.pixels[0].rng.clone();
        let mut b = state.pixels[1].rng.clone();
        assert_ne!(rand2f(&mut a), rand2f(&mut b));
    }

    /// A quad in the XY plane at z = 0 facing +Z, as one shape instance.
    fn add_quad_instance(scene: &mut Scene, half: f32, color: Vec3) {
        let shape = scene.add_shape();
        let s = scene.shape_mut(shape);
        s.positions = vec![
            Vec3::new(-half, -half, 0.0),
            Vec3::new(half, -half, 0.0),
            Vec3::new(half, half, 0.0),
            Vec3::new(-half, half, 0.0),
        ];
        s.triangles = vec![[0, 1, 2], [0, 2, 3]];
        let material = scene.add_material();
        scene.material_mut(material).set_color(color, None);
        scene.add_instance(Frame::IDENTITY, shape, material);
    }

    #[test]
    fn test_eyelight_red_triangle_end_to_end() {
        let mut scene = Scene::new();
        let camera = scene.add_camera();
        scene.camera_mut(camera).set_frame(Frame::look_at(
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::ZERO,
            Vec3::Y,
        ));
        // Small enough that corner rays miss it
        add_quad_instance(&mut scene, 0.2, Vec3::new(1.0, 0.0, 0.0));

        let params = Params {
            resolution: 33,
            shader: Shader::Eyelight,
            ..Default::default()
        };
        let bvh = init_bvh(&scene, &params, None).unwrap();
        let mut state = init_state(scene.camera(camera), &params).unwrap();
        trace_samples(&mut state, &scene, &bvh, scene.camera(camera), &params, None).unwrap();

        let center = state.render_at(state.width / 2, state.height / 2);
        assert!((center.truncate() - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-3);

        let corner = state.render_at(0, 0);
        assert_eq!(corner.truncate(), Vec3::ZERO);
    }

    #[test]
    fn test_texcoord_checker_tiles_end_to_end() {
        use ember_math::Vec2;

        let mut scene = Scene::new();
        let camera = scene.add_camera();
        scene.camera_mut(camera).set_frame(Frame::look_at(
            Vec3::new(0.0, 0.0, 6.0),
            Vec3::ZERO,
            Vec3::Y,
        ));
        // A quad wider than the view, texcoords spanning (0,0)..(4,4)
        let shape = scene.add_shape();
        let s = scene.shape_mut(shape);
        s.positions = vec![
            Vec3::new(-2.0, -2.0, 0.0),
            Vec3::new(2.0, -2.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
            Vec3::new(-2.0, 2.0, 0.0),
        ];
        s.texcoords = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
        ];
        s.triangles = vec![[0, 1, 2], [0, 2, 3]];
        let material = scene.add_material();
        scene.add_instance(Frame::IDENTITY, shape, material);

        let params = Params {
            resolution: 64,
            shader: Shader::Texcoord,
            ..Default::default()
        };
        let bvh = init_bvh(&scene, &params, None).unwrap();
        let mut state = init_state(scene.camera(camera), &params).unwrap();
        trace_samples(&mut state, &scene, &bvh, scene.camera(camera), &params, None).unwrap();

        // The u channel ramps 0..1 once per tile; count the wrap-arounds
        // along the middle row and column, staying inside the quad
        let j = state.height / 2;
        let inner = (state.width / 16).max(1);
        let mut row_wraps = 0;
        for i in inner + 1..state.width - inner {
            if (state.render_at(i - 1, j).x - state.render_at(i, j).x).abs() > 0.5 {
                row_wraps += 1;
            }
        }
        let i = state.width / 2;
        let mut col_wraps = 0;
        for j in 1..state.height {
            if (state.render_at(i, j - 1).y - state.render_at(i, j).y).abs() > 0.5 {
                col_wraps += 1;
            }
        }
        // 4x4 texcoord span: 3 interior wraps per axis means 16 tiles
        assert_eq!((row_wraps + 1) * (col_wraps + 1), 16);
    }

    #[test]
    fn test_diffuse_converges_under_white_environment() {
        let mut scene = Scene::new();
        let camera = scene.add_camera();
        scene.camera_mut(camera).set_frame(Frame::look_at(
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::ZERO,
            Vec3::Y,
        ));
        add_quad_instance(&mut scene, 20.0, Vec3::ONE);
        let env = scene.add_environment();
        scene.environment_mut(env).set_emission(Vec3::ONE, None);

        let params = Params {
            resolution: 8,
            bounces: 4,
            ..Default::default()
        };
        let bvh = init_bvh(&scene, &params, None).unwrap();
        let mut state = init_state(scene.camera(camera), &params).unwrap();
        for _ in 0..64 {
            trace_samples(&mut state, &scene, &bvh, scene.camera(camera), &params, None).unwrap();
        }

        // A white diffuse surface under a uniform white sky: every pixel
        // converges to white
        for pixel in &state.render {
            assert!(
                (pixel.truncate() - Vec3::ONE).length() < 0.05,
                "pixel {pixel}"
            );
        }
    }

    #[test]
    fn test_init_state_is_reproducible() {
        let (scene, camera) = environment_scene(Vec3::ONE);
        let params = small_params();

        let a = init_state(scene.camera(camera), &params).unwrap();
        let b = init_state(scene.camera(camera), &params).unwrap();
        for (pa, pb) in a.pixels.iter().zip(b.pixels.iter()) {
            let mut ra = pa.rng.clone();
            let mut rb = pb.rng.clone();
            assert_eq!(rand2f(&mut ra), rand2f(&mut rb));
        }
    }
}
