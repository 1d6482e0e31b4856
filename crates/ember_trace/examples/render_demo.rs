//! Renders a small demo scene progressively and writes `demo.png`.
//!
//! Run with: cargo run --release --example render_demo

use anyhow::Result;
use ember_math::{Frame, Vec2, Vec3};
use ember_scene::{Scene, Shape, ShapeId, Texels, Texture};
use ember_trace::{init_bvh, init_state, trace_samples, Params, Shader};

fn main() -> Result<()> {
    env_logger::init();

    let mut scene = Scene::new();

    // camera
    let camera = scene.add_camera();
    scene.camera_mut(camera).set_frame(Frame::look_at(
        Vec3::new(0.0, 1.2, 4.0),
        Vec3::new(0.0, 0.5, 0.0),
        Vec3::Y,
    ));
    scene.camera_mut(camera).set_lens(0.05, 16.0 / 9.0, 0.036);

    // checkered floor
    let checker = scene.add_texture();
    *scene.texture_mut(checker) = checker_texture(8, 8);
    let floor_shape = add_floor(&mut scene, 6.0, 4.0);
    let floor_mat = scene.add_material();
    scene
        .material_mut(floor_mat)
        .set_color(Vec3::splat(0.9), Some(checker));
    scene.add_instance(Frame::IDENTITY, floor_shape, floor_mat);

    // diffuse, metal, and glass spheres
    let sphere = add_sphere(&mut scene, 32, 0.5);

    let red = scene.add_material();
    scene
        .material_mut(red)
        .set_color(Vec3::new(0.8, 0.1, 0.1), None);
    scene.add_instance(
        Frame::from_translation(Vec3::new(-1.2, 0.5, 0.0)),
        sphere,
        red,
    );

    let metal = scene.add_material();
    scene
        .material_mut(metal)
        .set_color(Vec3::new(0.9, 0.8, 0.6), None);
    scene.material_mut(metal).set_metallic(1.0, None);
    scene.material_mut(metal).set_roughness(0.15, None);
    scene.add_instance(
        Frame::from_translation(Vec3::new(0.0, 0.5, 0.0)),
        sphere,
        metal,
    );

    let glass = scene.add_material();
    scene.material_mut(glass).set_color(Vec3::splat(0.95), None);
    scene
        .material_mut(glass)
        .set_transmission(1.0, true, 0.01, None);
    scene.add_instance(
        Frame::from_translation(Vec3::new(1.2, 0.5, 0.0)),
        sphere,
        glass,
    );

    // sky
    let sky = scene.add_texture();
    *scene.texture_mut(sky) = gradient_sky(64, 32);
    let env = scene.add_environment();
    scene
        .environment_mut(env)
        .set_emission(Vec3::splat(1.0), Some(sky));

    // render
    let params = Params {
        resolution: 640,
        shader: Shader::Raytrace,
        samples: 64,
        bounces: 4,
        ..Default::default()
    };

    let mut progress = |name: &str, current: usize, total: usize| {
        log::info!("{name}: {current}/{total}");
    };
    let bvh = init_bvh(&scene, &params, Some(&mut progress))?;

    let mut state = init_state(scene.camera(camera), &params)?;
    for sample in 0..params.samples {
        trace_samples(&mut state, &scene, &bvh, scene.camera(camera), &params, None)?;
        if (sample + 1) % 16 == 0 {
            log::info!("samples: {}/{}", sample + 1, params.samples);
        }
    }

    // write the image
    let mut image = image::RgbImage::new(state.width as u32, state.height as u32);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let color = state.render_at(x as usize, y as usize);
        pixel.0 = [
            to_srgb_byte(color.x),
            to_srgb_byte(color.y),
            to_srgb_byte(color.z),
        ];
    }
    image.save("demo.png")?;
    println!("wrote demo.png ({}x{})", state.width, state.height);

    Ok(())
}

/// Apply gamma correction (gamma = 2.0) and quantize.
fn to_srgb_byte(linear: f32) -> u8 {
    let gamma = if linear > 0.0 { linear.sqrt() } else { 0.0 };
    (gamma.clamp(0.0, 1.0) * 255.0) as u8
}

/// A ground quad with texcoords spanning `tiles` checker repeats.
fn add_floor(scene: &mut Scene, half: f32, tiles: f32) -> ShapeId {
    let shape = scene.add_shape();
    let s = scene.shape_mut(shape);
    s.positions = vec![
        Vec3::new(-half, 0.0, -half),
        Vec3::new(half, 0.0, -half),
        Vec3::new(half, 0.0, half),
        Vec3::new(-half, 0.0, half),
    ];
    s.normals = vec![Vec3::Y; 4];
    s.texcoords = vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(tiles, 0.0),
        Vec2::new(tiles, tiles),
        Vec2::new(0.0, tiles),
    ];
    s.triangles = vec![[0, 1, 2], [0, 2, 3]];
    shape
}

/// A lat-long tessellated unit-uv sphere.
fn add_sphere(scene: &mut Scene, steps: u32, radius: f32) -> ShapeId {
    use std::f32::consts::PI;

    let mut shape = Shape::default();
    for j in 0..=steps {
        let theta = PI * j as f32 / steps as f32;
        for i in 0..=steps {
            let phi = 2.0 * PI * i as f32 / steps as f32;
            let normal = Vec3::new(
                theta.sin() * phi.cos(),
                theta.cos(),
                theta.sin() * phi.sin(),
            );
            shape.positions.push(normal * radius);
            shape.normals.push(normal);
            shape
                .texcoords
                .push(Vec2::new(i as f32 / steps as f32, j as f32 / steps as f32));
        }
    }
    let stride = steps + 1;
    for j in 0..steps {
        for i in 0..steps {
            let a = j * stride + i;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            shape.triangles.push([a, b, d]);
            shape.triangles.push([a, d, c]);
        }
    }

    let id = scene.add_shape();
    *scene.shape_mut(id) = shape;
    id
}

/// Byte checker texture in two grays.
fn checker_texture(width: usize, height: usize) -> Texture {
    let mut texels = Vec::with_capacity(width * height);
    for j in 0..height {
        for i in 0..width {
            let even = (i + j) % 2 == 0;
            texels.push(if even { [220, 220, 220] } else { [90, 90, 90] });
        }
    }
    Texture::new(width, height, Texels::ColorB(texels))
}

/// Vertical sky gradient, brighter at the zenith.
fn gradient_sky(width: usize, height: usize) -> Texture {
    let mut texels = Vec::with_capacity(width * height);
    for j in 0..height {
        let t = j as f32 / (height - 1) as f32;
        let sky = Vec3::new(0.5, 0.7, 1.0) * (1.0 - t) + Vec3::new(0.9, 0.9, 0.9) * t;
        for _ in 0..width {
            texels.push(sky);
        }
    }
    Texture::new(width, height, Texels::ColorF(texels))
}
