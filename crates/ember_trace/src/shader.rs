//! Shading functions.
//!
//! A shader maps a camera ray to a color and alpha. The raytrace shader is
//! the physically-based estimator; the rest are flat debug views. Dispatch
//! happens once per pass through [`shader_func`], not per pixel.

use ember_math::{
    fresnel_schlick, microfacet_distribution, microfacet_shadowing, orthonormalize, rand1f,
    rand2f, reflect, sample_hemisphere_cos, sample_hemisphere_cos_pdf, Ray, RngState, Vec3, Vec4,
};
use ember_scene::{eval_texture, eval_texture_scalar, Scene};
use std::f32::consts::PI;

use crate::bvh::{intersect_scene_bvh, SceneBvh};
use crate::{Params, Shader};

pub(crate) type ShaderFn =
    fn(&Scene, &SceneBvh, &Ray, i32, &mut RngState, &Params) -> Vec4;

/// Select the shading function for a pass.
pub(crate) fn shader_func(shader: Shader) -> ShaderFn {
    match shader {
        Shader::Raytrace => trace_raytrace,
        Shader::Eyelight => trace_eyelight,
        Shader::Normal => trace_normal,
        Shader::Texcoord => trace_texcoord,
        Shader::Color => trace_color,
    }
}

/// Distance to step past a surface when a ray continues through it.
const PASSTHROUGH_EPS: f32 = 1e-2;

/// Recursive path estimator.
///
/// Misses evaluate the environments. Hits accumulate emission and one
/// sampled indirect bounce chosen by material class: polished dielectric,
/// polished metal, rough metal, rough plastic, or diffuse.
fn trace_raytrace(
    scene: &Scene,
    bvh: &SceneBvh,
    ray: &Ray,
    bounce: i32,
    rng: &mut RngState,
    params: &Params,
) -> Vec4 {
    let intersection = intersect_scene_bvh(scene, bvh, ray, false, true);
    if !intersection.hit {
        return scene.eval_environment(ray).extend(1.0);
    }

    // evaluate geometry at the hit
    let instance = &scene.instances[intersection.instance as usize];
    let shape = scene.shape(instance.shape);
    let material = scene.material(instance.material);
    let element = intersection.element as usize;
    let uv = intersection.uv;

    let position = instance
        .frame
        .transform_point(shape.eval_position(element, uv));
    let mut normal = instance
        .frame
        .transform_direction(shape.eval_normal(element, uv));
    let outgoing = -ray.direction;

    // orient the shading frame: lines face the viewer, triangles are
    // two-sided, points keep their normal
    if !shape.lines.is_empty() {
        normal = orthonormalize(normal, outgoing);
    } else if !shape.triangles.is_empty() && outgoing.dot(normal) < 0.0 {
        normal = -normal;
    }

    // sample textured material parameters; color is sRGB, the scalar maps
    // are linear
    let texcoord = shape.eval_texcoord(element, uv);
    let color = material.color * eval_texture(scene.texture(material.color_tex), texcoord, false);
    let specular = material.specular
        * eval_texture_scalar(scene.texture(material.specular_tex), texcoord, true);
    let metallic = material.metallic
        * eval_texture_scalar(scene.texture(material.metallic_tex), texcoord, true);
    let roughness = material.roughness
        * eval_texture_scalar(scene.texture(material.roughness_tex), texcoord, true);
    let transmission = material.transmission
        * eval_texture_scalar(scene.texture(material.transmission_tex), texcoord, true);
    let opacity_rgb = eval_texture(scene.texture(material.opacity_tex), texcoord, true);
    let opacity =
        material.opacity * (opacity_rgb.x + opacity_rgb.y + opacity_rgb.z) / 3.0;

    // accumulate emission
    let mut radiance = material.emission;

    // exit once enough bounces are done
    if bounce >= params.bounces {
        return radiance.extend(1.0);
    }

    // stochastic opacity: let the ray continue through the surface
    if opacity < 1.0 && rand1f(rng) > opacity {
        let continued = Ray::new(position + ray.direction * PASSTHROUGH_EPS, ray.direction);
        return trace_raytrace(scene, bvh, &continued, bounce + 1, rng, params);
    }

    if transmission > 0.0 {
        // polished dielectric: Russian roulette between the Schlick
        // reflection and passing straight through
        let fresnel = fresnel_schlick(color, normal, outgoing);
        if rand1f(rng) < fresnel.x {
            let incoming = reflect(outgoing, normal);
            let rec = trace_raytrace(scene, bvh, &Ray::new(position, incoming), bounce + 1, rng, params);
            radiance += rec.truncate();
        } else {
            let incoming = -outgoing;
            let rec = trace_raytrace(scene, bvh, &Ray::new(position, incoming), bounce + 1, rng, params);
            radiance += color * rec.truncate();
        }
    } else if metallic > 0.0 && roughness == 0.0 {
        // polished metal
        let incoming = reflect(outgoing, normal);
        let rec = trace_raytrace(scene, bvh, &Ray::new(position, incoming), bounce + 1, rng, params);
        radiance += fresnel_schlick(color, normal, outgoing) * rec.truncate();
    } else if metallic > 0.0 {
        // rough metal: mirror direction weighted by the microfacet lobe
        let incoming = reflect(outgoing, normal);
        let halfway = (outgoing + incoming).normalize();
        let cos_out = normal.dot(outgoing);
        let cos_in = normal.dot(incoming);
        if cos_out > 0.0 && cos_in > 0.0 {
            let rec = trace_raytrace(scene, bvh, &Ray::new(position, incoming), bounce + 1, rng, params);
            let lobe = fresnel_schlick(color, halfway, outgoing)
                * microfacet_distribution(roughness, normal, halfway)
                * microfacet_shadowing(roughness, normal, halfway, outgoing, incoming)
                / (4.0 * cos_out * cos_in);
            radiance += lobe * cos_in * rec.truncate();
        }
    } else if specular > 0.0 {
        // rough plastic: diffuse base plus a dielectric microfacet lobe
        let incoming = sample_hemisphere_cos(normal, rand2f(rng));
        let pdf = sample_hemisphere_cos_pdf(normal, incoming);
        let cos_out = normal.dot(outgoing);
        let cos_in = normal.dot(incoming);
        if pdf > 0.0 && cos_out > 0.0 && cos_in > 0.0 {
            let halfway = (outgoing + incoming).normalize();
            let fresnel = fresnel_schlick(Vec3::splat(0.04), halfway, outgoing);
            let rec = trace_raytrace(scene, bvh, &Ray::new(position, incoming), bounce + 1, rng, params);
            let brdf = color / PI * (Vec3::ONE - fresnel)
                + fresnel
                    * microfacet_distribution(roughness, normal, halfway)
                    * microfacet_shadowing(roughness, normal, halfway, outgoing, incoming)
                    / (4.0 * cos_out * cos_in);
            radiance += brdf * cos_in / pdf * rec.truncate();
        }
    } else {
        // diffuse
        let incoming = sample_hemisphere_cos(normal, rand2f(rng));
        let pdf = sample_hemisphere_cos_pdf(normal, incoming);
        if pdf > 0.0 {
            let rec = trace_raytrace(scene, bvh, &Ray::new(position, incoming), bounce + 1, rng, params);
            radiance += color / PI * normal.dot(incoming) / pdf * rec.truncate();
        }
    }

    radiance.extend(1.0)
}

/// Eyelight preview: material color times the view-facing cosine.
fn trace_eyelight(
    scene: &Scene,
    bvh: &SceneBvh,
    ray: &Ray,
    _bounce: i32,
    _rng: &mut RngState,
    _params: &Params,
) -> Vec4 {
    let intersection = intersect_scene_bvh(scene, bvh, ray, false, true);
    if !intersection.hit {
        return Vec4::new(0.0, 0.0, 0.0, 1.0);
    }

    let instance = &scene.instances[intersection.instance as usize];
    let shape = scene.shape(instance.shape);
    let material = scene.material(instance.material);
    let normal = instance
        .frame
        .transform_direction(shape.eval_normal(intersection.element as usize, intersection.uv));

    (material.color * normal.dot(-ray.direction).max(0.0)).extend(1.0)
}

/// Shading normal visualization, remapped into [0, 1].
fn trace_normal(
    scene: &Scene,
    bvh: &SceneBvh,
    ray: &Ray,
    _bounce: i32,
    _rng: &mut RngState,
    _params: &Params,
) -> Vec4 {
    let intersection = intersect_scene_bvh(scene, bvh, ray, false, true);
    if !intersection.hit {
        return Vec4::new(0.0, 0.0, 0.0, 1.0);
    }

    let instance = &scene.instances[intersection.instance as usize];
    let shape = scene.shape(instance.shape);
    let normal = instance
        .frame
        .transform_direction(shape.eval_normal(intersection.element as usize, intersection.uv));

    (normal * 0.5 + 0.5).extend(1.0)
}

/// Texture coordinate visualization, wrapped to [0, 1).
fn trace_texcoord(
    scene: &Scene,
    bvh: &SceneBvh,
    ray: &Ray,
    _bounce: i32,
    _rng: &mut RngState,
    _params: &Params,
) -> Vec4 {
    let intersection = intersect_scene_bvh(scene, bvh, ray, false, true);
    if !intersection.hit {
        return Vec4::new(0.0, 0.0, 0.0, 1.0);
    }

    let instance = &scene.instances[intersection.instance as usize];
    let shape = scene.shape(instance.shape);
    let texcoord = shape.eval_texcoord(intersection.element as usize, intersection.uv);

    Vec4::new(texcoord.x.rem_euclid(1.0), texcoord.y.rem_euclid(1.0), 0.0, 1.0)
}

/// Flat material color.
fn trace_color(
    scene: &Scene,
    bvh: &SceneBvh,
    ray: &Ray,
    _bounce: i32,
    _rng: &mut RngState,
    _params: &Params,
) -> Vec4 {
    let intersection = intersect_scene_bvh(scene, bvh, ray, false, true);
    if !intersection.hit {
        return Vec4::new(0.0, 0.0, 0.0, 1.0);
    }

    let instance = &scene.instances[intersection.instance as usize];
    scene.material(instance.material).color.extend(1.0)
}
