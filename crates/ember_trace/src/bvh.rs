//! Bounding volume hierarchy build and traversal.
//!
//! Two-level structure: every shape gets its own BVH over elements, and one
//! more BVH spans the instances by their world-space bounds. Trees are flat
//! node arrays with children stored contiguously, walked with a fixed stack
//! instead of recursion.

use ember_math::{
    intersect_line, intersect_point, intersect_triangle, line_bounds, point_bounds,
    triangle_bounds, Aabb, Ray, Vec2, Vec3,
};
use ember_scene::{InstanceId, Scene, SceneError, Shape};

use crate::Params;

/// Maximum primitives per leaf node before splitting.
const BVH_MAX_PRIMS: usize = 4;

/// Traversal stack capacity; ample for 4-wide leaves at any realistic
/// scene size.
const BVH_STACK_SIZE: usize = 128;

/// A node of the flat BVH array.
///
/// Internal nodes have two children stored contiguously at `start` and
/// `num == 2`, with `axis` recording the split dimension for traversal
/// ordering. Leaves reference `num <= 4` entries of the tree's primitive
/// permutation starting at `start`.
#[derive(Debug, Clone, Copy)]
pub struct BvhNode {
    pub bbox: Aabb,
    pub start: u32,
    pub num: u16,
    pub axis: u8,
    pub internal: bool,
}

impl BvhNode {
    const EMPTY_LEAF: BvhNode = BvhNode {
        bbox: Aabb::EMPTY,
        start: 0,
        num: 0,
        axis: 0,
        internal: false,
    };
}

/// A built BVH: the node pool plus the permutation mapping BVH-local
/// primitive slots back to element (or instance) indices.
#[derive(Debug, Default)]
pub struct BvhTree {
    pub nodes: Vec<BvhNode>,
    pub primitives: Vec<u32>,
}

/// Acceleration structures for a whole scene: one tree per shape, one over
/// the instances.
#[derive(Debug)]
pub struct SceneBvh {
    pub shapes: Vec<BvhTree>,
    pub instances: BvhTree,
}

/// A ray-scene intersection record.
#[derive(Debug, Clone, Copy, Default)]
pub struct Intersection {
    pub hit: bool,
    pub instance: u32,
    pub element: u32,
    pub uv: Vec2,
    pub distance: f32,
}

/// Build progress callback: stage name, current step, total steps.
pub type ProgressCallback<'a> = &'a mut dyn FnMut(&str, usize, usize);

// primitive used to sort bvh entries
struct BvhPrimitive {
    bbox: Aabb,
    center: Vec3,
    primitive: u32,
}

/// Stable-order partition; returns the number of elements satisfying the
/// predicate, which end up in the front of the slice.
fn partition<T>(data: &mut [T], pred: impl Fn(&T) -> bool) -> usize {
    let mut first = 0;
    for i in 0..data.len() {
        if pred(&data[i]) {
            data.swap(first, i);
            first += 1;
        }
    }
    first
}

/// Choose a split for the slice: the midpoint of the centroid bounds along
/// their longest axis. Returns the split index and axis.
///
/// Coincident centroids (or a partition that leaves one side empty) fall
/// back to splitting the range in half, so the build always terminates.
fn split_middle(primitives: &mut [BvhPrimitive]) -> (usize, u8) {
    let mid = primitives.len() / 2;

    let mut cbbox = Aabb::EMPTY;
    for p in primitives.iter() {
        cbbox = cbbox.merge_point(p.center);
    }
    if cbbox.max - cbbox.min == Vec3::ZERO {
        return (mid, 0);
    }

    let axis = cbbox.longest_axis();
    let middle = cbbox.centroid()[axis];
    let split = partition(primitives, |p| p.center[axis] < middle);

    if split == 0 || split == primitives.len() {
        (mid, axis as u8)
    } else {
        (split, axis as u8)
    }
}

/// Build a flat BVH over the given primitives, reordering them in place.
fn build_bvh(primitives: &mut Vec<BvhPrimitive>) -> BvhTree {
    // prepare to build nodes
    let mut nodes = Vec::with_capacity(primitives.len().saturating_mul(2));

    // queue up first node
    let mut queue = std::collections::VecDeque::new();
    queue.push_back((0usize, 0usize, primitives.len()));
    nodes.push(BvhNode::EMPTY_LEAF);

    // create nodes until the queue is empty
    while let Some((nodeid, start, end)) = queue.pop_front() {
        let mut bbox = Aabb::EMPTY;
        for p in &primitives[start..end] {
            bbox = Aabb::surrounding(&bbox, &p.bbox);
        }

        if end - start > BVH_MAX_PRIMS {
            let (split, axis) = split_middle(&mut primitives[start..end]);
            let mid = start + split;

            let first_child = nodes.len() as u32;
            nodes[nodeid] = BvhNode {
                bbox,
                start: first_child,
                num: 2,
                axis,
                internal: true,
            };
            nodes.push(BvhNode::EMPTY_LEAF);
            nodes.push(BvhNode::EMPTY_LEAF);
            queue.push_back((first_child as usize, start, mid));
            queue.push_back((first_child as usize + 1, mid, end));
        } else {
            nodes[nodeid] = BvhNode {
                bbox,
                start: start as u32,
                num: (end - start) as u16,
                axis: 0,
                internal: false,
            };
        }
    }

    nodes.shrink_to_fit();
    BvhTree {
        nodes,
        primitives: primitives.iter().map(|p| p.primitive).collect(),
    }
}

fn shape_primitives(shape: &Shape) -> Vec<BvhPrimitive> {
    let positions = &shape.positions;
    if !shape.points.is_empty() {
        shape
            .points
            .iter()
            .enumerate()
            .map(|(idx, &p)| {
                let bbox = point_bounds(positions[p as usize], shape.radius[p as usize]);
                BvhPrimitive {
                    bbox,
                    center: bbox.centroid(),
                    primitive: idx as u32,
                }
            })
            .collect()
    } else if !shape.lines.is_empty() {
        shape
            .lines
            .iter()
            .enumerate()
            .map(|(idx, &[a, b])| {
                let bbox = line_bounds(
                    positions[a as usize],
                    positions[b as usize],
                    shape.radius[a as usize],
                    shape.radius[b as usize],
                );
                BvhPrimitive {
                    bbox,
                    center: bbox.centroid(),
                    primitive: idx as u32,
                }
            })
            .collect()
    } else {
        shape
            .triangles
            .iter()
            .enumerate()
            .map(|(idx, &[a, b, c])| {
                let bbox = triangle_bounds(
                    positions[a as usize],
                    positions[b as usize],
                    positions[c as usize],
                );
                BvhPrimitive {
                    bbox,
                    center: bbox.centroid(),
                    primitive: idx as u32,
                }
            })
            .collect()
    }
}

/// Build the scene's acceleration structures.
///
/// Validates the scene first: a malformed scene (out-of-range indices,
/// missing radii, dangling handles) aborts the build. The optional progress
/// callback is invoked at stage boundaries, once per shape and once for the
/// instance-level tree.
pub fn init_bvh(
    scene: &Scene,
    _params: &Params,
    mut progress: Option<ProgressCallback>,
) -> Result<SceneBvh, SceneError> {
    scene.validate()?;

    let total = scene.shapes.len() + 1;

    // shapes
    let mut shapes = Vec::with_capacity(scene.shapes.len());
    for (idx, shape) in scene.shapes.iter().enumerate() {
        if let Some(cb) = progress.as_deref_mut() {
            cb("build shape bvh", idx, total);
        }
        let mut primitives = shape_primitives(shape);
        shapes.push(build_bvh(&mut primitives));
    }

    // instance bounds in world space
    if let Some(cb) = progress.as_deref_mut() {
        cb("build scene bvh", total - 1, total);
    }
    let mut primitives: Vec<BvhPrimitive> = scene
        .instances
        .iter()
        .enumerate()
        .map(|(idx, instance)| {
            let tree = &shapes[instance.shape.0 as usize];
            let bbox = if tree.primitives.is_empty() {
                Aabb::EMPTY
            } else {
                instance.frame.transform_aabb(&tree.nodes[0].bbox)
            };
            BvhPrimitive {
                bbox,
                center: bbox.centroid(),
                primitive: idx as u32,
            }
        })
        .collect();
    let instances = build_bvh(&mut primitives);

    if let Some(cb) = progress.as_deref_mut() {
        cb("build bvh", total, total);
    }
    log::debug!(
        "built scene bvh: {} shapes, {} instances, {} top-level nodes",
        shapes.len(),
        scene.instances.len(),
        instances.nodes.len()
    );

    Ok(SceneBvh { shapes, instances })
}

/// Intersect a ray with one shape's BVH. The ray is in shape-local space.
fn intersect_shape_bvh(
    shape: &Shape,
    bvh: &BvhTree,
    ray_in: &Ray,
    find_any: bool,
) -> Option<(u32, Vec2, f32)> {
    if bvh.nodes.is_empty() {
        return None;
    }

    // node stack
    let mut stack = [0u32; BVH_STACK_SIZE];
    let mut depth = 0;
    stack[depth] = 0;
    depth += 1;

    let mut hit: Option<(u32, Vec2, f32)> = None;

    // copy the ray so the closest hit so far tightens tmax
    let mut ray = *ray_in;

    // prepare ray for fast queries
    let dir_inv = Vec3::new(
        1.0 / ray.direction.x,
        1.0 / ray.direction.y,
        1.0 / ray.direction.z,
    );
    let dir_neg = [dir_inv.x < 0.0, dir_inv.y < 0.0, dir_inv.z < 0.0];

    while depth > 0 {
        depth -= 1;
        let node = &bvh.nodes[stack[depth] as usize];

        if !node.bbox.hit(ray.origin, dir_inv, ray.tmin, ray.tmax) {
            continue;
        }

        if node.internal {
            // push the children so the near one (along the split axis) pops
            // first
            if dir_neg[node.axis as usize] {
                stack[depth] = node.start;
                stack[depth + 1] = node.start + 1;
            } else {
                stack[depth] = node.start + 1;
                stack[depth + 1] = node.start;
            }
            depth += 2;
        } else if !shape.points.is_empty() {
            for idx in node.start..node.start + node.num as u32 {
                let element = bvh.primitives[idx as usize];
                let v = shape.points[element as usize] as usize;
                if let Some((uv, distance)) =
                    intersect_point(&ray, shape.positions[v], shape.radius[v])
                {
                    hit = Some((element, uv, distance));
                    ray.tmax = distance;
                }
            }
        } else if !shape.lines.is_empty() {
            for idx in node.start..node.start + node.num as u32 {
                let element = bvh.primitives[idx as usize];
                let [a, b] = shape.lines[element as usize];
                if let Some((uv, distance)) = intersect_line(
                    &ray,
                    shape.positions[a as usize],
                    shape.positions[b as usize],
                    shape.radius[a as usize],
                    shape.radius[b as usize],
                ) {
                    hit = Some((element, uv, distance));
                    ray.tmax = distance;
                }
            }
        } else if !shape.triangles.is_empty() {
            for idx in node.start..node.start + node.num as u32 {
                let element = bvh.primitives[idx as usize];
                let [a, b, c] = shape.triangles[element as usize];
                if let Some((uv, distance)) = intersect_triangle(
                    &ray,
                    shape.positions[a as usize],
                    shape.positions[b as usize],
                    shape.positions[c as usize],
                ) {
                    hit = Some((element, uv, distance));
                    ray.tmax = distance;
                }
            }
        }

        if find_any && hit.is_some() {
            return hit;
        }
    }

    hit
}

/// Intersect a ray with the whole scene.
///
/// Returns the closest hit inside the ray's range, or the first hit found
/// when `find_any` is set. `non_rigid_frames` selects the general inverse
/// for instance frames carrying scale or shear.
pub fn intersect_scene_bvh(
    scene: &Scene,
    bvh: &SceneBvh,
    ray_in: &Ray,
    find_any: bool,
    non_rigid_frames: bool,
) -> Intersection {
    let mut intersection = Intersection::default();
    if bvh.instances.nodes.is_empty() {
        return intersection;
    }

    let mut stack = [0u32; BVH_STACK_SIZE];
    let mut depth = 0;
    stack[depth] = 0;
    depth += 1;

    let mut ray = *ray_in;
    let dir_inv = Vec3::new(
        1.0 / ray.direction.x,
        1.0 / ray.direction.y,
        1.0 / ray.direction.z,
    );
    let dir_neg = [dir_inv.x < 0.0, dir_inv.y < 0.0, dir_inv.z < 0.0];

    while depth > 0 {
        depth -= 1;
        let node = &bvh.instances.nodes[stack[depth] as usize];

        if !node.bbox.hit(ray.origin, dir_inv, ray.tmin, ray.tmax) {
            continue;
        }

        if node.internal {
            if dir_neg[node.axis as usize] {
                stack[depth] = node.start;
                stack[depth + 1] = node.start + 1;
            } else {
                stack[depth] = node.start + 1;
                stack[depth + 1] = node.start;
            }
            depth += 2;
        } else {
            for idx in node.start..node.start + node.num as u32 {
                let instance_id = bvh.instances.primitives[idx as usize];
                let instance = &scene.instances[instance_id as usize];
                let local_ray = instance.frame.inverse(non_rigid_frames).transform_ray(&ray);
                if let Some((element, uv, distance)) = intersect_shape_bvh(
                    scene.shape(instance.shape),
                    &bvh.shapes[instance.shape.0 as usize],
                    &local_ray,
                    find_any,
                ) {
                    intersection = Intersection {
                        hit: true,
                        instance: instance_id,
                        element,
                        uv,
                        distance,
                    };
                    ray.tmax = distance;
                }
            }
        }

        if find_any && intersection.hit {
            return intersection;
        }
    }

    intersection
}

/// Intersect a ray with a single instance's shape BVH.
pub fn intersect_instance_bvh(
    scene: &Scene,
    bvh: &SceneBvh,
    instance_id: InstanceId,
    ray: &Ray,
    find_any: bool,
    non_rigid_frames: bool,
) -> Intersection {
    let instance = &scene.instances[instance_id.0 as usize];
    let local_ray = instance.frame.inverse(non_rigid_frames).transform_ray(ray);
    match intersect_shape_bvh(
        scene.shape(instance.shape),
        &bvh.shapes[instance.shape.0 as usize],
        &local_ray,
        find_any,
    ) {
        Some((element, uv, distance)) => Intersection {
            hit: true,
            instance: instance_id.0,
            element,
            uv,
            distance,
        },
        None => Intersection::default(),
    }
}
