//! Ray intersection against the pickable geometry of a scene graph.

use glam::{Mat4, Vec3};

use crate::obj::TriMesh;
use crate::scene::{Geometry, NodeId, SceneGraph};

const EPSILON: f32 = 1.0e-6;

/// Half-line in world space with a unit-length direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Intersection of a ray with one node's geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub node: NodeId,
    pub distance: f32,
    pub point: Vec3,
}

/// Intersects `ray` with every node below `subtree` (the subtree root itself is
/// excluded), returning hits ordered by ascending distance.
pub fn intersect_subtree(graph: &SceneGraph, subtree: NodeId, ray: &Ray) -> Vec<Hit> {
    let mut hits: Vec<Hit> = graph
        .descendants(subtree)
        .into_iter()
        .filter(|id| *id != subtree)
        .filter_map(|id| {
            let geometry = graph.node(id)?.geometry.as_ref()?;
            let distance = intersect_geometry(geometry, &graph.world_matrix(id), ray)?;
            Some(Hit {
                node: id,
                distance,
                point: ray.at(distance),
            })
        })
        .collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Distance along `ray` to `geometry` placed with `world`, if it is hit.
pub fn intersect_geometry(geometry: &Geometry, world: &Mat4, ray: &Ray) -> Option<f32> {
    if world.determinant().abs() < EPSILON * EPSILON {
        return None;
    }
    // Affine maps preserve the ray parameter, so local `t` is the world distance.
    let inverse = world.inverse();
    let origin = inverse.transform_point3(ray.origin);
    let direction = inverse.transform_vector3(ray.direction);
    match geometry {
        Geometry::Box { half_extents } => {
            intersect_aabb(-*half_extents, *half_extents, origin, direction)
        }
        Geometry::Mesh(mesh) => intersect_mesh(mesh, origin, direction),
    }
}

/// Slab test; returns the entry distance, or the exit distance from inside.
pub fn intersect_aabb(min: Vec3, max: Vec3, origin: Vec3, direction: Vec3) -> Option<f32> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (near, far) = {
            let t1 = (min[axis] - o) * inv;
            let t2 = (max[axis] - o) * inv;
            (t1.min(t2), t1.max(t2))
        };
        t_min = t_min.max(near);
        t_max = t_max.min(far);
        if t_min > t_max {
            return None;
        }
    }
    if t_max < 0.0 {
        return None;
    }
    Some(if t_min < 0.0 { t_max } else { t_min })
}

fn intersect_mesh(mesh: &TriMesh, origin: Vec3, direction: Vec3) -> Option<f32> {
    let (min, max) = mesh.bounds()?;
    intersect_aabb(min, max, origin, direction)?;
    mesh.triangles()
        .filter_map(|triangle| intersect_triangle(triangle, origin, direction))
        .min_by(f32::total_cmp)
}

/// Möller–Trumbore, double sided.
pub fn intersect_triangle([a, b, c]: [Vec3; 3], origin: Vec3, direction: Vec3) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t > EPSILON).then_some(t)
}
