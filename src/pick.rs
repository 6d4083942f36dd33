//! Object picking and selection.
//!
//! Picking casts a world-space ray (see [`screen_ray`](crate::camera::screen_ray))
//! against an axis-aligned box of fixed size centred on every scene object and
//! selects the nearest hit in front of the camera:
//! 1. Build the ray from the cursor and the current camera/projection
//! 2. Intersect it with each object's box using the slab test
//! 3. Keep the smallest positive entry distance; on equal distances the earlier object wins

use cgmath::{EuclideanSpace, Point3, Vector3};

use crate::data_structures::scene_graph::SceneObject;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    /// Not required to be normalized, but distances are only comparable between
    /// rays with the same direction length.
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn around(center: Vector3<f32>, half_extent: f32) -> Self {
        let half = Vector3::new(half_extent, half_extent, half_extent);
        Self {
            min: Point3::from_vec(center - half),
            max: Point3::from_vec(center + half),
        }
    }
}

/// Ray parameter at which the ray enters `aabb`, if the ray's line hits it.
///
/// The entry distance is negative when the origin lies inside or past the box;
/// callers decide what to do with those. A zero direction component divides to
/// an infinite slab bound, which the comparisons below handle as-is.
pub fn intersect_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let slab = |min: f32, max: f32, origin: f32, direction: f32| {
        let t0 = (min - origin) / direction;
        let t1 = (max - origin) / direction;
        if t0 > t1 { (t1, t0) } else { (t0, t1) }
    };

    let (mut tmin, mut tmax) = slab(aabb.min.x, aabb.max.x, ray.origin.x, ray.direction.x);

    let (tymin, tymax) = slab(aabb.min.y, aabb.max.y, ray.origin.y, ray.direction.y);
    if tmin > tymax || tymin > tmax {
        return None;
    }
    if tymin > tmin {
        tmin = tymin;
    }
    if tymax < tmax {
        tmax = tymax;
    }

    let (tzmin, tzmax) = slab(aabb.min.z, aabb.max.z, ray.origin.z, ray.direction.z);
    if tmin > tzmax || tzmin > tmax {
        return None;
    }
    if tzmin > tmin {
        tmin = tzmin;
    }

    Some(tmin)
}

/// Index of the nearest object whose pick box the ray enters in front of its origin.
pub fn pick(ray: &Ray, objects: &[SceneObject], half_extent: f32) -> Option<usize> {
    let mut closest: Option<(usize, f32)> = None;
    for (idx, object) in objects.iter().enumerate() {
        let Some(t) = intersect_aabb(ray, &Aabb::around(object.position, half_extent)) else {
            continue;
        };
        if t <= 0.0 || t.is_nan() {
            continue;
        }
        if closest.is_none_or(|(_, best)| t < best) {
            closest = Some((idx, t));
        }
    }
    if let Some((idx, t)) = closest {
        log::debug!("Picked {} at distance {t}", objects[idx].name);
    }
    closest.map(|(idx, _)| idx)
}
