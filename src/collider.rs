//! The collider intersection vocabulary beyond the VKDT/chunk voxel grid
//! (§11, supplemented from `RayTracing.cpp`'s `Intersection::intersectCollider`
//! family): an axis-aligned cuboid collider, a sphere, a finished
//! Möller-Trumbore triangle test, and the teleporting sphere pair ("portal")
//! the path tracer's transport step consumes.
//!
//! The original declares stubs for `FCuboid`/`FCylinder`/`FCone`/`FRect`/
//! `FLine`/`FPlane` colliders that all return "invalid" -- this crate only
//! implements the two variants the source actually finishes (`ICuboid` and
//! `FSphere`), matching `SPEC_FULL.md` §11's stated scope.

use crate::geom::cuboid::{face_index, intersect_cuboid, FCuboid, ICuboid};
use crate::geom::ray::{PaletteIndex, Ray, RayIntersection, RayIntersectionKind};
use crate::geom::vector::V3cf32;
use crate::V3c;

/// A sphere collider in world-float coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FSphere {
    pub origin: V3cf32,
    pub radius: f32,
}

/// Entry/exit `t` of a detailed sphere test; `None` if the ray never enters
/// the sphere, or enters strictly behind the ray origin.
#[derive(Debug, Clone, Copy)]
pub struct SphereHit {
    pub t_enter: f32,
    pub t_exit: f32,
}

/// Ray/sphere intersection via the enter/exit parametric distances, following
/// the original's right-triangle construction (`side_q`/`side_p`/radius).
pub fn intersect_sphere_detailed(ray: &Ray, sphere: &FSphere) -> Option<SphereHit> {
    let to_sphere = sphere.origin - ray.origin;
    let t_to_hit_average = to_sphere.dot(&ray.direction);
    let closest_point = ray.origin + ray.direction * t_to_hit_average;
    let side_q = sphere.origin - closest_point;
    let q_squared = side_q.dot(&side_q);
    let r_squared = sphere.radius * sphere.radius;
    if q_squared > r_squared {
        return None;
    }
    let p_length = (r_squared - q_squared).sqrt();
    let t_enter = t_to_hit_average - p_length;
    let t_exit = t_to_hit_average + p_length;
    if t_enter <= 0.0 {
        return None;
    }
    Some(SphereHit { t_enter, t_exit })
}

/// A simple hit/miss sphere test built on the detailed one.
pub fn intersect_sphere(ray: &Ray, sphere: &FSphere) -> RayIntersection {
    match intersect_sphere_detailed(ray, sphere) {
        Some(hit) => RayIntersection {
            kind: RayIntersectionKind::HitCollider,
            t: hit.t_enter,
            voxel: V3c::new(0, 0, 0),
            face: 0,
            palette: -1,
        },
        None => RayIntersection::MISS,
    }
}

/// Hit/miss test against an `ICuboid` collider, reusing the slab method
/// shared with the VKDT world-bounds test and the chunk DDA clip.
pub fn intersect_cuboid_collider(ray: &Ray, cuboid: &ICuboid) -> RayIntersection {
    let bounds: FCuboid = cuboid.to_f32();
    let inv_dir = ray.direction.recip();
    match intersect_cuboid(&bounds, ray, &inv_dir) {
        Some(hit) => RayIntersection {
            kind: RayIntersectionKind::HitCollider,
            t: hit.t_min,
            voxel: V3c::new(0, 0, 0),
            face: face_index(hit.last_min_axis, &ray.direction),
            palette: -1,
        },
        None => RayIntersection::MISS,
    }
}

/// A triangle in world-float coordinates, the leaf primitive of the
/// (unfinished, per §1) mesh BVH. Tested on its own via Möller-Trumbore;
/// `SPEC_FULL.md` §11 scopes this crate to the test itself, not a mesh tree.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub vertices: [V3cf32; 3],
}

const TRIANGLE_EPSILON: f32 = 1e-7;

/// Möller-Trumbore ray/triangle intersection. A hit's `face` is always 0
/// (triangles have no face-index vocabulary); `palette` is always -1.
pub fn intersect_triangle(ray: &Ray, triangle: &Triangle) -> RayIntersection {
    let v0 = triangle.vertices[0];
    let v1 = triangle.vertices[1];
    let v2 = triangle.vertices[2];

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(&h);
    if a.abs() < TRIANGLE_EPSILON {
        return RayIntersection::MISS;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return RayIntersection::MISS;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return RayIntersection::MISS;
    }

    let t = f * edge2.dot(&q);
    if t <= 0.0 {
        return RayIntersection::MISS;
    }

    RayIntersection {
        kind: RayIntersectionKind::HitTriangle,
        t,
        voxel: V3c::new(0, 0, 0),
        face: 0,
        palette: -1,
    }
}

/// Closest of the `tree`'s triangles, linear-searched (§11: the original's
/// own mesh tree traversal is an unfinished linear scan -- "Father forgive
/// me, for I have sinned" -- and this crate specifies only the leaf test).
pub fn intersect_triangles_linear(ray: &Ray, triangles: &[Triangle]) -> RayIntersection {
    let mut best = RayIntersection::MISS;
    for triangle in triangles {
        let hit = intersect_triangle(ray, triangle);
        if hit.kind.is_valid() && hit.t < best.t {
            best = hit;
        }
    }
    best
}

/// The teleporting sphere pair: two `FSphere` sites of equal radius. A ray
/// entering one site is relocated to exit the other at the same depth past
/// entry, continuing in the same direction (§4.9, §8 Scenario D).
#[derive(Debug, Clone, Copy)]
pub struct Portal {
    pub sites: [V3cf32; 2],
    pub radius: f32,
}

/// Result of a portal test: which site was entered, the entry/exit `t`, and
/// the ray the path should continue with past the teleport.
#[derive(Debug, Clone, Copy)]
pub struct PortalHit {
    pub site_index: usize,
    pub t_enter: f32,
    pub continuation: Ray,
}

impl Portal {
    fn site(&self, index: usize) -> FSphere {
        FSphere {
            origin: self.sites[index],
            radius: self.radius,
        }
    }

    /// Tests both sites and returns the nearer valid entry, relocating the
    /// ray to the other site's surface plus the inter-site offset -- the
    /// same displacement vector regardless of where on the sphere the ray
    /// entered, matching the original's `offset_to_other` translation.
    pub fn intersect(&self, ray: &Ray) -> Option<PortalHit> {
        let mut best: Option<(usize, SphereHit)> = None;
        for index in 0..2 {
            if let Some(hit) = intersect_sphere_detailed(ray, &self.site(index)) {
                if best.is_none() || hit.t_enter < best.unwrap().1.t_enter {
                    best = Some((index, hit));
                }
            }
        }

        let (site_index, hit) = best?;
        let other_index = 1 - site_index;
        let offset_to_other = self.sites[other_index] - self.sites[site_index];
        let exit_point = ray.point_at(hit.t_exit);

        Some(PortalHit {
            site_index,
            t_enter: hit.t_enter,
            continuation: Ray::new(exit_point + offset_to_other, ray.direction),
        })
    }
}
