//! Per-ray path transport (§4.9), grounded on `Raytracer.cpp`'s `tracePaths`:
//! VKDT traversal with a chunk-DDA follow-up for ambiguous leaves, portal
//! consumption, light termination, and roughness-weighted bounce sampling.

use rand::Rng;

use crate::chunk::ChunkTable;
use crate::collider::Portal;
use crate::dda::resolve_possible_voxel;
use crate::error::Result;
use crate::geom::cuboid::FACE_NORMALS;
use crate::geom::ray::{PaletteIndex, Ray, RayIntersection, RayIntersectionKind};
use crate::pathtracer::buffer::{PathBuffer, PathVertex};
use crate::vkdt::traversal::{traverse, TraversalStack};
use crate::vkdt::tree::TreeData;
use crate::voxel::Voxel;

/// Everything a traced ray can intersect: the VKDT tree (with the chunk table
/// it was built from, for possible-voxel/unknown-type follow-ups) and the
/// portal pairs the scene places. A `&Scene` is shared read-only across every
/// worker thread tracing a tile.
pub struct Scene<'a> {
    pub tree: &'a TreeData,
    pub chunk_table: &'a ChunkTable,
    pub portals: &'a [Portal],
}

/// A hit closer than this to the ray's origin means the ray resumed inside
/// its own emitting geometry (typically a bounce origin epsilon that failed
/// to clear the surface it left); the whole path is discarded rather than
/// shaded, since it almost certainly reflects a grazing-angle self-hit
/// rather than a real second surface.
const TINY_EPSILON: f32 = 1e-3;

fn is_emissive_palette(palette: PaletteIndex) -> bool {
    palette >= 0 && Voxel::from_palette_index(palette as u8).is_emissive()
}

/// Uniform-random unit vector drawn by rejection sampling from the
/// enclosing cube.
fn random_unit_vector(rng: &mut impl Rng) -> crate::geom::vector::V3cf32 {
    use crate::geom::vector::V3cf32;
    loop {
        let candidate = V3cf32::new(
            rng.gen_range(-1.0f32..=1.0f32),
            rng.gen_range(-1.0f32..=1.0f32),
            rng.gen_range(-1.0f32..=1.0f32),
        );
        let length_sq = candidate.dot(&candidate);
        if length_sq > 1e-6 && length_sq <= 1.0 {
            return candidate / length_sq.sqrt();
        }
    }
}

/// One step of ray/scene intersection: the nearer of a VKDT-resolved voxel
/// hit and a portal entry.
enum SceneHit {
    Miss,
    Voxel(RayIntersection),
    Portal(crate::collider::PortalHit),
}

fn cast_scene_ray(scene: &Scene, ray: &Ray, stack: &mut TraversalStack) -> Result<SceneHit> {
    let voxel_hit = traverse(scene.tree, ray, stack)?;
    let voxel_hit = if voxel_hit.kind.requires_lookup() {
        resolve_possible_voxel(scene.chunk_table, ray, &voxel_hit)?
    } else {
        voxel_hit
    };

    let mut nearest_portal: Option<crate::collider::PortalHit> = None;
    for portal in scene.portals {
        if let Some(hit) = portal.intersect(ray) {
            if nearest_portal.as_ref().map_or(true, |best| hit.t_enter < best.t_enter) {
                nearest_portal = Some(hit);
            }
        }
    }

    match (voxel_hit.kind.is_valid(), nearest_portal) {
        (true, Some(portal_hit)) if portal_hit.t_enter < voxel_hit.t => Ok(SceneHit::Portal(portal_hit)),
        (true, _) => Ok(SceneHit::Voxel(voxel_hit)),
        (false, Some(portal_hit)) => Ok(SceneHit::Portal(portal_hit)),
        (false, None) => Ok(SceneHit::Miss),
    }
}

/// Traces every ray in `camera_rays` through `scene`, filling `buffer` with
/// one path per ray. `buffer` must have been sized for at least
/// `camera_rays.len()` rays at `settings.max_path_len`.
pub fn trace_paths(
    scene: &Scene,
    camera_rays: &[Ray],
    buffer: &mut PathBuffer,
    stack: &mut TraversalStack,
    rng: &mut impl Rng,
) -> Result<()> {
    for (ray_index, &camera_ray) in camera_rays.iter().enumerate() {
        let slot_start = ray_index * buffer.max_path_len as usize;
        let mut current_ray = camera_ray;
        let mut num_filled = 0u32;
        let mut terminated_at_light = false;
        let mut discarded = false;

        while num_filled < buffer.max_path_len {
            match cast_scene_ray(scene, &current_ray, stack)? {
                SceneHit::Miss => {
                    buffer.vertices[slot_start + num_filled as usize] = PathVertex {
                        source_ray: current_ray,
                        kind: RayIntersectionKind::Miss,
                        t_hit: f32::INFINITY,
                        palette: -1,
                    };
                    num_filled += 1;
                    terminated_at_light = true;
                    break;
                }
                SceneHit::Portal(portal_hit) => {
                    if portal_hit.t_enter < TINY_EPSILON {
                        discarded = true;
                        break;
                    }
                    buffer.vertices[slot_start + num_filled as usize] = PathVertex {
                        source_ray: current_ray,
                        kind: RayIntersectionKind::HitCollider,
                        t_hit: portal_hit.t_enter,
                        palette: -1,
                    };
                    num_filled += 1;
                    current_ray = portal_hit.continuation;
                    continue;
                }
                SceneHit::Voxel(hit) => {
                    if hit.t < TINY_EPSILON {
                        discarded = true;
                        break;
                    }
                    buffer.vertices[slot_start + num_filled as usize] = PathVertex {
                        source_ray: current_ray,
                        kind: hit.kind,
                        t_hit: hit.t,
                        palette: hit.palette,
                    };
                    num_filled += 1;

                    if hit.is_light_terminated(is_emissive_palette) {
                        terminated_at_light = is_emissive_palette(hit.palette);
                        break;
                    }

                    let normal = FACE_NORMALS[hit.face];
                    let material = Voxel::from_palette_index(hit.palette.max(0) as u8);
                    let reflected = current_ray.direction.reflect(&normal);
                    let scattered = (normal + random_unit_vector(rng)).normalized();
                    let bounce_direction = reflected.lerp(scattered, material.roughness()).normalized();
                    let bounce_origin = current_ray.point_at(hit.t) + normal * 1e-4;
                    current_ray = Ray::new(bounce_origin, bounce_direction);
                }
            }
        }

        if discarded || (buffer.should_compress_failed_paths && !terminated_at_light) {
            num_filled = 0;
            terminated_at_light = false;
        }
        buffer.results[ray_index].num_filled = num_filled;
        buffer.results[ray_index].is_terminated_at_light = terminated_at_light;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Chunk, ChunkTable};
    use crate::geom::vector::V3c;
    use crate::geom::ICuboid;
    use crate::vkdt::builder::build_tree;
    use crate::vkdt::tree::BuildSettings;
    use rand::SeedableRng;

    fn single_light_chunk() -> (ChunkTable, TreeData) {
        let mut table = ChunkTable::new();
        let mut chunk = Chunk::default();
        chunk.set_voxel(V3c::new(5, 5, 5), Voxel::LightEmitter);
        table.set(V3c::new(0, 0, 0), chunk);
        let settings = BuildSettings {
            bounds: ICuboid::new(V3c::new(0, 0, 0), V3c::new(32, 32, 32)),
            max_depth: 6,
            mandatory_leaf_volume: 1,
            ..Default::default()
        };
        let tree = build_tree(&table, &settings).unwrap();
        (table, tree)
    }

    #[test]
    fn a_ray_straight_into_a_light_terminates_on_the_first_vertex() {
        let (table, tree) = single_light_chunk();
        let scene = Scene {
            tree: &tree,
            chunk_table: &table,
            portals: &[],
        };
        let ray = Ray::new(V3c::new(-1.0, 5.5, 5.5), V3c::new(1.0, 0.0, 0.0));
        let mut buffer = PathBuffer::new(1, 4, false);
        let mut stack = TraversalStack::with_capacity_for_depth(tree.max_depth_reached.max(6));
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);

        trace_paths(&scene, &[ray], &mut buffer, &mut stack, &mut rng).unwrap();

        assert_eq!(buffer.results[0].num_filled, 1);
        assert!(buffer.results[0].is_terminated_at_light);
        assert_eq!(buffer.vertices[0].kind, RayIntersectionKind::HitChunkVoxel);
    }

    #[test]
    fn a_ray_through_empty_space_misses_and_terminates_at_sky() {
        let (table, tree) = single_light_chunk();
        let scene = Scene {
            tree: &tree,
            chunk_table: &table,
            portals: &[],
        };
        let ray = Ray::new(V3c::new(-1.0, 20.0, 20.0), V3c::new(1.0, 0.0, 0.0));
        let mut buffer = PathBuffer::new(1, 4, false);
        let mut stack = TraversalStack::with_capacity_for_depth(tree.max_depth_reached.max(6));
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);

        trace_paths(&scene, &[ray], &mut buffer, &mut stack, &mut rng).unwrap();

        assert_eq!(buffer.results[0].num_filled, 1);
        assert!(buffer.results[0].is_terminated_at_light);
        assert_eq!(buffer.vertices[0].kind, RayIntersectionKind::Miss);
    }

    #[test]
    fn a_portal_hop_records_a_collider_vertex_and_counts_as_a_bounce() {
        let (table, tree) = single_light_chunk();
        let portal = Portal {
            sites: [V3c::new(-2.0, 5.5, 5.5), V3c::new(5.0, 5.5, 5.5)],
            radius: 0.5,
        };
        let portals = [portal];
        let scene = Scene {
            tree: &tree,
            chunk_table: &table,
            portals: &portals,
        };
        let ray = Ray::new(V3c::new(-3.0, 5.5, 5.5), V3c::new(1.0, 0.0, 0.0));
        let mut buffer = PathBuffer::new(1, 4, false);
        let mut stack = TraversalStack::with_capacity_for_depth(tree.max_depth_reached.max(6));
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);

        trace_paths(&scene, &[ray], &mut buffer, &mut stack, &mut rng).unwrap();

        assert_eq!(buffer.vertices[0].kind, RayIntersectionKind::HitCollider);
        assert!(buffer.results[0].num_filled >= 1);
    }

    #[test]
    fn compressing_a_failed_path_rewinds_its_filled_count() {
        let mut table = ChunkTable::new();
        let mut chunk = Chunk::default();
        chunk.set_voxel(V3c::new(5, 5, 5), Voxel::Stone);
        table.set(V3c::new(0, 0, 0), chunk);
        let settings = BuildSettings {
            bounds: ICuboid::new(V3c::new(0, 0, 0), V3c::new(32, 32, 32)),
            max_depth: 6,
            mandatory_leaf_volume: 1,
            ..Default::default()
        };
        let tree = build_tree(&table, &settings).unwrap();
        let scene = Scene {
            tree: &tree,
            chunk_table: &table,
            portals: &[],
        };
        let ray = Ray::new(V3c::new(-1.0, 5.5, 5.5), V3c::new(1.0, 0.0, 0.0));
        let mut buffer = PathBuffer::new(1, 1, true);
        let mut stack = TraversalStack::with_capacity_for_depth(tree.max_depth_reached.max(6));
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);

        trace_paths(&scene, &[ray], &mut buffer, &mut stack, &mut rng).unwrap();

        assert_eq!(buffer.results[0].num_filled, 0);
        assert!(!buffer.results[0].is_terminated_at_light);
    }
}
