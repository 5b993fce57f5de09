//! The grid/chunk 3D-DDA raycaster (§4.8), grounded on original_source's
//! `RayTracing.cpp` (`Intersection::intersectChunks`, `localChunkIntersection`).
//! Used both as a standalone voxel-precise tracer and as the follow-up
//! resolver for a VKDT traversal's `possible-chunk-voxel` / `-unknown-type`
//! results (§9 design note).

use crate::chunk::ChunkTable;
use crate::error::{Result, VkdtError};
use crate::geom::cuboid::{face_index, intersect_cuboid, FCuboid};
use crate::geom::{Ray, RayIntersection, RayIntersectionKind};
use crate::voxel::{chunk_coord_from_voxel, local_voxel_from_global, Voxel, CHUNK_LEN};
use crate::V3c;

/// The per-ray state threaded through the inner chunk walk, carried across
/// chunk boundaries so `delta_t`/`step_dir` are computed exactly once.
#[derive(Debug, Clone, Copy)]
struct GridRay {
    delta_t: V3c<f32>,
    step_dir: V3c<i32>,
    local_grid_coord: V3c<i32>,
    t_next_crossing: V3c<f32>,
}

/// Index of the smallest of the three crossing distances; ties resolve
/// towards X, then Y, matching the branchless original.
fn smallest_index(v: V3c<f32>) -> usize {
    if v.x < v.y {
        if v.x < v.z {
            0
        } else {
            2
        }
    } else if v.y < v.z {
        1
    } else {
        2
    }
}

fn ray_step(direction: V3c<f32>) -> V3c<i32> {
    V3c::new(
        if direction.x >= 0.0 { 1 } else { -1 },
        if direction.y >= 0.0 { 1 } else { -1 },
        if direction.z >= 0.0 { 1 } else { -1 },
    )
}

/// Steps `grid_ray` through one chunk until it either finds a non-air voxel
/// or leaves the chunk's bounds. Returns `(updated_ray, Some((voxel, axis)))`
/// on a hit, `(updated_ray, None)` on leaving the chunk clean.
fn local_chunk_intersection(
    mut grid_ray: GridRay,
    voxel_at: impl Fn(V3c<i32>) -> Voxel,
) -> (GridRay, Option<(Voxel, usize)>) {
    loop {
        let axis = smallest_index(grid_ray.t_next_crossing);
        grid_ray
            .t_next_crossing
            .set_component(axis, grid_ray.t_next_crossing.component(axis) + grid_ray.delta_t.component(axis));
        grid_ray
            .local_grid_coord
            .set_component(axis, grid_ray.local_grid_coord.component(axis) + grid_ray.step_dir.component(axis));

        let coord = grid_ray.local_grid_coord;
        if coord.x >= CHUNK_LEN || coord.y >= CHUNK_LEN || coord.z >= CHUNK_LEN || coord.x < 0 || coord.y < 0 || coord.z < 0 {
            return (grid_ray, None);
        }

        let voxel = voxel_at(coord);
        if voxel.is_solid() {
            return (grid_ray, Some((voxel, axis)));
        }
    }
}

/// Casts `ray` through every loaded chunk it passes through, starting from
/// wherever it first enters the table's chunk-space bounding volume.
pub fn intersect_chunks(table: &ChunkTable, ray: &Ray) -> Result<RayIntersection> {
    if !ray.is_valid() {
        return Err(VkdtError::InvalidInput("ray direction must be unit length".into()));
    }

    let chunk_bounds = table.bounds();
    let world_bounds = FCuboid {
        origin: (chunk_bounds.origin * CHUNK_LEN).into(),
        extent: (chunk_bounds.extent * CHUNK_LEN).into(),
    };
    let inv_dir = ray.direction.recip();
    let Some(bounds_hit) = intersect_cuboid(&world_bounds, ray, &inv_dir) else {
        return Ok(RayIntersection::MISS);
    };
    if bounds_hit.t_max < 0.0 {
        return Ok(RayIntersection::MISS);
    }

    let advanced_origin = ray.point_at(bounds_hit.t_min.max(0.0));
    let global_voxel_coord = advanced_origin.floor();

    let mut t_initial_crossing = V3c::new(0.0, 0.0, 0.0);
    for axis in 0..3 {
        let is_positive = if ray.direction.component(axis) >= 0.0 { 1.0 } else { 0.0 };
        let floor_coord = global_voxel_coord.component(axis) as f32;
        let initial_t = (floor_coord + is_positive - advanced_origin.component(axis)) * inv_dir.component(axis);
        t_initial_crossing.set_component(axis, initial_t);
    }

    let mut grid_ray = GridRay {
        delta_t: V3c::new(inv_dir.x.abs(), inv_dir.y.abs(), inv_dir.z.abs()),
        step_dir: ray_step(ray.direction),
        local_grid_coord: local_voxel_from_global(global_voxel_coord),
        t_next_crossing: t_initial_crossing,
    };

    let mut curr_chunk_coord = chunk_coord_from_voxel(global_voxel_coord);
    let base_t = bounds_hit.t_min.max(0.0);

    while table.is_loaded(curr_chunk_coord) {
        let chunk = table.get(curr_chunk_coord).expect("just checked is_loaded");
        let (next_ray, hit) = local_chunk_intersection(grid_ray, |local| chunk.voxel_at(local));

        if let Some((voxel, axis)) = hit {
            let contact_t = base_t + next_ray.t_next_crossing.component(axis) - next_ray.delta_t.component(axis);
            let world_hit_coord = curr_chunk_coord * CHUNK_LEN + next_ray.local_grid_coord;
            return Ok(RayIntersection {
                kind: RayIntersectionKind::HitChunkVoxel,
                t: contact_t,
                voxel: world_hit_coord,
                face: face_index(axis, &ray.direction),
                palette: voxel.palette_index() as i16,
            });
        }

        let offset_to_next_chunk = chunk_coord_from_voxel(next_ray.local_grid_coord);
        grid_ray = GridRay {
            local_grid_coord: local_voxel_from_global(next_ray.local_grid_coord),
            ..next_ray
        };
        curr_chunk_coord = curr_chunk_coord + offset_to_next_chunk;
    }

    Ok(RayIntersection::MISS)
}

/// Resolves a VKDT traversal's `possible-chunk-voxel` / `unknown-type`
/// result by restarting a chunk-precise DDA walk from that leaf's entry
/// point. This is the chunk-DDA refinement the design notes call for,
/// rather than leaving such hits to a debug color.
pub fn resolve_possible_voxel(table: &ChunkTable, ray: &Ray, leaf_hit: &RayIntersection) -> Result<RayIntersection> {
    if !leaf_hit.kind.requires_lookup() {
        return Ok(*leaf_hit);
    }
    let restart_origin = ray.point_at((leaf_hit.t - 1e-4).max(0.0));
    let restarted_ray = Ray::new(restart_origin, ray.direction);
    intersect_chunks(table, &restarted_ray)
}
