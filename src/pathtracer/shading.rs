//! Color resolution for a traced path (§4.9), grounded on `Raytracer.cpp`'s
//! `determineColors`: a hadamard walk through the path's non-final material
//! hits, ending in either an emissive voxel's color or a sky/sun lookup.

use crate::geom::ray::RayIntersectionKind;
use crate::geom::vector::V3cf32;
use crate::pathtracer::buffer::PathBuffer;
use crate::pathtracer::settings::TracerSettings;
use crate::voxel::Voxel;

/// Sharpens the sun term into a narrow disk around `sun_direction`; higher
/// means a tighter, more concentrated highlight.
const SUN_SPECULAR_POWER: f32 = 128.0;

/// Flat sky brightness plus a specular sun highlight that falls off sharply
/// away from `sun_direction`, rather than a hard disk/sky cutoff.
fn sky_color(ray_direction: V3cf32, settings: &TracerSettings) -> V3cf32 {
    let sun_alignment = ray_direction.dot(&settings.sun_direction).clamp(0.0, 1.0);
    settings.sky_brightness + settings.sun_brightness * sun_alignment.powf(SUN_SPECULAR_POWER)
}

/// Resolves one ray's path to a single linear-light color: the hadamard
/// product of every non-final voxel hit's material color, times the end
/// vertex's contribution (an emissive voxel's color, the sky/sun term on a
/// miss, or black for a path that exhausted its bounce budget unresolved).
fn resolve_one_path(buffer: &PathBuffer, ray_index: usize, settings: &TracerSettings) -> V3cf32 {
    let result = buffer.results[ray_index];
    if result.num_filled == 0 {
        return V3cf32::new(0.0, 0.0, 0.0);
    }

    let slot_start = ray_index * buffer.max_path_len as usize;
    let vertices = &buffer.vertices[slot_start..slot_start + result.num_filled as usize];

    let mut accumulated = V3cf32::new(1.0, 1.0, 1.0);
    for vertex in &vertices[..vertices.len() - 1] {
        if vertex.kind == RayIntersectionKind::HitChunkVoxel {
            let material = Voxel::from_palette_index(vertex.palette.max(0) as u8);
            accumulated = accumulated * material.color();
        }
    }

    let last = vertices[vertices.len() - 1];
    let end_color = match last.kind {
        RayIntersectionKind::Miss => sky_color(last.source_ray.direction, settings),
        RayIntersectionKind::HitChunkVoxel if result.is_terminated_at_light => {
            Voxel::from_palette_index(last.palette.max(0) as u8).color()
        }
        // Traversal couldn't resolve the leaf's type even after the DDA
        // follow-up; flag it loudly instead of quietly shading it black.
        RayIntersectionKind::HitChunkVoxelUnknownType => V3cf32::new(10.0, 0.0, 0.0),
        _ => V3cf32::new(0.0, 0.0, 0.0),
    };

    accumulated * end_color
}

/// Resolves every ray's path in `buffer` to a linear-light color, in ray
/// order, ready for per-pixel sample averaging.
pub fn determine_colors(buffer: &PathBuffer, settings: &TracerSettings) -> Vec<V3cf32> {
    (0..buffer.results.len())
        .map(|ray_index| resolve_one_path(buffer, ray_index, settings))
        .collect()
}
