//! The tile-scheduled render loop (§4.9, §4.10), grounded on `Raytracer.cpp`'s
//! `RenderWindow::renderFrame` and `RayTracing.cpp`'s worker dispatch: tiles
//! are handed to a `WorkGroup`, each sampled `num_rays_per_pixel` times, and
//! accumulated into the final `ImageBuffer`.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::chunk::ChunkTable;
use crate::collider::Portal;
use crate::error::Result;
use crate::geom::vector::V3cf32;
use crate::image::{pixel_from_color, ImageBuffer};
use crate::pathtracer::buffer::PathBuffer;
use crate::pathtracer::camera::{Camera, CameraRayGenerator, ImageTile, TileLayout};
use crate::pathtracer::settings::{RenderControl, TracerSettings};
use crate::pathtracer::shading::determine_colors;
use crate::pathtracer::transport::{trace_paths, Scene};
use crate::vkdt::traversal::TraversalStack;
use crate::vkdt::tree::TreeData;
use crate::workgroup::WorkGroup;

/// A fully resolved tile: its bounds and its accumulated linear-light color
/// per pixel, row-major within the tile.
struct RenderedTile {
    tile: ImageTile,
    colors: Vec<V3cf32>,
}

/// Renders one tile by sampling every pixel `num_rays_per_pixel` times and
/// averaging. `tile_seed` makes the tile's sampling reproducible regardless
/// of which worker thread or scheduling order ran it.
fn render_tile(
    tree: &TreeData,
    chunk_table: &ChunkTable,
    portals: &[Portal],
    camera: &Camera,
    image_dims: (i32, i32),
    settings: &TracerSettings,
    tile: ImageTile,
    tile_seed: u64,
) -> Result<RenderedTile> {
    let scene = Scene {
        tree,
        chunk_table,
        portals,
    };
    let camera_rays = CameraRayGenerator::new(camera, image_dims);
    let mut rng = StdRng::seed_from_u64(tile_seed);
    let mut stack = TraversalStack::with_capacity_for_depth(tree.max_depth_reached.max(1));
    let mut colors = vec![V3cf32::new(0.0, 0.0, 0.0); tile.pixel_count()];

    for sample in 0..settings.num_rays_per_pixel {
        let mut rays = Vec::with_capacity(tile.pixel_count());
        for local_y in 0..tile.height {
            for local_x in 0..tile.width {
                rays.push(camera_rays.ray_from_pixel_jittered(tile.x + local_x, tile.y + local_y, &mut rng));
            }
        }

        let mut buffer = PathBuffer::new(rays.len(), settings.max_path_len, sample > 0);
        trace_paths(&scene, &rays, &mut buffer, &mut stack, &mut rng)?;
        let sample_colors = determine_colors(&buffer, settings);

        for (accumulated, sampled) in colors.iter_mut().zip(sample_colors) {
            *accumulated = *accumulated + sampled;
        }
    }

    let inv_samples = 1.0 / settings.num_rays_per_pixel as f32;
    for color in &mut colors {
        *color = *color * inv_samples;
    }

    Ok(RenderedTile { tile, colors })
}

/// Renders the whole frame described by `settings`, polling `control`
/// between scheduling batches so a user-driven abort can stop launching new
/// tiles without blocking on the ones already in flight.
///
/// `tree`/`chunk_table`/`portals` are `Arc`-shared rather than borrowed so
/// each tile's background job can own a cheap handle into the scene without
/// this call having to block until every worker thread has finished.
///
/// `base_seed` lets a caller reproduce a render exactly: two renders with
/// the same scene, settings and `base_seed` produce pixel-identical output.
pub fn render_frame(
    tree: Arc<TreeData>,
    chunk_table: Arc<ChunkTable>,
    portals: Arc<[Portal]>,
    camera: Camera,
    settings: &TracerSettings,
    control: &dyn RenderControl,
    base_seed: u64,
) -> Result<ImageBuffer> {
    let tiles = TileLayout::tiles(&settings.image_config);
    let image_dims = (settings.image_config.width, settings.image_config.height);

    let group: WorkGroup<Result<RenderedTile>> = WorkGroup::new(settings.num_render_threads.max(1));
    let mut image = ImageBuffer::new(settings.image_config.width as usize, settings.image_config.height as usize);

    let mut next_tile_index = 0usize;
    let mut in_flight = 0usize;
    let mut aborted = false;

    while in_flight > 0 || (next_tile_index < tiles.len() && !aborted) {
        if control.should_abort() {
            aborted = true;
        }

        while !aborted && next_tile_index < tiles.len() {
            let tile = tiles[next_tile_index];
            let tile_seed = base_seed ^ (next_tile_index as u64).wrapping_mul(0x9E3779B97F4A7C15);

            let tree = Arc::clone(&tree);
            let chunk_table = Arc::clone(&chunk_table);
            let portals = Arc::clone(&portals);
            let settings_owned = *settings;

            let launched = group.launch_job(move || {
                render_tile(
                    &tree,
                    &chunk_table,
                    &portals,
                    &camera,
                    image_dims,
                    &settings_owned,
                    tile,
                    tile_seed,
                )
            });

            match launched {
                Some(_) => {
                    next_tile_index += 1;
                    in_flight += 1;
                }
                None => break,
            }
        }

        for worker_id in group.waiting_workers() {
            if let Some(result) = group.worker_output(worker_id) {
                group.mark_available(worker_id)?;
                in_flight -= 1;
                let rendered = result?;
                write_tile_into_image(&mut image, &rendered);
            }
        }

        if in_flight > 0 {
            std::thread::yield_now();
        }
    }

    Ok(image)
}

fn write_tile_into_image(image: &mut ImageBuffer, rendered: &RenderedTile) {
    for local_y in 0..rendered.tile.height {
        for local_x in 0..rendered.tile.width {
            let color = rendered.colors[(local_y * rendered.tile.width + local_x) as usize];
            image.set(
                (rendered.tile.x + local_x) as usize,
                (rendered.tile.y + local_y) as usize,
                pixel_from_color(color),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;
    use crate::geom::ICuboid;
    use crate::pathtracer::settings::NeverAbort;
    use crate::vkdt::builder::build_tree;
    use crate::vkdt::tree::BuildSettings;
    use crate::voxel::Voxel;
    use crate::V3c;

    #[test]
    fn rendering_a_tiny_frame_fills_every_pixel() {
        let mut table = ChunkTable::new();
        let mut chunk = Chunk::default();
        chunk.set_voxel(V3c::new(16, 16, 16), Voxel::LightEmitter);
        table.set(V3c::new(0, 0, 0), chunk);
        let build_settings = BuildSettings {
            bounds: ICuboid::new(V3c::new(0, 0, 0), V3c::new(32, 32, 32)),
            max_depth: 6,
            mandatory_leaf_volume: 1,
            ..Default::default()
        };
        let tree = build_tree(&table, &build_settings).unwrap();

        let camera = Camera {
            position: V3cf32::new(-5.0, 16.0, 16.0),
            forward: V3cf32::new(1.0, 0.0, 0.0),
            up: V3cf32::new(0.0, 1.0, 0.0),
            fov_degrees: 70.0,
        };
        let mut settings = TracerSettings::default();
        settings.image_config.width = 4;
        settings.image_config.height = 4;
        settings.image_config.tile_width = 2;
        settings.image_config.tile_height = 2;
        settings.num_rays_per_pixel = 2;
        settings.num_render_threads = 2;

        let image = render_frame(
            Arc::new(tree),
            Arc::new(table),
            Arc::from(Vec::<Portal>::new()),
            camera,
            &settings,
            &NeverAbort,
            42,
        )
        .unwrap();

        assert_eq!(image.width, 4);
        assert_eq!(image.height, 4);
    }
}
