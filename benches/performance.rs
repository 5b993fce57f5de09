use criterion::{criterion_group, criterion_main};

use vkdtrace::chunk::{Chunk, ChunkTable};
use vkdtrace::dda::intersect_chunks;
use vkdtrace::geom::{ICuboid, Ray};
use vkdtrace::vkdt::{build_tree, traverse, BuildSettings, TraversalStack};
use vkdtrace::voxel::Voxel;
use vkdtrace::V3c;

const WORLD_CHUNKS_PER_AXIS: i32 = 4;

fn checkerboard_world() -> ChunkTable {
    let mut table = ChunkTable::new();
    for cx in 0..WORLD_CHUNKS_PER_AXIS {
        for cy in 0..WORLD_CHUNKS_PER_AXIS {
            for cz in 0..WORLD_CHUNKS_PER_AXIS {
                let mut chunk = Chunk::default();
                for x in 0..32 {
                    for y in 0..32 {
                        for z in 0..32 {
                            if (x + y + z) % 2 == 0 {
                                chunk.set_voxel(V3c::new(x, y, z), Voxel::Stone);
                            }
                        }
                    }
                }
                table.set(V3c::new(cx, cy, cz), chunk);
            }
        }
    }
    table
}

fn orbiting_ray(angle_degrees: f32, world_extent: f32) -> Ray {
    let radius = 2.0 * world_extent;
    let angle = angle_degrees.to_radians();
    let origin = V3c::new(angle.sin() * radius, radius * 0.5, angle.cos() * radius);
    let center = V3c::unit(world_extent * 0.5);
    Ray::new(origin, (center - origin).normalized())
}

fn criterion_benchmark(c: &mut criterion::Criterion) {
    let table = checkerboard_world();
    let world_extent = (WORLD_CHUNKS_PER_AXIS * 32) as f32;

    let build_settings = BuildSettings {
        bounds: ICuboid::new(
            V3c::new(0, 0, 0),
            V3c::new(
                WORLD_CHUNKS_PER_AXIS * 32,
                WORLD_CHUNKS_PER_AXIS * 32,
                WORLD_CHUNKS_PER_AXIS * 32,
            ),
        ),
        max_depth: 14,
        mandatory_leaf_volume: 8,
        ..Default::default()
    };

    c.bench_function("vkdt build", |b| {
        b.iter(|| build_tree(&table, &build_settings).unwrap());
    });

    let tree = build_tree(&table, &build_settings).unwrap();
    let mut stack = TraversalStack::with_capacity_for_depth(tree.max_depth_reached.max(build_settings.max_depth));

    c.bench_function("vkdt traverse", |b| {
        let mut angle = 0.0f32;
        b.iter(|| {
            angle += 1.0;
            let ray = orbiting_ray(angle, world_extent);
            traverse(&tree, &ray, &mut stack).unwrap()
        });
    });

    c.bench_function("chunk dda traverse", |b| {
        let mut angle = 0.0f32;
        b.iter(|| {
            angle += 1.0;
            let ray = orbiting_ray(angle, world_extent);
            intersect_chunks(&table, &ray).unwrap()
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
