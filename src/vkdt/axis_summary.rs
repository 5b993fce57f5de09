//! Per-axis statistics of a sub-cuboid, generated while the builder holds
//! no lock (all table access goes through the per-build `VoxelLookup`).

use crate::chunk::{ChunkTable, VoxelLookup};
use crate::geom::ICuboid;
use crate::vkdt::node::Axis;
use crate::voxel::Voxel;
use crate::V3c;

#[derive(Debug, Clone)]
pub struct AxisSummary {
    pub axis: Axis,
    /// Offset of this sub-cuboid from the tree origin along `axis`.
    pub offset: i32,
    pub plane_area: i64,
    pub plane_perimeter: i64,
    pub total_solid_count: i64,
    pub solids_per_plane: Vec<i64>,
    /// The shared material of a slice if every voxel in it is the same
    /// kind; `Voxel::Empty` otherwise (including an all-air slice).
    pub homogeneous_material_per_plane: Vec<Voxel>,
}

/// Builds the `AxisSummary` for `cuboid` (in tree-local coordinates) along
/// `axis`, translating to world voxel coordinates via `tree_origin` to
/// query the lookup cache.
pub fn generate_summary(
    table: &ChunkTable,
    lookup: &mut VoxelLookup,
    tree_origin: V3c<i32>,
    cuboid: ICuboid,
    axis: Axis,
) -> AxisSummary {
    let axis_index = axis.index();
    let (other_a, other_b) = other_axes(axis_index);
    let num_slices = cuboid.extent.component(axis_index);
    let extent_a = cuboid.extent.component(other_a);
    let extent_b = cuboid.extent.component(other_b);

    let mut solids_per_plane = Vec::with_capacity(num_slices as usize);
    let mut homogeneous_material_per_plane = Vec::with_capacity(num_slices as usize);
    let mut total_solid_count = 0i64;

    for slice in 0..num_slices {
        let mut slice_solid = 0i64;
        let mut first_kind: Option<Voxel> = None;
        let mut homogeneous = true;

        for a in 0..extent_a {
            for b in 0..extent_b {
                let mut local = cuboid.origin;
                local.set_component(axis_index, cuboid.origin.component(axis_index) + slice);
                local.set_component(other_a, cuboid.origin.component(other_a) + a);
                local.set_component(other_b, cuboid.origin.component(other_b) + b);

                let global = tree_origin + local;
                let voxel = lookup.voxel_at(table, global);

                if voxel.is_solid() {
                    slice_solid += 1;
                }
                match first_kind {
                    None => first_kind = Some(voxel),
                    Some(kind) => {
                        if kind != voxel {
                            homogeneous = false;
                        }
                    }
                }
            }
        }

        total_solid_count += slice_solid;
        solids_per_plane.push(slice_solid);
        homogeneous_material_per_plane.push(if homogeneous {
            first_kind.unwrap_or(Voxel::Empty)
        } else {
            Voxel::Empty
        });
    }

    AxisSummary {
        axis,
        offset: cuboid.origin.component(axis_index),
        plane_area: extent_a as i64 * extent_b as i64,
        plane_perimeter: 2 * (extent_a as i64 + extent_b as i64),
        total_solid_count,
        solids_per_plane,
        homogeneous_material_per_plane,
    }
}

fn other_axes(axis: usize) -> (usize, usize) {
    match axis {
        0 => (1, 2),
        1 => (0, 2),
        2 => (0, 1),
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;

    #[test]
    fn homogeneous_slab_is_flagged_homogeneous_per_slice() {
        let mut table = ChunkTable::new();
        table.set(V3c::new(0, 0, 0), Chunk::filled(Voxel::Stone));
        let mut lookup = VoxelLookup::new();
        let cuboid = ICuboid::new(V3c::new(0, 0, 0), V3c::new(4, 4, 4));
        let summary = generate_summary(&table, &mut lookup, V3c::new(0, 0, 0), cuboid, Axis::Z);
        assert_eq!(summary.solids_per_plane.len(), 4);
        assert!(summary
            .homogeneous_material_per_plane
            .iter()
            .all(|&m| m == Voxel::Stone));
        assert_eq!(summary.total_solid_count, 4 * 4 * 4);
    }

    #[test]
    fn mixed_slice_is_not_homogeneous() {
        let mut table = ChunkTable::new();
        let mut chunk = Chunk::default();
        chunk.set_voxel(V3c::new(0, 0, 0), Voxel::Stone);
        table.set(V3c::new(0, 0, 0), chunk);
        let mut lookup = VoxelLookup::new();
        let cuboid = ICuboid::new(V3c::new(0, 0, 0), V3c::new(2, 2, 1));
        let summary = generate_summary(&table, &mut lookup, V3c::new(0, 0, 0), cuboid, Axis::Z);
        assert_eq!(summary.homogeneous_material_per_plane[0], Voxel::Empty);
        assert_eq!(summary.solids_per_plane[0], 1);
    }
}
