//! The iterative, stack-driven VKDT builder (§4.6).

use crate::chunk::{ChunkTable, VoxelLookup};
use crate::error::{Result, VkdtError};
use crate::geom::ICuboid;
use crate::vkdt::axis_summary::{generate_summary, AxisSummary};
use crate::vkdt::classify::{classify_child, ClassifiedChild};
use crate::vkdt::node::{Axis, NodeContent, PackedNode};
use crate::vkdt::split::{axis_picker_exhaustive, axis_picker_longest, offset_picker_longest_run_bias, SplitRecommendation};
use crate::vkdt::tree::{BuildSettings, PropertyNode, TreeData};

const INITIAL_CAPACITY: usize = 64;
const GROWTH_FACTOR: usize = 2;

struct PendingFrame {
    depth: u8,
    fill_index: usize,
    cuboid: ICuboid,
}

fn max_possible_nodes(max_depth: u8) -> usize {
    let exponent = max_depth as u32 + 1;
    1usize
        .checked_shl(exponent)
        .and_then(|v| v.checked_sub(1))
        .unwrap_or(usize::MAX)
}

/// Allocates an initial geometry (and, if packed, descendant) array sized
/// per `settings.preallocate`, and validates the depth bounds up front.
fn validate_and_init(settings: &BuildSettings) -> Result<(Vec<PackedNode>, Option<Vec<i32>>, Option<Vec<PropertyNode>>, usize)> {
    if settings.max_depth == 0 || settings.max_depth > 100 {
        return Err(VkdtError::InvalidInput(format!(
            "max_depth {} out of range [1, 100]",
            settings.max_depth
        )));
    }
    if settings.preallocate && settings.max_depth > 30 {
        return Err(VkdtError::InvalidInput(format!(
            "max_depth {} exceeds 30 with preallocation requested",
            settings.max_depth
        )));
    }

    let cap = max_possible_nodes(settings.max_depth);
    let initial_capacity = if settings.preallocate {
        cap
    } else {
        INITIAL_CAPACITY.min(cap)
    };

    let mut geometry = Vec::with_capacity(initial_capacity);
    geometry.push(PackedNode::default());

    let descendants = if settings.should_pack_nodes {
        let mut d = Vec::with_capacity(initial_capacity);
        d.push(-1);
        Some(d)
    } else {
        None
    };

    let properties = if settings.should_calculate_non_leaf_properties {
        let mut p = Vec::with_capacity(initial_capacity);
        p.push(PropertyNode::default());
        Some(p)
    } else {
        None
    };

    Ok((geometry, descendants, properties, cap))
}

/// Ensures `geometry` (and `descendants`/`properties` in lockstep) can hold
/// index `needed_len - 1`, growing by doubling and clamped to `cap`.
fn grow_to(
    geometry: &mut Vec<PackedNode>,
    descendants: &mut Option<Vec<i32>>,
    properties: &mut Option<Vec<PropertyNode>>,
    needed_len: usize,
    cap: usize,
) -> Result<()> {
    if needed_len > cap {
        return Err(VkdtError::OutOfMemory {
            requested: needed_len,
            cap,
        });
    }
    if geometry.len() >= needed_len {
        return Ok(());
    }

    let mut new_capacity = geometry.capacity().max(1);
    while new_capacity < needed_len {
        new_capacity = (new_capacity * GROWTH_FACTOR).min(cap).max(needed_len.min(cap));
    }
    geometry.reserve(new_capacity.saturating_sub(geometry.len()));
    if let Some(d) = descendants.as_mut() {
        d.reserve(new_capacity.saturating_sub(d.len()));
    }
    if let Some(p) = properties.as_mut() {
        p.reserve(new_capacity.saturating_sub(p.len()));
    }

    while geometry.len() < needed_len {
        geometry.push(PackedNode::default());
        if let Some(d) = descendants.as_mut() {
            d.push(-1);
        }
        if let Some(p) = properties.as_mut() {
            p.push(PropertyNode::default());
        }
    }
    Ok(())
}

/// Splits `cuboid` (tree-local) at `axis`/`offset` into (near, far) children.
fn split_cuboid(cuboid: ICuboid, axis: Axis, offset: i32) -> (ICuboid, ICuboid) {
    let axis_index = axis.index();
    let origin_on_axis = cuboid.origin.component(axis_index);

    let mut near = cuboid;
    near.extent.set_component(axis_index, offset - origin_on_axis);

    let mut far = cuboid;
    far.origin.set_component(axis_index, offset);
    far.extent
        .set_component(axis_index, cuboid.extent.component(axis_index) - (offset - origin_on_axis));

    (near, far)
}

fn choose_split(
    table: &ChunkTable,
    lookup: &mut VoxelLookup,
    tree_origin: crate::V3c<i32>,
    cuboid: ICuboid,
    settings: &BuildSettings,
) -> (SplitRecommendation, AxisSummary) {
    if settings.optimization_level.is_exhaustive() {
        let summaries = [
            generate_summary(table, lookup, tree_origin, cuboid, Axis::X),
            generate_summary(table, lookup, tree_origin, cuboid, Axis::Y),
            generate_summary(table, lookup, tree_origin, cuboid, Axis::Z),
        ];
        let rec = axis_picker_exhaustive(&summaries);
        let chosen = summaries
            .into_iter()
            .find(|s| s.axis == rec.axis)
            .expect("recommendation axis always comes from one of the three summaries");
        (rec, chosen)
    } else {
        let axis_choice = axis_picker_longest(&cuboid.extent);
        let summary = generate_summary(table, lookup, tree_origin, cuboid, Axis::from_index(axis_choice));
        let rec = offset_picker_longest_run_bias(&summary);
        (rec, summary)
    }
}

/// Builds a VKDT from a snapshot of `table` per `settings` (§4.6). Returns
/// `VkdtError::OutOfMemory` if any array grow fails; the partial tree is
/// dropped along with the error.
pub fn build_tree(table: &ChunkTable, settings: &BuildSettings) -> Result<TreeData> {
    let (mut geometry, mut descendants, mut properties, cap) = validate_and_init(settings)?;
    let mut lookup = VoxelLookup::new();
    let tree_origin = settings.bounds.origin;

    let root_cuboid = ICuboid::new(crate::V3c::new(0, 0, 0), settings.bounds.extent);
    let mut stack = vec![PendingFrame {
        depth: 0,
        fill_index: 0,
        cuboid: root_cuboid,
    }];
    let mut max_depth_reached = 0u8;

    while let Some(frame) = stack.pop() {
        let (rec, chosen_summary) = choose_split(table, &mut lookup, tree_origin, frame.cuboid, settings);
        debug_assert!(
            rec.offset > frame.cuboid.origin.component(rec.axis.index())
                && rec.offset < frame.cuboid.origin.component(rec.axis.index()) + frame.cuboid.extent.component(rec.axis.index())
        );

        let (near_cuboid, far_cuboid) = split_cuboid(frame.cuboid, rec.axis, rec.offset);
        let local_split = (rec.offset - frame.cuboid.origin.component(rec.axis.index())) as usize;
        let num_slices = chosen_summary.solids_per_plane.len();

        let child_depth = frame.depth + 1;
        let at_max_depth = child_depth >= settings.max_depth.saturating_sub(1);

        let near_class = classify_child(
            &chosen_summary,
            0..local_split,
            near_cuboid.volume(),
            settings.mandatory_leaf_volume,
            at_max_depth,
        );
        let far_class = classify_child(
            &chosen_summary,
            local_split..num_slices,
            far_cuboid.volume(),
            settings.mandatory_leaf_volume,
            at_max_depth,
        );

        geometry[frame.fill_index] = PackedNode::from_content(NodeContent::Internal {
            axis: rec.axis,
            offset: rec.offset as u16,
        });

        if let Some(props) = properties.as_mut() {
            let density_percent = ((chosen_summary.total_solid_count as f64
                / frame.cuboid.volume().max(1) as f64)
                * 100.0) as u8;
            props[frame.fill_index] = PropertyNode { density_percent };
        }

        let (left_index, right_index) = if settings.should_pack_nodes {
            let left = geometry.len();
            grow_to(&mut geometry, &mut descendants, &mut properties, left + 2, cap)?;
            descendants.as_mut().unwrap()[frame.fill_index] = left as i32;
            (left, left + 1)
        } else {
            let left = 2 * frame.fill_index + 1;
            let right = 2 * frame.fill_index + 2;
            grow_to(&mut geometry, &mut descendants, &mut properties, right + 1, cap)?;
            (left, right)
        };

        for (child_index, class, child_cuboid) in [
            (left_index, near_class, near_cuboid),
            (right_index, far_class, far_cuboid),
        ] {
            match class {
                ClassifiedChild::Leaf(content) => {
                    geometry[child_index] = PackedNode::from_content(content);
                }
                ClassifiedChild::Internal => {
                    max_depth_reached = max_depth_reached.max(child_depth);
                    stack.push(PendingFrame {
                        depth: child_depth,
                        fill_index: child_index,
                        cuboid: child_cuboid,
                    });
                }
            }
        }
    }

    Ok(TreeData {
        bounds: settings.bounds,
        geometry,
        descendants,
        properties,
        max_depth_reached,
        is_packed: settings.should_pack_nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;
    use crate::vkdt::node::NodeContent;
    use crate::voxel::Voxel;
    use crate::V3c;

    fn settings(bounds: ICuboid, max_depth: u8) -> BuildSettings {
        BuildSettings {
            bounds,
            max_depth,
            mandatory_leaf_volume: 1,
            ..Default::default()
        }
    }

    #[test]
    fn scenario_c_slab_split_produces_one_internal_z_node() {
        let mut table = ChunkTable::new();
        let mut lower = Chunk::filled(Voxel::Stone);
        let upper = Chunk::filled(Voxel::Air);
        for z in 16..32 {
            for y in 0..32 {
                for x in 0..32 {
                    lower.set_voxel(V3c::new(x, y, z), Voxel::Air);
                }
            }
        }
        table.set(V3c::new(0, 0, 0), lower);
        let _ = upper;

        let bounds = ICuboid::new(V3c::new(0, 0, 0), V3c::new(32, 32, 32));
        let tree = build_tree(&table, &settings(bounds, 4)).unwrap();

        match tree.geometry[0].content() {
            NodeContent::Internal { axis, offset } => {
                assert_eq!(axis, Axis::Z);
                assert_eq!(offset, 16);
            }
            other => panic!("expected an internal Z split at the root, got {other:?}"),
        }

        let left = tree.left_child_index(0);
        let right = tree.right_child_index(0);
        assert_eq!(right, left + 1);
        assert_eq!(
            tree.geometry[left].content(),
            NodeContent::HomogeneousLeaf {
                palette: Voxel::Stone.palette_index()
            }
        );
        assert_eq!(tree.geometry[right].content(), NodeContent::EmptyLeaf);
    }

    #[test]
    fn scenario_f_builder_terminates_with_every_leaf_within_bounds() {
        let mut table = ChunkTable::new();
        let mut chunk = Chunk::default();
        let materials = [Voxel::Stone, Voxel::Metal];
        let mut i = 0usize;
        for z in 0..2 {
            for y in 0..2 {
                for x in 0..2 {
                    chunk.set_voxel(V3c::new(x, y, z), materials[i % 2]);
                    i += 1;
                }
            }
        }
        table.set(V3c::new(0, 0, 0), chunk);

        let bounds = ICuboid::new(V3c::new(0, 0, 0), V3c::new(2, 2, 2));
        let tree = build_tree(&table, &settings(bounds, 3)).unwrap();

        for node in &tree.geometry {
            if let NodeContent::Internal { .. } = node.content() {
                continue;
            }
        }
        assert!(tree.max_depth_reached <= 3);
    }

    #[test]
    fn rejects_max_depth_above_limit() {
        let bounds = ICuboid::new(V3c::new(0, 0, 0), V3c::new(4, 4, 4));
        let err = build_tree(&ChunkTable::new(), &settings(bounds, 101)).unwrap_err();
        assert!(matches!(err, VkdtError::InvalidInput(_)));
    }

    #[test]
    fn every_packed_node_children_are_consecutive() {
        let mut table = ChunkTable::new();
        let mut chunk = Chunk::default();
        for z in 0..8 {
            for y in 0..8 {
                for x in 0..4 {
                    chunk.set_voxel(V3c::new(x, y, z), Voxel::Stone);
                }
            }
        }
        table.set(V3c::new(0, 0, 0), chunk);
        let bounds = ICuboid::new(V3c::new(0, 0, 0), V3c::new(8, 8, 8));
        let tree = build_tree(&table, &settings(bounds, 5)).unwrap();

        for (index, node) in tree.geometry.iter().enumerate() {
            if let NodeContent::Internal { .. } = node.content() {
                let left = tree.left_child_index(index);
                let right = tree.right_child_index(index);
                assert_eq!(right, left + 1);
            }
        }
    }
}
