//! Leaf classification (§4.5): decide what a candidate child produced by a
//! split becomes, given the parent `AxisSummary` partitioned at the chosen
//! offset.

use crate::vkdt::axis_summary::AxisSummary;
use crate::vkdt::node::NodeContent;
use crate::voxel::Voxel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassifiedChild {
    Leaf(NodeContent),
    Internal,
}

/// Classifies the slab of `summary` covering slice indices `range` (relative
/// to the summary's own start), given the child's total voxel volume and
/// the build's `mandatory_leaf_volume`/depth-based forced-leaf rules.
pub fn classify_child(
    summary: &AxisSummary,
    range: std::ops::Range<usize>,
    volume: i64,
    mandatory_leaf_volume: i64,
    at_max_depth: bool,
) -> ClassifiedChild {
    let solid_count: i64 = summary.solids_per_plane[range.clone()].iter().sum();

    if solid_count == 0 {
        return ClassifiedChild::Leaf(NodeContent::EmptyLeaf);
    }

    if solid_count == volume {
        let slices = &summary.homogeneous_material_per_plane[range];
        let first = slices[0];
        let all_same_material = first != Voxel::Empty && slices.iter().all(|&m| m == first);
        return if all_same_material {
            ClassifiedChild::Leaf(NodeContent::HomogeneousLeaf {
                palette: first.palette_index(),
            })
        } else {
            ClassifiedChild::Leaf(NodeContent::SolidMixedTypesLeaf)
        };
    }

    if volume <= mandatory_leaf_volume || at_max_depth {
        let percent_solid = ((solid_count as f64 / volume as f64) * 100.0).floor() as u8;
        return ClassifiedChild::Leaf(NodeContent::MixedLeaf {
            percent_solid: percent_solid.max(1),
        });
    }

    ClassifiedChild::Internal
}
