//! `TreeData`, `BuildSettings` and the optional `PropertyNode` summary array.

use crate::geom::ICuboid;
use crate::vkdt::node::PackedNode;

/// The enumerated optimization levels from §6; only `Exhaustive` changes
/// builder behavior (it evaluates all three axes per node instead of one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum OptimizationLevel {
    None,
    Low,
    #[default]
    Medium,
    High,
    Exhaustive,
}

impl OptimizationLevel {
    pub fn is_exhaustive(self) -> bool {
        matches!(self, OptimizationLevel::Exhaustive)
    }
}

/// The complete build settings surface (§6). Unknown fields on deserialize
/// are an error, not silently ignored -- this is the whole surface.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(deny_unknown_fields)
)]
pub struct BuildSettings {
    pub optimization_level: OptimizationLevel,
    pub max_depth: u8,
    pub mandatory_leaf_volume: i64,
    pub should_pack_nodes: bool,
    pub should_calculate_non_leaf_properties: bool,
    /// Accepted for interface compatibility but not yet distinct in
    /// behavior from the count-only heuristic -- see `SPEC_FULL.md` §13.
    pub should_differentiate_types: bool,
    pub bounds: ICuboid,
    /// When set, arrays are sized up-front for a full tree at `max_depth`
    /// rather than grown incrementally; this caps `max_depth` at 30.
    pub preallocate: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            optimization_level: OptimizationLevel::default(),
            max_depth: 20,
            mandatory_leaf_volume: 1,
            should_pack_nodes: true,
            should_calculate_non_leaf_properties: false,
            should_differentiate_types: false,
            bounds: ICuboid::default(),
            preallocate: false,
        }
    }
}

/// Per-internal-node subtree density summary enabling early termination
/// before a leaf. Only a density percentage is currently defined; whether
/// it is populated is gated by `should_calculate_non_leaf_properties`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyNode {
    pub density_percent: u8,
}

/// The tree itself: bounding cuboid, node count/capacity, current maximum
/// depth, and up to three parallel arrays. `descendants` is present only
/// when `is_packed`; `properties` only when populated by the build.
#[derive(Debug, Clone)]
pub struct TreeData {
    pub bounds: ICuboid,
    pub geometry: Vec<PackedNode>,
    pub descendants: Option<Vec<i32>>,
    pub properties: Option<Vec<PropertyNode>>,
    pub max_depth_reached: u8,
    pub is_packed: bool,
}

impl TreeData {
    pub fn node_count(&self) -> usize {
        self.geometry.len()
    }

    /// Index of `node`'s left child. In packed mode this comes from the
    /// descendant array; in non-packed mode children live at `2i+1, 2i+2`.
    pub fn left_child_index(&self, node: usize) -> usize {
        if self.is_packed {
            self.descendants.as_ref().expect("packed tree always has a descendant array")[node] as usize
        } else {
            2 * node + 1
        }
    }

    pub fn right_child_index(&self, node: usize) -> usize {
        if self.is_packed {
            self.left_child_index(node) + 1
        } else {
            2 * node + 2
        }
    }
}
