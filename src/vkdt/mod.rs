//! The Voxel KD-Tree acceleration structure: packed node encoding, the
//! iterative builder, stack-based traversal and the on-disk format.

pub mod axis_summary;
pub mod builder;
pub mod classify;
pub mod io;
pub mod node;
pub mod split;
pub mod traversal;
pub mod tree;

pub use builder::build_tree;
pub use io::{read_tree, read_unpacked_tree, write_tree};
pub use node::{Axis, NodeContent, PackedNode};
pub use traversal::{traverse, TraversalStack};
pub use tree::{BuildSettings, OptimizationLevel, PropertyNode, TreeData};
