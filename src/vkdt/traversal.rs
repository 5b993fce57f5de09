//! Stack-based VKDT traversal (§4.7): slab-method world bounds test, then a
//! tree-local walk with a single push per "both children hit" internal node.

use crate::error::{Result, VkdtError};
use crate::geom::cuboid::{face_index, intersect_cuboid, FCuboid};
use crate::geom::{Ray, RayIntersection, RayIntersectionKind};
use crate::vkdt::node::{Axis, NodeContent};
use crate::vkdt::tree::TreeData;
use crate::V3c;

#[derive(Debug, Clone, Copy)]
struct StackFrame {
    node: usize,
    t_min: f32,
    t_max: f32,
    axis: usize,
}

/// A caller-owned traversal stack, reused across calls by one thread/worker.
/// Sized at `2 * max_depth` because both children can be pending at once at
/// every level in the worst case.
pub struct TraversalStack {
    frames: Vec<StackFrame>,
    capacity: usize,
}

impl TraversalStack {
    pub fn with_capacity_for_depth(max_depth: u8) -> Self {
        let capacity = 2 * max_depth as usize;
        Self {
            frames: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn clear(&mut self) {
        self.frames.clear();
    }
}

/// Traverses `tree` with `ray`, using `stack` as scratch space. `stack` must
/// have been sized for at least `tree`'s depth or `InvalidInput` is raised.
pub fn traverse(tree: &TreeData, ray: &Ray, stack: &mut TraversalStack) -> Result<RayIntersection> {
    if !ray.is_valid() {
        return Err(VkdtError::InvalidInput("ray direction must be unit length".into()));
    }
    if stack.capacity < 2 * tree.max_depth_reached.max(1) as usize {
        return Err(VkdtError::InvalidInput(
            "traversal stack too small for this tree's depth".into(),
        ));
    }

    let world_bounds = FCuboid {
        origin: tree.bounds.origin.into(),
        extent: tree.bounds.extent.into(),
    };
    let inv_dir = ray.direction.recip();

    let Some(world_hit) = intersect_cuboid(&world_bounds, ray, &inv_dir) else {
        return Ok(RayIntersection::MISS);
    };
    if world_hit.t_max < 0.0 {
        return Ok(RayIntersection::MISS);
    }

    // Translate into tree-local coordinates: the tree's own origin becomes
    // the new zero, so node offsets (already tree-local) compare directly.
    let local_ray = Ray::new(ray.origin - tree.bounds.origin.into(), ray.direction);

    stack.clear();
    let mut t_min = world_hit.t_min.max(0.0);
    let mut t_max = world_hit.t_max;
    let mut current = 0usize;
    let mut last_min_axis = world_hit.last_min_axis;
    let mut backtracking = false;

    loop {
        if backtracking {
            match stack.frames.pop() {
                Some(frame) => {
                    current = frame.node;
                    t_min = frame.t_min;
                    t_max = frame.t_max;
                    last_min_axis = frame.axis;
                    backtracking = false;
                }
                None => return Ok(RayIntersection::MISS),
            }
        }

        let node = tree.geometry[current];
        match node.content() {
            NodeContent::EmptyLeaf => {
                backtracking = true;
                continue;
            }
            NodeContent::HomogeneousLeaf { palette } => {
                return Ok(leaf_hit(
                    RayIntersectionKind::HitChunkVoxel,
                    &local_ray,
                    t_min,
                    last_min_axis,
                    palette as i16,
                ));
            }
            NodeContent::SolidMixedTypesLeaf => {
                return Ok(leaf_hit(
                    RayIntersectionKind::HitChunkVoxelUnknownType,
                    &local_ray,
                    t_min,
                    last_min_axis,
                    -1,
                ));
            }
            NodeContent::MixedLeaf { .. } => {
                return Ok(leaf_hit(
                    RayIntersectionKind::PossibleChunkVoxel,
                    &local_ray,
                    t_min,
                    last_min_axis,
                    -1,
                ));
            }
            NodeContent::Internal { axis, offset } => {
                let axis_index = axis.index();
                let t_plane = (offset as f32 - local_ray.origin.component(axis_index))
                    * inv_dir.component(axis_index);
                let should_flip = local_ray.direction.component(axis_index) < 0.0;

                let (near, far) = if should_flip {
                    (tree.right_child_index(current), tree.left_child_index(current))
                } else {
                    (tree.left_child_index(current), tree.right_child_index(current))
                };

                if t_plane <= t_min {
                    current = far;
                    last_min_axis = axis_index;
                } else if t_plane >= t_max {
                    current = near;
                } else {
                    if stack.frames.len() >= stack.capacity {
                        return Err(VkdtError::InvalidInput(
                            "traversal stack exhausted: tree deeper than provisioned".into(),
                        ));
                    }
                    stack.frames.push(StackFrame {
                        node: far,
                        t_min: t_plane,
                        t_max,
                        axis: axis_index,
                    });
                    current = near;
                    t_max = t_plane;
                }

                if t_max <= t_min {
                    backtracking = true;
                }
                let _ = Axis::from_index(axis_index);
            }
        }
    }
}

fn leaf_hit(kind: RayIntersectionKind, local_ray: &Ray, t: f32, last_min_axis: usize, palette: i16) -> RayIntersection {
    let hit_position = local_ray.point_at(t);
    let voxel = hit_position.floor();
    let face = face_index(last_min_axis, &local_ray.direction);
    RayIntersection {
        kind,
        t,
        voxel,
        face,
        palette,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Chunk, ChunkTable};
    use crate::geom::ICuboid;
    use crate::vkdt::builder::build_tree;
    use crate::vkdt::tree::BuildSettings;
    use crate::voxel::Voxel;

    fn build_single_voxel_chunk() -> TreeData {
        let mut table = ChunkTable::new();
        let mut chunk = Chunk::default();
        chunk.set_voxel(V3c::new(0, 0, 0), Voxel::Stone);
        table.set(V3c::new(0, 0, 0), chunk);
        let settings = BuildSettings {
            bounds: ICuboid::new(V3c::new(0, 0, 0), V3c::new(32, 32, 32)),
            max_depth: 6,
            mandatory_leaf_volume: 1,
            ..Default::default()
        };
        build_tree(&table, &settings).unwrap()
    }

    #[test]
    fn scenario_a_single_voxel_chunk_hit() {
        let tree = build_single_voxel_chunk();
        let ray = Ray::new(V3c::new(-1.0, 0.5, 0.5), V3c::new(1.0, 0.0, 0.0));
        let mut stack = TraversalStack::with_capacity_for_depth(tree.max_depth_reached.max(6));
        let hit = traverse(&tree, &ray, &mut stack).unwrap();
        assert_eq!(hit.kind, RayIntersectionKind::HitChunkVoxel);
        assert!((hit.t - 1.0).abs() < 1e-4);
        assert_eq!(hit.face, 1);
        assert_eq!(hit.palette, Voxel::Stone.palette_index() as i16);
    }

    #[test]
    fn scenario_b_homogeneous_chunk_hit() {
        let mut table = ChunkTable::new();
        table.set(V3c::new(0, 0, 0), Chunk::filled(Voxel::Stone));
        let settings = BuildSettings {
            bounds: ICuboid::new(V3c::new(0, 0, 0), V3c::new(32, 32, 32)),
            max_depth: 4,
            mandatory_leaf_volume: 1,
            ..Default::default()
        };
        let tree = build_tree(&table, &settings).unwrap();
        let ray = Ray::new(V3c::new(16.0, 16.0, -1.0), V3c::new(0.0, 0.0, 1.0));
        let mut stack = TraversalStack::with_capacity_for_depth(4);
        let hit = traverse(&tree, &ray, &mut stack).unwrap();
        assert_eq!(hit.kind, RayIntersectionKind::HitChunkVoxel);
        assert!((hit.t - 1.0).abs() < 1e-4);
        assert_eq!(hit.face, 5);
    }

    #[test]
    fn ray_missing_the_world_bounds_is_a_miss() {
        let tree = build_single_voxel_chunk();
        let ray = Ray::new(V3c::new(-1.0, 100.0, 100.0), V3c::new(1.0, 0.0, 0.0));
        let mut stack = TraversalStack::with_capacity_for_depth(6);
        let hit = traverse(&tree, &ray, &mut stack).unwrap();
        assert_eq!(hit.kind, RayIntersectionKind::Miss);
    }
}
