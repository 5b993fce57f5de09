//! `Ray` and the tagged `RayIntersection` result shared by every intersector
//! in the crate: VKDT traversal, chunk DDA, triangle and collider tests.

use crate::geom::vector::{V3c, V3cf32, V3ci32};

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: V3cf32,
    pub direction: V3cf32,
}

impl Ray {
    pub fn new(origin: V3cf32, direction: V3cf32) -> Self {
        Self { origin, direction }
    }

    /// The traversal and chunk walker both assume this holds; callers build
    /// rays with normalized directions, this only checks the assumption.
    pub fn is_valid(&self) -> bool {
        (1.0 - self.direction.length()).abs() < 1e-4
    }

    pub fn point_at(&self, t: f32) -> V3cf32 {
        self.origin + self.direction * t
    }
}

/// What a hit's voxel/material payload looks like; `-1` means "unknown".
pub type PaletteIndex = i16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayIntersectionKind {
    Miss,
    HitChunkVoxel,
    HitTriangle,
    HitCollider,
    InternalChunk,
    InternalCollider,
    /// Traversal found the "solid, mixed materials" distinguished leaf.
    HitChunkVoxelUnknownType,
    /// Traversal found a mixed solid/air leaf; a DDA follow-up is required.
    PossibleChunkVoxel,
}

impl RayIntersectionKind {
    /// Whether this result needs a chunk-DDA follow-up pass before it can be
    /// trusted for shading (see VKDT Traversal's follow-up policy).
    pub fn requires_lookup(self) -> bool {
        matches!(
            self,
            RayIntersectionKind::PossibleChunkVoxel | RayIntersectionKind::HitChunkVoxelUnknownType
        )
    }

    pub fn is_valid(self) -> bool {
        !matches!(self, RayIntersectionKind::Miss)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RayIntersection {
    pub kind: RayIntersectionKind,
    pub t: f32,
    pub voxel: V3ci32,
    pub face: usize,
    /// `-1` when the palette index is not (yet) known, e.g. for an
    /// unresolved-type or possible-chunk-voxel result.
    pub palette: PaletteIndex,
}

impl RayIntersection {
    pub const MISS: RayIntersection = RayIntersection {
        kind: RayIntersectionKind::Miss,
        t: f32::INFINITY,
        voxel: V3c { x: 0, y: 0, z: 0 },
        face: 0,
        palette: -1,
    };

    pub fn is_light_terminated(&self, emissive: impl Fn(PaletteIndex) -> bool) -> bool {
        match self.kind {
            RayIntersectionKind::Miss => true,
            RayIntersectionKind::HitChunkVoxelUnknownType => true,
            RayIntersectionKind::HitChunkVoxel => emissive(self.palette),
            _ => false,
        }
    }
}
