//! `Chunk`, `ChunkTable` and the `VoxelLookup` locality cache used during
//! VKDT construction.

mod lookup;
mod table;

pub use lookup::VoxelLookup;
pub use table::ChunkTable;

use crate::voxel::{linear_chunk_index, Voxel, CHUNK_VOLUME};
use crate::V3c;

/// A dense 32x32x32 cube of voxels.
#[derive(Clone)]
pub struct Chunk {
    data: Box<[Voxel; CHUNK_VOLUME]>,
}

impl Default for Chunk {
    fn default() -> Self {
        Self {
            data: Box::new([Voxel::Empty; CHUNK_VOLUME]),
        }
    }
}

impl Chunk {
    pub fn filled(voxel: Voxel) -> Self {
        Self {
            data: Box::new([voxel; CHUNK_VOLUME]),
        }
    }

    pub fn voxel_at(&self, local: V3c<i32>) -> Voxel {
        self.data[linear_chunk_index(local)]
    }

    pub fn set_voxel(&mut self, local: V3c<i32>, voxel: Voxel) {
        self.data[linear_chunk_index(local)] = voxel;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let mut chunk = Chunk::default();
        chunk.set_voxel(V3c::new(1, 2, 3), Voxel::Stone);
        assert_eq!(chunk.voxel_at(V3c::new(1, 2, 3)), Voxel::Stone);
        assert_eq!(chunk.voxel_at(V3c::new(0, 0, 0)), Voxel::Empty);
    }

    #[test]
    fn filled_chunk_is_homogeneous() {
        let chunk = Chunk::filled(Voxel::Stone);
        assert_eq!(chunk.voxel_at(V3c::new(31, 31, 31)), Voxel::Stone);
    }
}
