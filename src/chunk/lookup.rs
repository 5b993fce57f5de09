//! `VoxelLookup`: a bounded 16-entry locality cache consulted during VKDT
//! construction. Explicitly single-threaded -- the builder never holds the
//! `ChunkTable`'s mutex while scanning through this cache.

use crate::chunk::{Chunk, ChunkTable};
use crate::voxel::{chunk_coord_from_voxel, local_voxel_from_global, Voxel};
use crate::V3c;

const CAPACITY: usize = 16;

struct Entry {
    coord: V3c<i32>,
    chunk: Chunk,
    miss_count: u32,
}

pub struct VoxelLookup {
    entries: Vec<Entry>,
}

impl Default for VoxelLookup {
    fn default() -> Self {
        Self {
            entries: Vec::with_capacity(CAPACITY),
        }
    }
}

impl VoxelLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the voxel at `global`, loading and caching its chunk through
    /// `table` on a miss. Absent (unloaded) chunks read as `Voxel::Empty`,
    /// matching "no overwrite" / air semantics for builder purposes.
    pub fn voxel_at(&mut self, table: &ChunkTable, global: V3c<i32>) -> Voxel {
        let chunk_coord = chunk_coord_from_voxel(global);
        let local = local_voxel_from_global(global);

        if let Some(hit_index) = self.entries.iter().position(|e| e.coord == chunk_coord) {
            return self.entries[hit_index].chunk.voxel_at(local);
        }

        let loaded = table.get(chunk_coord).cloned().unwrap_or_default();
        let voxel = loaded.voxel_at(local);

        // Trivial locality heuristic: the most recently loaded entry moves
        // to slot 0, since it is the one most likely to be reused next.
        if self.entries.len() < CAPACITY {
            self.entries.push(Entry {
                coord: chunk_coord,
                chunk: loaded,
                miss_count: 0,
            });
            let new_index = self.entries.len() - 1;
            self.entries.swap(0, new_index);
        } else {
            let evict = self.evict_index();
            self.entries[evict] = Entry {
                coord: chunk_coord,
                chunk: loaded,
                miss_count: 0,
            };
            self.entries.swap(0, evict);
        }

        voxel
    }

    /// Evicts the slot with the largest miss-counter; every non-chosen slot
    /// is incremented exactly once per miss, regardless of how many entries
    /// were scanned to find the match.
    fn evict_index(&mut self) -> usize {
        let evict = self
            .entries
            .iter()
            .enumerate()
            .max_by_key(|(_, e)| e.miss_count)
            .map(|(i, _)| i)
            .expect("cache is at capacity, so it is non-empty");

        for (i, entry) in self.entries.iter_mut().enumerate() {
            if i != evict {
                entry.miss_count += 1;
            }
        }
        evict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_after_first_load_does_not_requery_table() {
        let mut table = ChunkTable::new();
        table.set(V3c::new(0, 0, 0), Chunk::filled(Voxel::Stone));
        let mut lookup = VoxelLookup::new();
        assert_eq!(lookup.voxel_at(&table, V3c::new(1, 1, 1)), Voxel::Stone);
        assert_eq!(lookup.voxel_at(&table, V3c::new(2, 2, 2)), Voxel::Stone);
        assert_eq!(lookup.entries.len(), 1);
    }

    #[test]
    fn eviction_keeps_cache_at_capacity() {
        let mut table = ChunkTable::new();
        for i in 0..(CAPACITY as i32 + 4) {
            table.set(V3c::new(i, 0, 0), Chunk::filled(Voxel::Stone));
        }
        let mut lookup = VoxelLookup::new();
        for i in 0..(CAPACITY as i32 + 4) {
            lookup.voxel_at(&table, V3c::new(i * 32, 0, 0));
        }
        assert_eq!(lookup.entries.len(), CAPACITY);
    }

    #[test]
    fn unloaded_chunk_reads_as_empty() {
        let table = ChunkTable::new();
        let mut lookup = VoxelLookup::new();
        assert_eq!(lookup.voxel_at(&table, V3c::new(0, 0, 0)), Voxel::Empty);
    }

    #[test]
    fn eviction_moves_the_freshly_loaded_entry_into_slot_zero() {
        let mut table = ChunkTable::new();
        for i in 0..(CAPACITY as i32 + 1) {
            table.set(V3c::new(i, 0, 0), Chunk::filled(Voxel::Stone));
        }
        let mut lookup = VoxelLookup::new();
        for i in 0..(CAPACITY as i32) {
            lookup.voxel_at(&table, V3c::new(i * 32, 0, 0));
        }
        // One more load forces an eviction; slot 0 must hold the coord that
        // was just loaded, not whatever ended up at the old last index.
        let last_coord = V3c::new(CAPACITY as i32 * 32, 0, 0);
        lookup.voxel_at(&table, last_coord);
        assert_eq!(lookup.entries[0].coord, chunk_coord_from_voxel(last_coord));
    }
}
