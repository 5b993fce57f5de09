//! `ChunkTable`: a coordinate-keyed map of chunks plus a cached chunk-space
//! bounding cuboid, with a coarse mutex for concurrent background meshing.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::chunk::Chunk;
use crate::geom::ICuboid;
use crate::V3c;

pub struct ChunkTable {
    chunks: HashMap<(i32, i32, i32), Chunk>,
    bounds: ICuboid,
    /// `bounds` is only meaningful once a first chunk has been inserted;
    /// until then there is no coordinate to seed it from.
    bounds_initialized: bool,
    /// Guards writers and the point-in-time snapshots background mesh jobs
    /// take; readers that only need `get`/`is_loaded` do not need to hold it.
    pub access_mutex: Mutex<()>,
}

impl Default for ChunkTable {
    fn default() -> Self {
        Self {
            chunks: HashMap::new(),
            bounds: ICuboid::default(),
            bounds_initialized: false,
            access_mutex: Mutex::new(()),
        }
    }
}

fn key(coord: V3c<i32>) -> (i32, i32, i32) {
    (coord.x, coord.y, coord.z)
}

/// Widens `bounds` so it contains `coord`, matching the source's
/// `expandIfNecessary`.
fn expand_if_necessary(bounds: ICuboid, coord: V3c<i32>) -> ICuboid {
    let max = bounds.max();
    let mut min = bounds.origin;
    let mut hi = max;
    for axis in 0..3 {
        let c = coord.component(axis);
        min.set_component(axis, min.component(axis).min(c));
        hi.set_component(axis, hi.component(axis).max(c + 1));
    }
    ICuboid::new(min, hi - min)
}

/// Folds `coords` into a bounding cuboid, seeding from the first coordinate's
/// unit cuboid rather than `ICuboid::default()` so an all-negative or
/// non-origin-adjacent key set doesn't get dragged towards world origin.
/// Returns `None` for an empty iterator (no chunks left to bound).
fn bounds_from_coords(mut coords: impl Iterator<Item = V3c<i32>>) -> Option<ICuboid> {
    let first = coords.next()?;
    let seed = ICuboid::new(first, V3c::new(1, 1, 1));
    Some(coords.fold(seed, expand_if_necessary))
}

/// True if `coord` is strictly inside `volume`, i.e. erasing it cannot touch
/// the cached boundary.
fn is_fully_contained(volume: ICuboid, coord: V3c<i32>) -> bool {
    (0..3).all(|axis| {
        let max = volume.origin.component(axis) + volume.extent.component(axis);
        coord.component(axis) > volume.origin.component(axis) && coord.component(axis) < max - 1
    })
}

impl ChunkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, coord: V3c<i32>) -> bool {
        self.chunks.contains_key(&key(coord))
    }

    pub fn get(&self, coord: V3c<i32>) -> Option<&Chunk> {
        self.chunks.get(&key(coord))
    }

    pub fn set(&mut self, coord: V3c<i32>, chunk: Chunk) {
        self.chunks.insert(key(coord), chunk);
        self.bounds = if self.bounds_initialized {
            expand_if_necessary(self.bounds, coord)
        } else {
            self.bounds_initialized = true;
            ICuboid::new(coord, V3c::new(1, 1, 1))
        };
    }

    /// Erases every coordinate in `coords`. If any of them sat on the cached
    /// boundary, rebuilds the boundary from the remaining keys; interior
    /// erases leave the cached bounds untouched.
    pub fn erase(&mut self, coords: &[V3c<i32>]) {
        let mut resize_avoidable = true;
        for &coord in coords {
            resize_avoidable &= self.bounds_initialized && is_fully_contained(self.bounds, coord);
            self.chunks.remove(&key(coord));
        }
        if !resize_avoidable {
            match bounds_from_coords(self.all_loaded_chunks().into_iter()) {
                Some(bounds) => {
                    self.bounds = bounds;
                    self.bounds_initialized = true;
                }
                None => {
                    self.bounds = ICuboid::default();
                    self.bounds_initialized = false;
                }
            }
        }
    }

    pub fn all_loaded_chunks(&self) -> Vec<V3c<i32>> {
        self.chunks.keys().map(|&(x, y, z)| V3c::new(x, y, z)).collect()
    }

    /// Bounding cuboid in chunk-space coordinates; multiply by 32 for the
    /// voxel-space bounding cuboid.
    pub fn bounds(&self) -> ICuboid {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_erase_leaves_bounds_untouched() {
        let mut table = ChunkTable::new();
        for x in -1..=1 {
            for y in -1..=1 {
                for z in -1..=1 {
                    table.set(V3c::new(x, y, z), Chunk::default());
                }
            }
        }
        let bounds_before = table.bounds();
        table.erase(&[V3c::new(0, 0, 0)]);
        assert_eq!(table.bounds(), bounds_before);
        assert!(!table.is_loaded(V3c::new(0, 0, 0)));
    }

    #[test]
    fn boundary_erase_triggers_rescan() {
        let mut table = ChunkTable::new();
        table.set(V3c::new(0, 0, 0), Chunk::default());
        table.set(V3c::new(1, 0, 0), Chunk::default());
        assert_eq!(table.bounds().extent, V3c::new(2, 1, 1));
        table.erase(&[V3c::new(1, 0, 0)]);
        assert_eq!(table.bounds().extent, V3c::new(1, 1, 1));
    }

    #[test]
    fn unloaded_get_is_none_not_a_panic() {
        let table = ChunkTable::new();
        assert!(table.get(V3c::new(5, 5, 5)).is_none());
    }

    #[test]
    fn first_insert_seeds_bounds_from_its_own_coord_not_world_origin() {
        let mut table = ChunkTable::new();
        table.set(V3c::new(5, 5, 5), Chunk::default());
        assert_eq!(table.bounds().origin, V3c::new(5, 5, 5));
        assert_eq!(table.bounds().extent, V3c::new(1, 1, 1));
    }

    #[test]
    fn erasing_the_last_chunk_resets_to_an_empty_table() {
        let mut table = ChunkTable::new();
        table.set(V3c::new(0, 0, 0), Chunk::default());
        table.erase(&[V3c::new(0, 0, 0)]);
        assert_eq!(table.bounds(), ICuboid::default());
        table.set(V3c::new(9, 9, 9), Chunk::default());
        assert_eq!(table.bounds().origin, V3c::new(9, 9, 9));
        assert_eq!(table.bounds().extent, V3c::new(1, 1, 1));
    }
}
