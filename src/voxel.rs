//! The voxel kind enumeration and its material palette.

use crate::geom::vector::V3c;

pub const CHUNK_LEN: i32 = 32;
pub const CHUNK_VOLUME: usize = (CHUNK_LEN * CHUNK_LEN * CHUNK_LEN) as usize;

/// One byte per voxel. `Empty` means "no overwrite" during generation, not
/// "air" for rendering purposes -- both `Empty` and `Air` are non-solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Voxel {
    #[default]
    Empty = 0,
    Air = 2,
    Grass = 3,
    Dirt = 4,
    Stone = 5,
    Concrete = 6,
    Metal = 7,
    LightEmitter = 128,
}

impl Voxel {
    pub fn is_air(self) -> bool {
        matches!(self, Voxel::Empty | Voxel::Air)
    }

    pub fn is_solid(self) -> bool {
        !self.is_air()
    }

    pub fn is_emissive(self) -> bool {
        matches!(self, Voxel::LightEmitter)
    }

    pub fn palette_index(self) -> u8 {
        self as u8
    }

    pub fn from_palette_index(index: u8) -> Self {
        match index {
            0 => Voxel::Empty,
            2 => Voxel::Air,
            3 => Voxel::Grass,
            4 => Voxel::Dirt,
            5 => Voxel::Stone,
            6 => Voxel::Concrete,
            7 => Voxel::Metal,
            128 => Voxel::LightEmitter,
            _ => Voxel::Empty,
        }
    }

    /// The color this material multiplies incoming light by during shading.
    pub fn color(self) -> V3c<f32> {
        match self {
            Voxel::Empty | Voxel::Air => V3c::new(1.0, 1.0, 1.0),
            Voxel::Grass => V3c::new(0.25, 0.7, 0.2),
            Voxel::Dirt => V3c::new(0.45, 0.3, 0.15),
            Voxel::Stone => V3c::new(0.55, 0.55, 0.55),
            Voxel::Concrete => V3c::new(0.75, 0.75, 0.72),
            Voxel::Metal => V3c::new(0.8, 0.8, 0.85),
            Voxel::LightEmitter => LIGHT_EMITTER_COLOR,
        }
    }

    /// Surface roughness used by the path tracer's bounce direction; `0`
    /// means a perfect mirror bounce, `1` a fully diffuse one.
    pub fn roughness(self) -> f32 {
        match self {
            Voxel::Empty | Voxel::Air => 0.0,
            Voxel::Grass | Voxel::Dirt => 0.8,
            Voxel::Stone => 0.85,
            Voxel::Concrete => 0.95,
            Voxel::Metal => 0.02,
            Voxel::LightEmitter => 0.0,
        }
    }
}

pub const LIGHT_EMITTER_COLOR: V3c<f32> = V3c {
    x: 0.5,
    y: 1.0,
    z: 0.8,
};

/// World voxel coordinate divided by 32, floor semantics.
pub fn chunk_coord_from_voxel(voxel: V3c<i32>) -> V3c<i32> {
    voxel.div_euclid(CHUNK_LEN)
}

/// The voxel's position within its owning chunk, 0..32 per axis.
pub fn local_voxel_from_global(voxel: V3c<i32>) -> V3c<i32> {
    voxel.rem_euclid(CHUNK_LEN)
}

/// z-major, y-middle, x-minor flattening of a local (0..32)^3 coordinate.
pub fn linear_chunk_index(local: V3c<i32>) -> usize {
    debug_assert!((0..CHUNK_LEN).contains(&local.x));
    debug_assert!((0..CHUNK_LEN).contains(&local.y));
    debug_assert!((0..CHUNK_LEN).contains(&local.z));
    (local.z * CHUNK_LEN * CHUNK_LEN + local.y * CHUNK_LEN + local.x) as usize
}
