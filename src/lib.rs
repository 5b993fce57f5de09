//! A CPU-side voxel acceleration structure, grid raycaster, and tile-scheduled
//! path tracer: a Voxel KD-Tree (VKDT) over a sparse table of 32^3 chunks,
//! a 3D-DDA grid walker, and a multithreaded tracer built on top of both.

pub mod chunk;
pub mod collider;
pub mod dda;
pub mod error;
pub mod geom;
pub mod image;
pub mod pathtracer;
pub mod vkdt;
pub mod voxel;
pub mod workgroup;

pub use error::VkdtError;
pub use geom::vector::V3c;
pub use voxel::Voxel;
