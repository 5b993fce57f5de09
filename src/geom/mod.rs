//! Shared geometry and ray math: vectors, cuboids, rays and the tagged
//! intersection result every intersector in the crate returns.

pub mod cuboid;
pub mod ray;
pub mod vector;

pub use cuboid::{FCuboid, ICuboid};
pub use ray::{Ray, RayIntersection, RayIntersectionKind};
pub use vector::V3c;
