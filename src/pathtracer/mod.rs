//! The CPU path tracer (§4.9): camera ray generation and tile geometry,
//! per-tile scratch buffers, path transport, shading, and the tile-scheduled
//! render loop that ties them to the `WorkGroup` thread pool.

pub mod buffer;
pub mod camera;
pub mod render;
pub mod settings;
pub mod shading;
pub mod transport;

pub use buffer::{PathBuffer, PathResult, PathVertex};
pub use camera::{Camera, CameraRayGenerator, ImageConfig, ImageTile, TileLayout};
pub use render::render_frame;
pub use settings::{NeverAbort, RenderControl, TracerSettings};
pub use shading::determine_colors;
pub use transport::{trace_paths, Scene};
