//! `TracerSettings` (§6) and the interactive/control surface (§10.5) that
//! stands in for the original's keyboard-poll callback.

use crate::geom::vector::V3cf32;
use crate::pathtracer::camera::ImageConfig;

/// The complete path-tracer settings surface (§6).
#[derive(Debug, Clone, Copy)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(deny_unknown_fields)
)]
pub struct TracerSettings {
    pub image_config: ImageConfig,
    pub num_render_threads: usize,
    pub num_rays_per_pixel: u32,
    pub max_path_len: u32,
    pub sky_brightness: V3cf32,
    pub sun_brightness: V3cf32,
    /// Must be pre-normalized; the shading step does not renormalize it.
    pub sun_direction: V3cf32,
}

impl Default for TracerSettings {
    fn default() -> Self {
        Self {
            image_config: ImageConfig {
                width: 640,
                height: 480,
                tile_width: 32,
                tile_height: 32,
            },
            num_render_threads: 4,
            num_rays_per_pixel: 16,
            max_path_len: 4,
            sky_brightness: V3cf32::new(0.3, 0.3, 0.3),
            sun_brightness: V3cf32::new(1.0, 1.0, 0.8),
            sun_direction: V3cf32::new(0.0, 0.0, -1.0),
        }
    }
}

/// Stands in for the original's per-frame keyboard poll: the render loop
/// calls `should_abort` once between tile batches, and a `true` result stops
/// launching new tiles and discards pending output (§4.9, §7).
pub trait RenderControl {
    fn should_abort(&self) -> bool;
}

/// A `RenderControl` that never aborts, for headless use (tests, benches,
/// batch rendering with no input device).
pub struct NeverAbort;

impl RenderControl for NeverAbort {
    fn should_abort(&self) -> bool {
        false
    }
}
