//! Camera ray generation and tile scheduling geometry (§4.9, §11), grounded
//! on `RayTracing.cpp`'s `Rendering::CameraRayGenerator`/`Rendering::tiles`.

use rand::Rng;

use crate::geom::vector::V3cf32;
use crate::geom::Ray;

/// Half-width of the per-sample jitter box added to a pixel's ray direction
/// before renormalizing, in the same units as the (already roughly
/// pixel-sized) basis vectors.
const JITTER_HALF_WIDTH: f32 = 0.5;

/// A static camera: position, forward/up basis vectors and field of view in
/// degrees. Not valid across camera movement -- `CameraRayGenerator`
/// precomputes everything from a snapshot of this.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: V3cf32,
    pub forward: V3cf32,
    pub up: V3cf32,
    pub fov_degrees: f32,
}

/// Image pixel dimensions and the tile size jobs are partitioned into.
#[derive(Debug, Clone, Copy)]
pub struct ImageConfig {
    pub width: i32,
    pub height: i32,
    pub tile_width: i32,
    pub tile_height: i32,
}

/// A rectangular sub-region of the image, one tile-scheduler job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTile {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ImageTile {
    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }
}

/// Computes the list of image tiles, including a possibly-undersized last
/// row/column, the way `Rendering::tiles` does.
pub struct TileLayout;

impl TileLayout {
    pub fn tiles(config: &ImageConfig) -> Vec<ImageTile> {
        assert!(config.width > 0 && config.height > 0);
        assert!(config.tile_width > 0 && config.tile_height > 0);

        let num_tiles_x = div_ceil(config.width, config.tile_width);
        let num_tiles_y = div_ceil(config.height, config.tile_height);
        let uneven_width = config.width - config.tile_width * (num_tiles_x - 1);
        let uneven_height = config.height - config.tile_height * (num_tiles_y - 1);

        let mut tiles = Vec::with_capacity((num_tiles_x * num_tiles_y) as usize);
        for tx in 0..num_tiles_x {
            let is_end_x = tx == num_tiles_x - 1;
            let width = if is_end_x { uneven_width } else { config.tile_width };
            for ty in 0..num_tiles_y {
                let is_end_y = ty == num_tiles_y - 1;
                let height = if is_end_y { uneven_height } else { config.tile_height };
                tiles.push(ImageTile {
                    x: tx * config.tile_width,
                    y: ty * config.tile_height,
                    width,
                    height,
                });
            }
        }
        tiles
    }
}

fn div_ceil(a: i32, b: i32) -> i32 {
    (a + b - 1) / b
}

/// Precomputes the orthonormal image basis and the `w_prime` term so
/// per-pixel ray generation is a handful of multiply-adds.
pub struct CameraRayGenerator {
    basis_x: V3cf32,
    basis_y: V3cf32,
    camera_pos: V3cf32,
    w_prime: V3cf32,
}

impl CameraRayGenerator {
    /// `image_dims` is `(width, height)` in pixels; the image plane's +X is
    /// right and +Y is down, matching the original's pixel-coordinate
    /// convention.
    pub fn new(camera: &Camera, image_dims: (i32, i32)) -> Self {
        let image_plane_normal = camera.forward.normalized();
        let image_x = image_plane_normal.cross(camera.up).normalized();
        let image_y = image_x.cross(image_plane_normal).normalized();
        let image_z = image_y.cross(image_x).normalized();

        let half_width = image_dims.0 as f32 * 0.5;
        let half_height = image_dims.1 as f32 * 0.5;
        let half_fov_tan = (camera.fov_degrees.to_radians() * 0.5).tan();

        let w_prime = image_x * -half_width - image_y * -half_height + image_z * (half_height / half_fov_tan);

        Self {
            basis_x: image_x,
            basis_y: image_y,
            camera_pos: camera.position,
            w_prime,
        }
    }

    /// The unjittered ray through pixel `(x, y)`'s center.
    pub fn ray_from_pixel(&self, x: i32, y: i32) -> Ray {
        let direction = self.basis_x * (x as f32) - self.basis_y * (y as f32) + self.w_prime;
        Ray::new(self.camera_pos, direction.normalized())
    }

    /// A ray through pixel `(x, y)` with a bounded uniform jitter added to
    /// its direction before renormalizing, for antialiased per-sample rays.
    pub fn ray_from_pixel_jittered(&self, x: i32, y: i32, rng: &mut impl Rng) -> Ray {
        let direction = self.basis_x * (x as f32) - self.basis_y * (y as f32) + self.w_prime;
        let jitter = self.basis_x * rng.gen_range(-JITTER_HALF_WIDTH..=JITTER_HALF_WIDTH)
            - self.basis_y * rng.gen_range(-JITTER_HALF_WIDTH..=JITTER_HALF_WIDTH);
        Ray::new(self.camera_pos, (direction + jitter).normalized())
    }
}
