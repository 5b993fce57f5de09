//! Generic 3-component vector used for voxel/chunk coordinates, ray origins
//! and directions, and material colors.

use std::ops::{Add, Div, Mul, Sub};

#[derive(Default, Clone, Copy, Debug)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
#[repr(C)]
pub struct V3c<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

pub type V3cf32 = V3c<f32>;
pub type V3ci32 = V3c<i32>;

impl<T: Copy> V3c<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    pub fn unit(scale: T) -> Self {
        Self {
            x: scale,
            y: scale,
            z: scale,
        }
    }

    /// Indexes the vector by axis (0 = x, 1 = y, 2 = z). Panics on out-of-range
    /// axis, which never happens for axes produced by this crate's own code.
    pub fn component(&self, axis: usize) -> T {
        match axis {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => panic!("axis out of range: {axis}"),
        }
    }

    pub fn set_component(&mut self, axis: usize, value: T) {
        match axis {
            0 => self.x = value,
            1 => self.y = value,
            2 => self.z = value,
            _ => panic!("axis out of range: {axis}"),
        }
    }
}

impl<T> V3c<T>
where
    T: Mul<Output = T> + Div<Output = T> + Add<Output = T> + Sub<Output = T> + Copy,
{
    pub fn dot(&self, other: &V3c<T>) -> T {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: V3c<T>) -> V3c<T> {
        V3c {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }
}

impl V3c<f32> {
    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalized(self) -> V3c<f32> {
        self / self.length()
    }

    pub fn floor(&self) -> V3c<i32> {
        V3c::new(self.x.floor() as i32, self.y.floor() as i32, self.z.floor() as i32)
    }

    /// Component-wise reciprocal; a zero component produces a signed infinity,
    /// which the traversal treats as "this ray is parallel to that axis".
    pub fn recip(&self) -> V3c<f32> {
        V3c::new(1.0 / self.x, 1.0 / self.y, 1.0 / self.z)
    }

    pub fn reflect(&self, normal: &V3c<f32>) -> V3c<f32> {
        *self - *normal * (2.0 * self.dot(normal))
    }

    /// Linear interpolation from `self` to `other`; `t = 0` yields `self`,
    /// `t = 1` yields `other`.
    pub fn lerp(&self, other: V3c<f32>, t: f32) -> V3c<f32> {
        *self + (other - *self) * t
    }
}

impl V3c<i32> {
    pub fn div_euclid(&self, divisor: i32) -> V3c<i32> {
        V3c::new(
            self.x.div_euclid(divisor),
            self.y.div_euclid(divisor),
            self.z.div_euclid(divisor),
        )
    }

    pub fn rem_euclid(&self, divisor: i32) -> V3c<i32> {
        V3c::new(
            self.x.rem_euclid(divisor),
            self.y.rem_euclid(divisor),
            self.z.rem_euclid(divisor),
        )
    }
}

impl<T: Add<Output = T>> Add for V3c<T> {
    type Output = V3c<T>;
    fn add(self, other: V3c<T>) -> V3c<T> {
        V3c {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl<T: Sub<Output = T>> Sub for V3c<T> {
    type Output = V3c<T>;
    fn sub(self, other: V3c<T>) -> V3c<T> {
        V3c {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl<T: Mul<Output = T> + Copy> Mul<T> for V3c<T> {
    type Output = V3c<T>;
    fn mul(self, scalar: T) -> V3c<T> {
        V3c {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl<T: Mul<Output = T>> Mul<V3c<T>> for V3c<T> {
    type Output = V3c<T>;
    fn mul(self, other: V3c<T>) -> V3c<T> {
        V3c {
            x: self.x * other.x,
            y: self.y * other.y,
            z: self.z * other.z,
        }
    }
}

impl<T: Div<Output = T> + Copy> Div<T> for V3c<T> {
    type Output = V3c<T>;
    fn div(self, scalar: T) -> V3c<T> {
        V3c {
            x: self.x / scalar,
            y: self.y / scalar,
            z: self.z / scalar,
        }
    }
}

impl<T: PartialEq> PartialEq for V3c<T> {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}
impl<T: Eq> Eq for V3c<T> {}

impl From<V3c<i32>> for V3c<f32> {
    fn from(v: V3c<i32>) -> V3c<f32> {
        V3c::new(v.x as f32, v.y as f32, v.z as f32)
    }
}

impl From<V3c<f32>> for V3c<i32> {
    fn from(v: V3c<f32>) -> V3c<i32> {
        V3c::new(v.x as i32, v.y as i32, v.z as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_and_cross_match_textbook_identities() {
        let x = V3c::new(1.0, 0.0, 0.0);
        let y = V3c::new(0.0, 1.0, 0.0);
        assert_eq!(x.dot(&y), 0.0);
        assert_eq!(x.cross(y), V3c::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn normalized_is_unit_length() {
        let v = V3c::new(3.0, 4.0, 0.0).normalized();
        assert!((v.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn component_indexing_round_trips() {
        let mut v = V3c::new(1, 2, 3);
        assert_eq!(v.component(1), 2);
        v.set_component(2, 9);
        assert_eq!(v.z, 9);
    }
}
