//! Three-component vectors of lanes.

use crate::{DIM, Lane, Vec3};
use std::ops::{Add, AddAssign, Sub};

/// `x`, `y`, `z` components each holding one value per lane slot.
#[derive(Clone, Copy, Debug)]
pub struct LaneVec3<L> {
    pub x: L,
    pub y: L,
    pub z: L,
}

impl<L: Lane> LaneVec3<L> {
    #[inline]
    pub fn zero() -> Self {
        Self {
            x: L::zero(),
            y: L::zero(),
            z: L::zero(),
        }
    }

    /// Same vector in every slot.
    #[inline]
    pub fn splat(v: &Vec3) -> Self {
        Self {
            x: L::splat(v.x),
            y: L::splat(v.y),
            z: L::splat(v.z),
        }
    }

    /// Slot `k` reads particle `index(k)` from a flat xyz array.
    #[inline]
    pub fn gather<F: Fn(usize) -> usize>(xyz: &[f64], index: F) -> Self {
        Self {
            x: L::gather(|k| xyz[DIM * index(k)]),
            y: L::gather(|k| xyz[DIM * index(k) + 1]),
            z: L::gather(|k| xyz[DIM * index(k) + 2]),
        }
    }

    #[inline]
    pub fn norm_squared(&self) -> L {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Multiply every component by a per-slot scalar.
    #[inline]
    pub fn scale(&self, s: L) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Vector stored in slot `k`.
    #[inline]
    pub fn extract(&self, k: usize) -> Vec3 {
        Vec3::new(self.x.extract(k), self.y.extract(k), self.z.extract(k))
    }

    /// Sum over slots, folded in slot order.
    #[inline]
    pub fn reduce_add(&self) -> Vec3 {
        Vec3::new(self.x.reduce_add(), self.y.reduce_add(), self.z.reduce_add())
    }
}

impl<L: Lane> Add for LaneVec3<L> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl<L: Lane> Sub for LaneVec3<L> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl<L: Lane> AddAssign for LaneVec3<L> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}
