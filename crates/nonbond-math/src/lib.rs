//! Math primitives for the nonbond kernels.
//!
//! Provides the 3-vector alias used at API boundaries, helpers for the flat
//! `[x0, y0, z0, x1, ...]` coordinate layout the kernels consume, and the
//! fixed-width [`Lane`] abstraction the pair loops are written against.

pub mod lane;
pub mod lane_vec;

pub use lane::{DefaultLane, Lane, MAX_LANES};
pub use lane_vec::LaneVec3;

use nalgebra as na;

/// 3D vector alias.
pub type Vec3 = na::Vector3<f64>;

/// Spatial dimension of the flat coordinate layout.
pub const DIM: usize = 3;

/// Read particle `index` from a flat xyz array.
#[inline]
pub fn load_vec3(xyz: &[f64], index: usize) -> Vec3 {
    let o = DIM * index;
    Vec3::new(xyz[o], xyz[o + 1], xyz[o + 2])
}

/// Add `v` to particle `index` of a flat xyz array.
#[inline]
pub fn add_vec3(xyz: &mut [f64], index: usize, v: &Vec3) {
    let o = DIM * index;
    xyz[o] += v.x;
    xyz[o + 1] += v.y;
    xyz[o + 2] += v.z;
}

/// Flatten a slice of vectors into the xyz layout.
pub fn flatten(points: &[Vec3]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
}
