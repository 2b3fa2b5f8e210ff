//! Periodic shift vectors.
//!
//! The kernel adds `shift[s]` to the outer particle's coordinates once per
//! neighbor-list entry, so one entry can interact with partners in a
//! neighboring periodic image without touching the partner coordinates.

use crate::error::{KernelError, Result};
use nonbond_math::Vec3;

/// Number of images in a rectangular shift table (3 per axis).
pub const NUM_SHIFTS: usize = 27;

/// Index of the zero shift in a rectangular table.
pub const CENTRAL_SHIFT: usize = 13;

/// Table index of the image displaced by `(sx, sy, sz)` box lengths, each in `-1..=1`.
pub fn shift_index(sx: i32, sy: i32, sz: i32) -> usize {
    ((sz + 1) * 9 + (sy + 1) * 3 + (sx + 1)) as usize
}

/// Read-only table of 3D shift vectors.
#[derive(Clone, Debug, PartialEq)]
pub struct ShiftVectors {
    vectors: Vec<Vec3>,
    central: usize,
}

impl ShiftVectors {
    /// Non-periodic table: a single zero shift at index 0.
    pub fn none() -> Self {
        Self {
            vectors: vec![Vec3::zeros()],
            central: 0,
        }
    }

    /// The 27 images of a rectangular box.
    pub fn rectangular(box_size: Vec3) -> Result<Self> {
        if box_size.iter().any(|&l| !(l.is_finite() && l > 0.0)) {
            return Err(KernelError::InvalidConstants(format!(
                "box lengths must be positive, got {:?}",
                box_size.as_slice()
            )));
        }
        let mut vectors = vec![Vec3::zeros(); NUM_SHIFTS];
        for sz in -1..=1 {
            for sy in -1..=1 {
                for sx in -1..=1 {
                    vectors[shift_index(sx, sy, sz)] = Vec3::new(
                        sx as f64 * box_size.x,
                        sy as f64 * box_size.y,
                        sz as f64 * box_size.z,
                    );
                }
            }
        }
        Ok(Self {
            vectors,
            central: CENTRAL_SHIFT,
        })
    }

    /// Arbitrary table; `central` must index a zero vector.
    pub fn from_vectors(vectors: Vec<Vec3>, central: usize) -> Result<Self> {
        match vectors.get(central) {
            Some(v) if *v == Vec3::zeros() => Ok(Self { vectors, central }),
            _ => Err(KernelError::InvalidConstants(format!(
                "central shift {central} is missing or non-zero"
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Index of the zero shift.
    pub fn central(&self) -> usize {
        self.central
    }

    #[inline]
    pub fn get(&self, s: usize) -> Vec3 {
        self.vectors[s]
    }

    pub fn as_slice(&self) -> &[Vec3] {
        &self.vectors
    }

    /// Shift index minimizing `|x_i + shift - x_j|`.
    pub fn nearest_image(&self, x_i: &Vec3, x_j: &Vec3) -> usize {
        let mut best = self.central;
        let mut best_rsq = (x_i - x_j).norm_squared();
        for (s, v) in self.vectors.iter().enumerate() {
            let rsq = (x_i + v - x_j).norm_squared();
            if rsq < best_rsq {
                best = s;
                best_rsq = rsq;
            }
        }
        best
    }
}
