//! Fixed-width data-parallel lanes.
//!
//! A [`Lane`] is `WIDTH` independent `f64` slots driven by one instruction
//! stream. Kernels are written once against this trait and instantiated for
//! plain `f64` (width 1) and the `wide` vectors `f64x2` and `f64x4`.
//!
//! Masks come out of comparisons. Applying a mask clears inactive slots
//! bitwise, so a NaN or infinity computed in a masked-out slot never reaches
//! a sum.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, BitAnd, Div, Mul, Neg, Sub};
use wide::{CmpLt, f64x2, f64x4};

/// Widest lane type provided; sizes the per-block index buffers.
pub const MAX_LANES: usize = 4;

/// Lane type used by the kernel dispatcher.
#[cfg(feature = "lanes-1")]
pub type DefaultLane = f64;
/// Lane type used by the kernel dispatcher.
#[cfg(all(feature = "lanes-2", not(feature = "lanes-1")))]
pub type DefaultLane = f64x2;
/// Lane type used by the kernel dispatcher.
#[cfg(not(any(feature = "lanes-1", feature = "lanes-2")))]
pub type DefaultLane = f64x4;

const ALL_ONES: u64 = u64::MAX;

/// A fixed-width vector of `f64` slots.
pub trait Lane:
    Copy
    + Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
{
    /// Number of slots.
    const WIDTH: usize;

    /// Per-slot predicate produced by comparisons.
    type Mask: Copy + Debug + BitAnd<Output = Self::Mask>;

    /// Broadcast one value to every slot.
    fn splat(value: f64) -> Self;

    /// All slots zero.
    #[inline]
    fn zero() -> Self {
        Self::splat(0.0)
    }

    /// Build a lane from a per-slot generator, called for slots `0..WIDTH` in order.
    fn gather<F: FnMut(usize) -> f64>(f: F) -> Self;

    /// Read one slot.
    fn extract(self, lane: usize) -> f64;

    /// Slot-wise square root.
    fn sqrt(self) -> Self;

    /// Apply a scalar function slot by slot (transcendentals without a vector form).
    #[inline]
    fn map<F: Fn(f64) -> f64>(self, f: F) -> Self {
        Self::gather(|k| f(self.extract(k)))
    }

    /// Slot-wise strict `self < rhs`.
    fn less_than(self, rhs: Self) -> Self::Mask;

    /// Mask with the first `n` slots active.
    fn first_n(n: usize) -> Self::Mask;

    /// True if any slot of `mask` is active.
    fn any(mask: Self::Mask) -> bool;

    /// Keep active slots, clear the rest to `+0.0`.
    fn masked(self, mask: Self::Mask) -> Self;

    /// Horizontal sum, folded in slot order.
    #[inline]
    fn reduce_add(self) -> f64 {
        let mut sum = 0.0;
        for k in 0..Self::WIDTH {
            sum += self.extract(k);
        }
        sum
    }
}

impl Lane for f64 {
    const WIDTH: usize = 1;
    type Mask = bool;

    #[inline]
    fn splat(value: f64) -> Self {
        value
    }

    #[inline]
    fn gather<F: FnMut(usize) -> f64>(mut f: F) -> Self {
        f(0)
    }

    #[inline]
    fn extract(self, _lane: usize) -> f64 {
        self
    }

    #[inline]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    #[inline]
    fn less_than(self, rhs: Self) -> bool {
        self < rhs
    }

    #[inline]
    fn first_n(n: usize) -> bool {
        n > 0
    }

    #[inline]
    fn any(mask: bool) -> bool {
        mask
    }

    #[inline]
    fn masked(self, mask: bool) -> Self {
        if mask { self } else { 0.0 }
    }
}

macro_rules! impl_wide_lane {
    ($ty:ident, $width:expr) => {
        impl Lane for $ty {
            const WIDTH: usize = $width;
            type Mask = $ty;

            #[inline]
            fn splat(value: f64) -> Self {
                $ty::splat(value)
            }

            #[inline]
            fn gather<F: FnMut(usize) -> f64>(mut f: F) -> Self {
                let mut slots = [0.0; $width];
                for (k, slot) in slots.iter_mut().enumerate() {
                    *slot = f(k);
                }
                $ty::from(slots)
            }

            #[inline]
            fn extract(self, lane: usize) -> f64 {
                self.to_array()[lane]
            }

            #[inline]
            fn sqrt(self) -> Self {
                $ty::sqrt(self)
            }

            #[inline]
            fn less_than(self, rhs: Self) -> Self {
                CmpLt::cmp_lt(self, rhs)
            }

            #[inline]
            fn first_n(n: usize) -> Self {
                let on = f64::from_bits(ALL_ONES);
                <$ty as Lane>::gather(|k| if k < n { on } else { 0.0 })
            }

            #[inline]
            fn any(mask: Self) -> bool {
                mask.move_mask() != 0
            }

            #[inline]
            fn masked(self, mask: Self) -> Self {
                self & mask
            }
        }
    };
}

impl_wide_lane!(f64x2, 2);
impl_wide_lane!(f64x4, 4);


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn masked_sum<L: Lane>(values: &[f64], limit: f64) -> f64 {
        let mut acc = L::zero();
        for chunk in values.chunks(L::WIDTH) {
            let x = L::gather(|k| chunk.get(k).copied().unwrap_or(0.0));
            let mask = x.less_than(L::splat(limit)) & L::first_n(chunk.len());
            acc += x.masked(mask);
        }
        acc.reduce_add()
    }

    fn branch_sum(values: &[f64], limit: f64) -> f64 {
        values.iter().filter(|&&v| v < limit).sum()
    }

    proptest! {
        #[test]
        fn mask_matches_branch(
            values in prop::collection::vec(-10.0..10.0_f64, 0..40),
            limit in -10.0..10.0_f64,
        ) {
            let reference = branch_sum(&values, limit);
            let tol = 1e-12 * (1.0 + values.iter().map(|v| v.abs()).sum::<f64>());
            prop_assert!((masked_sum::<f64>(&values, limit) - reference).abs() < tol);
            prop_assert!((masked_sum::<f64x2>(&values, limit) - reference).abs() < tol);
            prop_assert!((masked_sum::<f64x4>(&values, limit) - reference).abs() < tol);
        }

        #[test]
        fn first_n_counts_active_slots(n in 0usize..=4) {
            let ones = <f64x4 as Lane>::splat(1.0).masked(<f64x4 as Lane>::first_n(n));
            prop_assert_eq!(ones.reduce_add(), n as f64);
        }
    }
}
