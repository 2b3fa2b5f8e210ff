//! Partitioning of partner ranges into lane-width blocks.
//!
//! A range of `N` partners becomes `⌊N/W⌋` full blocks followed by one
//! remainder block of `N mod W` partners when that is non-zero. Unused slots
//! of the remainder read the last active partner, so every gathered index is
//! valid, and the kernel masks their contributions to zero.

use nonbond_math::MAX_LANES;

/// One block of at most `width` consecutive partners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneBlock {
    /// Offset of the first partner in the partner array.
    pub start: usize,
    /// Number of live slots, `1..=width`.
    pub active: usize,
}

impl LaneBlock {
    /// Partner index per slot, padding unused slots with the last active partner.
    #[inline]
    pub fn indices(&self, partners: &[usize]) -> [usize; MAX_LANES] {
        let live = &partners[self.start..self.start + self.active];
        let last = live[self.active - 1];
        let mut idx = [last; MAX_LANES];
        idx[..self.active].copy_from_slice(live);
        idx
    }
}

/// Iterator over the blocks of one partner range.
#[derive(Debug, Clone)]
pub struct LaneBlocks {
    next: usize,
    end: usize,
    width: usize,
}

impl Iterator for LaneBlocks {
    type Item = LaneBlock;

    #[inline]
    fn next(&mut self) -> Option<LaneBlock> {
        if self.next >= self.end {
            return None;
        }
        let start = self.next;
        let active = (self.end - start).min(self.width);
        self.next += active;
        Some(LaneBlock { start, active })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end.saturating_sub(self.next).div_ceil(self.width);
        (n, Some(n))
    }
}

impl ExactSizeIterator for LaneBlocks {}

/// Blocks covering `start..end` with `width` slots each.
#[inline]
pub fn lane_blocks(start: usize, end: usize, width: usize) -> LaneBlocks {
    debug_assert!(width > 0 && width <= MAX_LANES);
    LaneBlocks {
        next: start,
        end,
        width: width.max(1),
    }
}

/// `(full blocks, partners in the remainder block)` for `n` partners.
pub fn block_counts(n: usize, width: usize) -> (usize, usize) {
    let width = width.max(1);
    (n / width, n % width)
}
