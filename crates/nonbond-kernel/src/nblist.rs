//! Neighbor lists in outer-entry / partner-range form.
//!
//! Each entry names an outer ("i") particle, the periodic shift applied to it,
//! its energy group, and a contiguous half-open range into one flat partner
//! array. Entry `n` owns `partners[jindex[n]..jindex[n + 1]]`.

use crate::error::{KernelError, Result};
use std::ops::Range;

/// Immutable per-step neighbor list.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborList {
    outer: Vec<usize>,
    shift: Vec<usize>,
    group: Vec<usize>,
    jindex: Vec<usize>,
    partners: Vec<usize>,
}

/// One outer entry as seen by the kernel.
#[derive(Clone, Debug, PartialEq)]
pub struct OuterEntry {
    /// First particle of the outer molecule.
    pub index: usize,
    /// Shift-vector index applied to the outer coordinates.
    pub shift: usize,
    /// Energy group receiving this entry's potential.
    pub group: usize,
    /// Range into the flat partner array.
    pub range: Range<usize>,
}

impl Default for NeighborList {
    fn default() -> Self {
        Self {
            outer: Vec::new(),
            shift: Vec::new(),
            group: Vec::new(),
            jindex: vec![0],
            partners: Vec::new(),
        }
    }
}

impl NeighborList {
    /// Assemble a list from raw arrays, checking the range invariants.
    pub fn from_raw(
        outer: Vec<usize>,
        shift: Vec<usize>,
        group: Vec<usize>,
        jindex: Vec<usize>,
        partners: Vec<usize>,
    ) -> Result<Self> {
        let nri = outer.len();
        if shift.len() != nri || group.len() != nri {
            return Err(KernelError::InvalidNeighborList(format!(
                "{} outer entries but {} shifts and {} groups",
                nri,
                shift.len(),
                group.len()
            )));
        }
        if jindex.len() != nri + 1 {
            return Err(KernelError::InvalidNeighborList(format!(
                "jindex must have {} entries, found {}",
                nri + 1,
                jindex.len()
            )));
        }
        if jindex[0] != 0 {
            return Err(KernelError::InvalidNeighborList(
                "first partner range must start at 0".into(),
            ));
        }
        if let Some(n) = jindex.windows(2).position(|w| w[0] > w[1]) {
            return Err(KernelError::InvalidNeighborList(format!(
                "entry {n} has start > end"
            )));
        }
        if jindex[nri] != partners.len() {
            return Err(KernelError::InvalidNeighborList(format!(
                "last range ends at {} but {} partners are stored",
                jindex[nri],
                partners.len()
            )));
        }
        Ok(Self {
            outer,
            shift,
            group,
            jindex,
            partners,
        })
    }

    /// Number of outer entries.
    pub fn len(&self) -> usize {
        self.outer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outer.is_empty()
    }

    /// Total number of stored partners.
    pub fn n_partners(&self) -> usize {
        self.partners.len()
    }

    /// Flat partner array.
    pub fn partners(&self) -> &[usize] {
        &self.partners
    }

    #[inline]
    pub fn outer_index(&self, n: usize) -> usize {
        self.outer[n]
    }

    #[inline]
    pub fn shift_index(&self, n: usize) -> usize {
        self.shift[n]
    }

    #[inline]
    pub fn group_index(&self, n: usize) -> usize {
        self.group[n]
    }

    /// Partner range of entry `n`.
    #[inline]
    pub fn partner_range(&self, n: usize) -> Range<usize> {
        self.jindex[n]..self.jindex[n + 1]
    }

    /// Iterate over entries in list order.
    pub fn entries(&self) -> impl Iterator<Item = OuterEntry> + '_ {
        (0..self.len()).map(|n| OuterEntry {
            index: self.outer[n],
            shift: self.shift[n],
            group: self.group[n],
            range: self.partner_range(n),
        })
    }

    /// Largest group id referenced, if any.
    pub fn max_group(&self) -> Option<usize> {
        self.group.iter().copied().max()
    }

    /// Check every index against the sizes of the arrays the kernel will touch.
    ///
    /// `i_sites`/`j_sites` are the number of consecutive particles read per
    /// outer/partner index (1 for plain particles, 3 or 4 for rigid water).
    pub fn validate(
        &self,
        n_particles: usize,
        n_shifts: usize,
        n_groups: usize,
        i_sites: usize,
        j_sites: usize,
    ) -> Result<()> {
        for entry in self.entries() {
            if entry.index + i_sites > n_particles {
                return Err(KernelError::InvalidNeighborList(format!(
                    "outer particle {} (+{} sites) exceeds {} particles",
                    entry.index, i_sites, n_particles
                )));
            }
            if entry.shift >= n_shifts {
                return Err(KernelError::InvalidNeighborList(format!(
                    "shift index {} exceeds {} shift vectors",
                    entry.shift, n_shifts
                )));
            }
            if entry.group >= n_groups {
                return Err(KernelError::InvalidNeighborList(format!(
                    "group {} exceeds {} energy groups",
                    entry.group, n_groups
                )));
            }
        }
        if let Some(&j) = self.partners.iter().find(|&&j| j + j_sites > n_particles) {
            return Err(KernelError::InvalidNeighborList(format!(
                "partner {} (+{} sites) exceeds {} particles",
                j, j_sites, n_particles
            )));
        }
        Ok(())
    }

    /// Split into at most `parts` lists over disjoint, contiguous runs of
    /// outer entries with roughly equal partner counts.
    pub fn partition(&self, parts: usize) -> Vec<NeighborList> {
        let parts = parts.max(1);
        if self.is_empty() {
            return vec![self.clone()];
        }
        let target = self.n_partners().div_ceil(parts).max(1);

        let mut out = Vec::with_capacity(parts);
        let mut builder = NeighborListBuilder::new();
        let mut load = 0;
        for entry in self.entries() {
            let len = entry.range.len();
            builder.push(
                entry.index,
                entry.shift,
                entry.group,
                &self.partners[entry.range],
            );
            load += len;
            if load >= target && out.len() + 1 < parts {
                out.push(std::mem::take(&mut builder).build());
                load = 0;
            }
        }
        if !builder.is_empty() || out.is_empty() {
            out.push(builder.build());
        }
        out
    }
}

/// Incremental construction of a [`NeighborList`].
#[derive(Debug, Default)]
pub struct NeighborListBuilder {
    list: NeighborList,
}

impl NeighborListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one outer entry with its partners.
    pub fn push(&mut self, outer: usize, shift: usize, group: usize, partners: &[usize]) {
        let list = &mut self.list;
        list.outer.push(outer);
        list.shift.push(shift);
        list.group.push(group);
        list.partners.extend_from_slice(partners);
        list.jindex.push(list.partners.len());
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn build(self) -> NeighborList {
        self.list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NeighborList {
        let mut b = NeighborListBuilder::new();
        b.push(0, 13, 0, &[1, 2, 3]);
        b.push(1, 13, 1, &[]);
        b.push(2, 4, 0, &[3]);
        b.build()
    }

    #[test]
    fn test_builder_ranges() {
        let nl = sample();
        assert_eq!(nl.len(), 3);
        assert_eq!(nl.n_partners(), 4);
        assert_eq!(nl.partner_range(0), 0..3);
        assert_eq!(nl.partner_range(1), 3..3);
        assert_eq!(nl.partner_range(2), 3..4);
        assert_eq!(nl.max_group(), Some(1));

        let entries: Vec<_> = nl.entries().collect();
        assert_eq!(entries[2].shift, 4);
        assert_eq!(&nl.partners()[entries[2].range.clone()], &[3]);
    }

    #[test]
    fn test_empty_list() {
        let nl = NeighborList::default();
        assert!(nl.is_empty());
        assert_eq!(nl.n_partners(), 0);
        assert!(nl.validate(0, 1, 1, 1, 1).is_ok());
    }

    #[test]
    fn test_from_raw_checks_ranges() {
        let ok = NeighborList::from_raw(vec![0, 1], vec![0, 0], vec![0, 0], vec![0, 2, 3], vec![
            1, 2, 0,
        ]);
        assert!(ok.is_ok());

        let decreasing =
            NeighborList::from_raw(vec![0, 1], vec![0, 0], vec![0, 0], vec![0, 2, 1], vec![1, 2]);
        assert!(matches!(decreasing, Err(KernelError::InvalidNeighborList(_))));

        let short_tail =
            NeighborList::from_raw(vec![0], vec![0], vec![0], vec![0, 1], vec![1, 2]);
        assert!(short_tail.is_err());

        let bad_start = NeighborList::from_raw(vec![0], vec![0], vec![0], vec![1, 2], vec![1, 2]);
        assert!(bad_start.is_err());

        let mismatched = NeighborList::from_raw(vec![0], vec![], vec![0], vec![0, 0], vec![]);
        assert!(mismatched.is_err());
    }

    #[test]
    fn test_validate_indices() {
        let nl = sample();
        assert!(nl.validate(4, 27, 2, 1, 1).is_ok());
        assert!(nl.validate(3, 27, 2, 1, 1).is_err());
        assert!(nl.validate(4, 13, 2, 1, 1).is_err());
        assert!(nl.validate(4, 27, 1, 1, 1).is_err());
        // Water sites push the outer molecule past the end.
        assert!(nl.validate(4, 27, 2, 3, 1).is_err());
    }

    #[test]
    fn test_partition_preserves_entries() {
        let mut b = NeighborListBuilder::new();
        for i in 0..10 {
            let partners: Vec<usize> = (i + 1..10).collect();
            b.push(i, 0, 0, &partners);
        }
        let nl = b.build();
        let parts = nl.partition(3);
        assert!(parts.len() <= 3);
        assert!(!parts.is_empty());

        let total: usize = parts.iter().map(|p| p.n_partners()).sum();
        assert_eq!(total, nl.n_partners());

        let outer: Vec<usize> = parts
            .iter()
            .flat_map(|p| p.entries().map(|e| e.index).collect::<Vec<_>>())
            .collect();
        assert_eq!(outer, (0..10).collect::<Vec<_>>());
    }
}
