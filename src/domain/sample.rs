// ============================================================
// Layer 3 — Samples and Partitions
// ============================================================
// A SampleIndex is a position in the original, unsplit dataset.
// It never changes for the lifetime of a store, even when the
// label stored at that position is rewritten by corruption.
//
// A Partition is an ordered list of SampleIndex values with no
// duplicates. Train and validation partitions produced by the
// same split are disjoint and together cover every index once.
//
// Reference: Rust Book §8 (Vectors), §5 (Structs)

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::{NoiseError, NoiseResult};

/// Position of a sample in the original dataset
pub type SampleIndex = usize;

/// Class label in `[0, n_classes)`
pub type ClassId = usize;

/// Which logical subset a partition represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRole {
    Train,
    Validation,
    Test,
}

impl fmt::Display for SplitRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SplitRole::Train      => "train",
            SplitRole::Validation => "validation",
            SplitRole::Test       => "test",
        };
        f.write_str(name)
    }
}

/// An ordered, duplicate-free list of sample indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partition {
    indices: Vec<SampleIndex>,
}

impl Partition {
    /// Build a partition, rejecting duplicate indices.
    pub fn new(indices: Vec<SampleIndex>) -> NoiseResult<Self> {
        let mut seen = HashSet::with_capacity(indices.len());
        for &idx in &indices {
            if !seen.insert(idx) {
                return Err(NoiseError::precondition(format!(
                    "sample index {idx} appears twice in one partition"
                )));
            }
        }
        Ok(Self { indices })
    }

    /// Caller guarantees the indices are already unique
    /// (e.g. slices of a permutation).
    pub(crate) fn from_unique(indices: Vec<SampleIndex>) -> Self {
        Self { indices }
    }

    /// Every index of an `n`-sample store, in order
    pub fn full(n: usize) -> Self {
        Self { indices: (0..n).collect() }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// SampleIndex stored at `position` within this partition
    pub fn get(&self, position: usize) -> Option<SampleIndex> {
        self.indices.get(position).copied()
    }

    pub fn indices(&self) -> &[SampleIndex] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = SampleIndex> + '_ {
        self.indices.iter().copied()
    }

    pub fn into_vec(self) -> Vec<SampleIndex> {
        self.indices
    }

    /// True when no index occurs in both partitions
    pub fn is_disjoint(&self, other: &Partition) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let lookup: HashSet<SampleIndex> = small.iter().collect();
        !large.iter().any(|idx| lookup.contains(&idx))
    }

    /// Build a sub-partition from positions into this one.
    /// Positions must be unique and in range.
    pub fn select(&self, positions: &[usize]) -> NoiseResult<Partition> {
        let mut picked = Vec::with_capacity(positions.len());
        for &pos in positions {
            let idx = self.get(pos).ok_or_else(|| {
                NoiseError::precondition(format!(
                    "position {pos} is outside a partition of {} samples",
                    self.len()
                ))
            })?;
            picked.push(idx);
        }
        Partition::new(picked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_rejected() {
        assert!(Partition::new(vec![3, 1, 3]).is_err());
        assert_eq!(Partition::new(vec![3, 1, 2]).unwrap().len(), 3);
    }

    #[test]
    fn test_disjoint() {
        let a = Partition::new(vec![0, 2, 4]).unwrap();
        let b = Partition::new(vec![1, 3]).unwrap();
        let c = Partition::new(vec![4, 5]).unwrap();
        assert!(a.is_disjoint(&b));
        assert!(!a.is_disjoint(&c));
        assert!(Partition::default().is_disjoint(&a));
    }

    #[test]
    fn test_select_keeps_positions_order() {
        let p = Partition::new(vec![10, 20, 30, 40]).unwrap();
        let s = p.select(&[3, 0]).unwrap();
        assert_eq!(s.indices(), &[40, 10]);
        assert!(p.select(&[4]).is_err());
        assert!(p.select(&[1, 1]).is_err());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(SplitRole::Validation.to_string(), "validation");
    }
}
