// ============================================================
// Layer 3 — Label Provenance
// ============================================================
// One entry per training sample, in training-partition order,
// recording what the corruption pass did to its label:
//
//   Clean               — label left untouched
//   Corrupted           — label replaced by a different class
//   AccidentallyCorrect — label was redrawn, but the draw landed
//                         on the original class
//
// Only the independent-redraw mode produces AccidentallyCorrect.
// The confusion-matrix mode reports a redraw that lands on the
// original class as Clean.
//
// The vector is built once by the corruptor and never mutated;
// filtering (after subsampling) produces a new vector.
//
// Reference: Rust Book §6 (Enums and Pattern Matching)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::{NoiseError, NoiseResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Clean,
    Corrupted,
    AccidentallyCorrect,
}

impl Provenance {
    /// Integer code used in exported arrays: 0 clean, 1 corrupted,
    /// 2 accidentally correct
    pub fn code(self) -> u8 {
        match self {
            Provenance::Clean               => 0,
            Provenance::Corrupted           => 1,
            Provenance::AccidentallyCorrect => 2,
        }
    }

    /// True when the label went through a redraw
    pub fn is_noisy(self) -> bool {
        !matches!(self, Provenance::Clean)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvenanceVector {
    entries: Vec<Provenance>,
}

impl ProvenanceVector {
    pub fn from_entries(entries: Vec<Provenance>) -> Self {
        Self { entries }
    }

    /// A vector of `n` clean entries
    pub fn all_clean(n: usize) -> Self {
        Self { entries: vec![Provenance::Clean; n] }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<Provenance> {
        self.entries.get(position).copied()
    }

    pub fn as_slice(&self) -> &[Provenance] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = Provenance> + '_ {
        self.entries.iter().copied()
    }

    pub fn count(&self, state: Provenance) -> usize {
        self.entries.iter().filter(|&&p| p == state).count()
    }

    pub fn codes(&self) -> Vec<u8> {
        self.entries.iter().map(|p| p.code()).collect()
    }

    /// Fraction of entries that went through a redraw
    /// (corrupted + accidentally correct). 0 for an empty vector.
    pub fn noisy_fraction(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let noisy = self.entries.iter().filter(|p| p.is_noisy()).count();
        noisy as f64 / self.entries.len() as f64
    }

    /// Fraction of entries whose label actually changed
    pub fn corrupted_fraction(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.count(Provenance::Corrupted) as f64 / self.entries.len() as f64
    }

    /// Keep the entries at `positions`, in that order. Used to stay
    /// aligned with a partition that was subsampled after corruption.
    pub fn select(&self, positions: &[usize]) -> NoiseResult<ProvenanceVector> {
        let mut picked = Vec::with_capacity(positions.len());
        for &pos in positions {
            let entry = self.get(pos).ok_or_else(|| {
                NoiseError::precondition(format!(
                    "provenance position {pos} is outside a vector of {} entries",
                    self.len()
                ))
            })?;
            picked.push(entry);
        }
        Ok(Self { entries: picked })
    }

    pub fn summary(&self) -> ProvenanceSummary {
        ProvenanceSummary {
            total:                self.len(),
            clean:                self.count(Provenance::Clean),
            corrupted:            self.count(Provenance::Corrupted),
            accidentally_correct: self.count(Provenance::AccidentallyCorrect),
        }
    }
}

/// Per-state counts, logged after corruption and written to reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceSummary {
    pub total:                usize,
    pub clean:                usize,
    pub corrupted:            usize,
    pub accidentally_correct: usize,
}

impl ProvenanceSummary {
    pub fn noisy_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.corrupted + self.accidentally_correct) as f64 / self.total as f64
        }
    }
}

impl fmt::Display for ProvenanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} samples: {} clean, {} corrupted, {} accidentally correct ({:.1}% redrawn)",
            self.total,
            self.clean,
            self.corrupted,
            self.accidentally_correct,
            self.noisy_fraction() * 100.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Provenance::*;

    #[test]
    fn test_counts_and_fractions() {
        let v = ProvenanceVector::from_entries(vec![Clean, Corrupted, AccidentallyCorrect, Clean]);
        let s = v.summary();
        assert_eq!(s.total, 4);
        assert_eq!(s.clean, 2);
        assert_eq!(s.corrupted, 1);
        assert_eq!(s.accidentally_correct, 1);
        assert!((v.noisy_fraction() - 0.5).abs() < 1e-12);
        assert!((v.corrupted_fraction() - 0.25).abs() < 1e-12);
        assert_eq!(v.codes(), vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_select_reindexes() {
        let v = ProvenanceVector::from_entries(vec![Clean, Corrupted, AccidentallyCorrect]);
        let s = v.select(&[2, 1]).unwrap();
        assert_eq!(s.as_slice(), &[AccidentallyCorrect, Corrupted]);
        assert!(v.select(&[3]).is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let v = ProvenanceVector::from_entries(vec![AccidentallyCorrect]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"["accidentally_correct"]"#);
    }

    #[test]
    fn test_empty_vector_fraction_is_zero() {
        assert_eq!(ProvenanceVector::default().noisy_fraction(), 0.0);
    }
}
