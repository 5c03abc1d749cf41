// ============================================================
// Layer 4 — Confusion-Matrix Generator
// ============================================================
// A confusion matrix is a C×C row-stochastic matrix: entry (i, j)
// is the probability that a sample whose true label is i ends up
// labelled j. Three strategies are supported:
//
//   UniformFlip    — row i = p/C everywhere, plus (1-p) on (i, i).
//                    A flip can land back on the true class.
//
//   UniformError   — (1-p) on the diagonal, p/(C-1) on every
//                    off-diagonal entry. A flip always changes the
//                    label.
//
//   CustomFixedMap — identity, except four CIFAR-10 class pairs:
//                      truck → automobile   (9 → 1)
//                      bird  → airplane     (2 → 0)
//                      deer  → horse        (4 → 7)
//                      cat   → dog          (3 → 5)
//                    each source row keeps (1-p) and moves p.
//
// Every matrix is validated on construction: square, all entries
// in [0, 1], every row summing to 1 within ROW_TOLERANCE.
//
// Reference: ndarray crate documentation (Array2)

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::domain::error::{ensure_probability, NoiseError, NoiseResult};
use crate::domain::sample::ClassId;

/// Strategy used to build a confusion matrix, dispatched by value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfusionStrategy {
    #[default]
    UniformFlip,
    UniformError,
    CustomFixedMap,
}

impl ConfusionStrategy {
    pub fn name(self) -> &'static str {
        match self {
            ConfusionStrategy::UniformFlip    => "uniform_flip",
            ConfusionStrategy::UniformError   => "uniform_error",
            ConfusionStrategy::CustomFixedMap => "custom_fixed_map",
        }
    }
}

impl fmt::Display for ConfusionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfusionStrategy {
    type Err = NoiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "uniform_flip" | "flip"                     => Ok(ConfusionStrategy::UniformFlip),
            "uniform_error" | "error"                   => Ok(ConfusionStrategy::UniformError),
            "custom_fixed_map" | "cifar10_custom"       => Ok(ConfusionStrategy::CustomFixedMap),
            other => Err(NoiseError::invalid(format!("unknown confusion function '{other}'"))),
        }
    }
}

/// Class pairs `(from, to)` flipped by the custom fixed map
pub const FIXED_MAP_FLIPS: [(ClassId, ClassId); 4] = [(9, 1), (2, 0), (4, 7), (3, 5)];

/// Class count the custom fixed map is defined for
pub const FIXED_MAP_CLASSES: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    probs: Array2<f64>,
}

impl ConfusionMatrix {
    /// Maximum allowed |row sum − 1|
    pub const ROW_TOLERANCE: f64 = 1e-9;

    /// Build the matrix for `strategy`
    pub fn generate(strategy: ConfusionStrategy, n_classes: usize, error_prob: f64) -> NoiseResult<Self> {
        match strategy {
            ConfusionStrategy::UniformFlip    => Self::uniform_flip(n_classes, error_prob),
            ConfusionStrategy::UniformError   => Self::uniform_error(n_classes, error_prob),
            ConfusionStrategy::CustomFixedMap => Self::custom_fixed_map(n_classes, error_prob),
        }
    }

    pub fn uniform_flip(n_classes: usize, error_prob: f64) -> NoiseResult<Self> {
        ensure_probability("error_prob", error_prob)?;
        if n_classes == 0 {
            return Err(NoiseError::invalid("uniform_flip needs at least one class"));
        }
        let mut probs = Array2::from_elem((n_classes, n_classes), error_prob / n_classes as f64);
        for i in 0..n_classes {
            probs[[i, i]] += 1.0 - error_prob;
        }
        Self::from_array(probs)
    }

    pub fn uniform_error(n_classes: usize, error_prob: f64) -> NoiseResult<Self> {
        ensure_probability("error_prob", error_prob)?;
        if n_classes < 2 {
            return Err(NoiseError::invalid(
                "uniform_error needs at least two classes to move a label",
            ));
        }
        let mut probs = Array2::from_elem((n_classes, n_classes), error_prob / (n_classes - 1) as f64);
        for i in 0..n_classes {
            probs[[i, i]] = 1.0 - error_prob;
        }
        Self::from_array(probs)
    }

    pub fn custom_fixed_map(n_classes: usize, error_prob: f64) -> NoiseResult<Self> {
        ensure_probability("error_prob", error_prob)?;
        if n_classes != FIXED_MAP_CLASSES {
            return Err(NoiseError::invalid(format!(
                "custom_fixed_map is defined for {FIXED_MAP_CLASSES} classes, got {n_classes}"
            )));
        }
        let mut probs = Array2::eye(n_classes);
        for &(from, to) in &FIXED_MAP_FLIPS {
            probs[[from, to]]   = error_prob;
            probs[[from, from]] = 1.0 - error_prob;
        }
        Self::from_array(probs)
    }

    /// Wrap an arbitrary matrix, validating that it is row-stochastic
    pub fn from_array(probs: Array2<f64>) -> NoiseResult<Self> {
        let matrix = Self { probs };
        matrix.validate()?;
        Ok(matrix)
    }

    pub fn validate(&self) -> NoiseResult<()> {
        let (rows, cols) = self.probs.dim();
        if rows == 0 || rows != cols {
            return Err(NoiseError::precondition(format!(
                "confusion matrix must be square and non-empty, got {rows}×{cols}"
            )));
        }
        for (i, row) in self.probs.outer_iter().enumerate() {
            if let Some(bad) = row.iter().find(|p| !(0.0..=1.0).contains(*p)) {
                return Err(NoiseError::precondition(format!(
                    "confusion row {i} holds {bad}, outside [0, 1]"
                )));
            }
            let sum: f64 = row.sum();
            if (sum - 1.0).abs() > Self::ROW_TOLERANCE {
                return Err(NoiseError::precondition(format!(
                    "confusion row {i} sums to {sum}, not 1"
                )));
            }
        }
        Ok(())
    }

    pub fn n_classes(&self) -> usize {
        self.probs.nrows()
    }

    /// Relabelling distribution for true class `class`
    pub fn row(&self, class: ClassId) -> ArrayView1<'_, f64> {
        self.probs.row(class)
    }

    pub fn get(&self, from: ClassId, to: ClassId) -> f64 {
        self.probs[[from, to]]
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.probs
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.probs.outer_iter() {
            let cells: Vec<String> = row.iter().map(|p| format!("{p:.4}")).collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}
