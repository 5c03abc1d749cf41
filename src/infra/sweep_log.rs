// ============================================================
// Layer 6 — Sweep Logger
// ============================================================
// Records one CSV row per (trial, noise level) of a `sweep` run,
// so the realised noise can be compared with the requested one.
//
// Output file: <output_dir>/sweep.csv
//
// Example CSV output:
//   trial,seed,noise_level,train_samples,clean,corrupted,accidentally_correct,noisy_fraction
//   0,42,0.100000,800,727,65,8,0.091250
//   0,42,0.200000,800,641,144,15,0.198750
//
// noisy_fraction counts corrupted and accidentally_correct samples
// together, which is what independent redraw targets.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::domain::provenance::ProvenanceSummary;

const HEADER: &str = "trial,seed,noise_level,train_samples,clean,corrupted,accidentally_correct,noisy_fraction";

/// One corruption pass of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub trial:       usize,
    pub seed:        u64,
    pub noise_level: f64,
    pub summary:     ProvenanceSummary,
}

impl SweepRow {
    pub fn new(trial: usize, seed: u64, noise_level: f64, summary: ProvenanceSummary) -> Self {
        Self { trial, seed, noise_level, summary }
    }

    /// Realised noise minus requested noise
    pub fn deviation(&self) -> f64 {
        self.summary.noisy_fraction() - self.noise_level
    }
}

pub struct SweepLogger {
    csv_path: PathBuf,
}

impl SweepLogger {
    /// Writes the header only when the file is new, so repeated
    /// sweeps append to one log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;

        let csv_path = dir.join("sweep.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created sweep CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, row: &SweepRow) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;

        let s = &row.summary;
        writeln!(
            f,
            "{},{},{:.6},{},{},{},{},{:.6}",
            row.trial,
            row.seed,
            row.noise_level,
            s.total,
            s.clean,
            s.corrupted,
            s.accidentally_correct,
            s.noisy_fraction(),
        )?;

        tracing::debug!(
            "Logged trial {} at noise {:.2}: realised {:.4}",
            row.trial,
            row.noise_level,
            s.noisy_fraction(),
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
