// ============================================================
// Layer 6 — Report Writer
// ============================================================
// Persists what a `prepare` run produced so a training run can be
// reproduced and its results broken down by provenance later.
//
// Files written to the output directory:
//   prepare_config.json  — the full PrepareConfig used
//   provenance.json      — dataset name, train/val indices,
//                          per-sample provenance, summary counts
//
// Example provenance.json:
//   {
//     "dataset": "cifar10",
//     "train_indices": [1032, 77, ...],
//     "val_indices": [5, 9120, ...],
//     "provenance": ["clean", "corrupted", ...],
//     "summary": { "total": 40000, "clean": 28000, ... }
//   }
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::application::prepare_use_case::PrepareConfig;
use crate::data::assembler::PreparedData;
use crate::domain::provenance::{ProvenanceSummary, ProvenanceVector};
use crate::domain::sample::Partition;

const CONFIG_FILE: &str     = "prepare_config.json";
const PROVENANCE_FILE: &str = "provenance.json";

/// On-disk form of one run's split and provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceReport {
    pub dataset:       String,
    pub train_indices: Partition,
    pub val_indices:   Partition,
    /// None for datasets whose labels were not corrupted
    pub provenance:    Option<ProvenanceVector>,
    pub summary:       Option<ProvenanceSummary>,
}

impl ProvenanceReport {
    pub fn from_prepared(data: &PreparedData) -> Self {
        Self {
            dataset:       data.train.dataset_name().to_string(),
            train_indices: data.train.partition().clone(),
            val_indices:   data.val.partition().clone(),
            provenance:    data.provenance.clone(),
            summary:       data.provenance.as_ref().map(ProvenanceVector::summary),
        }
    }
}

/// Writes and reads the JSON reports of a run
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// Creates the directory if it doesn't already exist
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_config(&self, cfg: &PrepareConfig) -> Result<PathBuf> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved prepare config to '{}'", path.display());
        Ok(path)
    }

    pub fn load_config(&self) -> Result<PrepareConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }

    pub fn save_provenance(&self, report: &ProvenanceReport) -> Result<PathBuf> {
        let path = self.dir.join(PROVENANCE_FILE);
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write provenance to '{}'", path.display()))?;

        tracing::debug!("Saved provenance of {} training samples", report.train_indices.len());
        Ok(path)
    }

    pub fn load_provenance(&self) -> Result<ProvenanceReport> {
        let path = self.dir.join(PROVENANCE_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!("Cannot read '{}'. Have you run 'prepare' first?", path.display())
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provenance::Provenance;
    use tempfile::tempdir;

    #[test]
    fn test_config_written_and_read_back() {
        let dir    = tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("run")).unwrap();

        let mut cfg = PrepareConfig::default();
        cfg.noise.noise_level = 0.4;
        cfg.noise.seed = 7;
        writer.save_config(&cfg).unwrap();

        assert_eq!(writer.load_config().unwrap(), cfg);
    }

    #[test]
    fn test_provenance_file_contents() {
        let dir    = tempdir().unwrap();
        let writer = ReportWriter::new(dir.path()).unwrap();

        let prov = ProvenanceVector::from_entries(vec![
            Provenance::Clean,
            Provenance::Corrupted,
            Provenance::AccidentallyCorrect,
        ]);
        let report = ProvenanceReport {
            dataset:       "synthetic".into(),
            train_indices: Partition::new(vec![4, 0, 2]).unwrap(),
            val_indices:   Partition::new(vec![1, 3]).unwrap(),
            summary:       Some(prov.summary()),
            provenance:    Some(prov),
        };
        let path = writer.save_provenance(&report).unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("\"accidentally_correct\""));
        assert_eq!(writer.load_provenance().unwrap(), report);
    }

    #[test]
    fn test_missing_report_has_context() {
        let dir    = tempdir().unwrap();
        let writer = ReportWriter::new(dir.path()).unwrap();
        let err    = writer.load_provenance().unwrap_err();
        assert!(err.to_string().contains("prepare"));
    }
}
