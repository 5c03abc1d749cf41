// ============================================================
// Layer 2 — PrepareUseCase
// ============================================================
// Builds train / validation / test for one configuration:
//
//   Step 1: Validate the config        (Layer 4 - data)
//   Step 2: Load the dataset stores    (Layer 4 - data)
//   Step 3: Split, subsample, corrupt  (Layer 4 - data)
//   Step 4: Save config + provenance   (Layer 6 - infra)
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::data::{
    assembler::{assemble, NoiseConfig, PreparedData},
    loader::{load_source, DatasetKind, SyntheticSpec},
};
use crate::domain::error::NoiseResult;
use crate::infra::report::{ProvenanceReport, ReportWriter};

// ─── Prepare Configuration ───────────────────────────────────────────────────
// Everything a run needs. Serialisable so it can be loaded from
// `--config` and saved next to the provenance it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    pub dataset:    DatasetKind,
    pub data_dir:   String,
    pub output_dir: String,
    #[serde(flatten)]
    pub noise:      NoiseConfig,
    /// Only read when `dataset` is synthetic
    pub synthetic:  SyntheticSpec,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            dataset:    DatasetKind::Mnist,
            data_dir:   "data".to_string(),
            output_dir: "output".to_string(),
            noise:      NoiseConfig::default(),
            synthetic:  SyntheticSpec::default(),
        }
    }
}

impl PrepareConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }

    pub fn validate(&self) -> NoiseResult<()> {
        self.noise.validate()
    }
}

/// What a successful run produced
pub struct PrepareOutcome {
    pub data:            PreparedData,
    pub config_path:     PathBuf,
    pub provenance_path: PathBuf,
}

// ─── PrepareUseCase ───────────────────────────────────────────────────────────
pub struct PrepareUseCase {
    config: PrepareConfig,
}

impl PrepareUseCase {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PrepareConfig {
        &self.config
    }

    pub fn execute(&self) -> Result<PrepareOutcome> {
        let cfg = &self.config;

        // ── Step 1: Reject bad ranges before touching any file ────────────────
        cfg.validate()?;

        // ── Step 2: Load the stores for the chosen dataset ────────────────────
        let source = load_source(cfg.dataset, Path::new(&cfg.data_dir), &cfg.synthetic)
            .with_context(|| format!("Cannot load {} from '{}'", cfg.dataset, cfg.data_dir))?;

        // ── Step 3: Split, subsample and corrupt from one seed ────────────────
        let data = assemble(source, cfg.dataset, &cfg.noise)?;
        if let Some(prov) = &data.provenance {
            tracing::info!("Training provenance: {}", prov.summary());
        }

        // ── Step 4: Persist the config and provenance ─────────────────────────
        let writer          = ReportWriter::new(&cfg.output_dir)?;
        let config_path     = writer.save_config(cfg)?;
        let provenance_path = writer.save_provenance(&ProvenanceReport::from_prepared(&data))?;
        tracing::info!("Reports written to '{}'", writer.dir().display());

        Ok(PrepareOutcome { data, config_path, provenance_path })
    }
}
