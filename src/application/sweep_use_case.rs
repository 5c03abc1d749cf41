// ============================================================
// Layer 2 — SweepUseCase
// ============================================================
// Measures realised label noise over a list of requested levels,
// starting every pass from the same clean training labels:
//
//   Step 1: Load and split once         (Layer 4 - data)
//   Step 2: Snapshot clean train labels (Layer 4 - data)
//   Step 3: For each trial and level:
//             corrupt → summarise → restore
//   Step 4: Append one CSV row per pass (Layer 6 - infra)
//
// Corruption is not idempotent, so without the restore every
// level after the first would start from already noisy labels.
//
// Trial t draws its corruption from trial_seed(seed, t); every
// level of one trial reuses that seed.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::application::prepare_use_case::PrepareConfig;
use crate::data::{
    assembler::{corruption_plan, split_and_claim, NoiseConfig},
    loader::{load_source, DatasetSource},
};
use crate::domain::error::ensure_probability;
use crate::domain::sample::SplitRole;
use crate::domain::traits::DatasetStore;
use crate::infra::{
    rng::{seeded_rng, trial_seed},
    sweep_log::{SweepLogger, SweepRow},
};

#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub base:         PrepareConfig,
    pub noise_levels: Vec<f64>,
    pub trials:       usize,
}

pub struct SweepUseCase {
    config: SweepConfig,
}

impl SweepUseCase {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Vec<SweepRow>> {
        let cfg  = &self.config;
        let base = &cfg.base;

        base.validate()?;
        if cfg.noise_levels.is_empty() || cfg.trials == 0 {
            bail!("A sweep needs at least one noise level and one trial");
        }
        for &level in &cfg.noise_levels {
            ensure_probability("noise_level", level)?;
        }

        // ── Step 1: Load and split once ───────────────────────────────────────
        let source = load_source(base.dataset, Path::new(&base.data_dir), &base.synthetic)
            .with_context(|| format!("Cannot load {} from '{}'", base.dataset, base.data_dir))?;
        let store = match source {
            DatasetSource::Splittable { train_val, .. } => train_val,
            DatasetSource::Predefined { .. } => {
                bail!("{} ships with natively noisy labels and cannot be swept", base.dataset)
            }
        };
        let n_classes = store.num_classes();

        // Every plan is built up front so a bad level fails before any pass
        let mut plans = Vec::with_capacity(cfg.noise_levels.len());
        for &noise_level in &cfg.noise_levels {
            let noise = NoiseConfig { noise_level, ..base.noise.clone() };
            match corruption_plan(base.dataset, &noise, n_classes)? {
                Some(plan) => plans.push(plan),
                None => bail!("{} has no corruption mode to sweep", base.dataset),
            }
        }

        let mut rng = seeded_rng(base.noise.seed);
        let (mut arena, train, _val) = split_and_claim(store, &base.noise, &mut rng)?;

        // ── Step 2: Snapshot the clean labels ─────────────────────────────────
        let clean = arena.snapshot_labels(&train)?;

        let logger   = SweepLogger::new(&base.output_dir)?;
        let mut rows = Vec::with_capacity(cfg.trials * plans.len());

        // ── Step 3: Corrupt, summarise, restore ───────────────────────────────
        for trial in 0..cfg.trials {
            let seed = trial_seed(base.noise.seed, trial);
            for (&level, plan) in cfg.noise_levels.iter().zip(&plans) {
                let mut trial_rng = seeded_rng(seed);
                let report = plan.apply(&mut arena, &train, &mut trial_rng)?;
                arena.restore_labels(SplitRole::Train, &clean)?;

                // ── Step 4: Log the pass ──────────────────────────────────────
                let row = SweepRow::new(trial, seed, level, report.provenance.summary());
                logger.log(&row)?;
                rows.push(row);
            }
        }

        tracing::info!(
            "Sweep complete: {} passes written to '{}'",
            rows.len(),
            logger.csv_path().display()
        );
        Ok(rows)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::corruptor::NoiseModel;
    use crate::data::loader::DatasetKind;
    use tempfile::tempdir;

    fn sweep(dir: &Path, noise_levels: Vec<f64>, trials: usize) -> SweepConfig {
        let mut base = PrepareConfig {
            dataset:    DatasetKind::Synthetic,
            output_dir: dir.display().to_string(),
            ..PrepareConfig::default()
        };
        base.noise.noise_model = Some(NoiseModel::IndependentRedraw);
        SweepConfig { base, noise_levels, trials }
    }

    #[test]
    fn test_one_row_per_pass() {
        let dir  = tempdir().unwrap();
        let rows = SweepUseCase::new(sweep(dir.path(), vec![0.0, 0.3, 0.6], 2)).execute().unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].summary.noisy_fraction(), 0.0);
        assert_eq!(rows[3].seed, 43);

        let csv = std::fs::read_to_string(dir.path().join("sweep.csv")).unwrap();
        assert_eq!(csv.lines().count(), 7);
    }

    #[test]
    fn test_each_level_starts_from_clean_labels() {
        // the same level twice in one trial only matches if labels are restored
        let dir  = tempdir().unwrap();
        let rows = SweepUseCase::new(sweep(dir.path(), vec![0.5, 0.5], 1)).execute().unwrap();
        assert_eq!(rows[0].summary, rows[1].summary);
    }

    #[test]
    fn test_bad_level_rejected() {
        let dir = tempdir().unwrap();
        assert!(SweepUseCase::new(sweep(dir.path(), vec![0.2, 1.5], 1)).execute().is_err());
        assert!(SweepUseCase::new(sweep(dir.path(), vec![], 1)).execute().is_err());
    }
}
