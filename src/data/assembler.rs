// ============================================================
// Layer 4 — Dataset Assembler
// ============================================================
// Composes the core into one call:
//
//   DatasetSource ──► split ──► subsample? ──► claim ──► corrupt
//        │                                                  │
//        └──► test store ──────────────────────────────► transform?
//                                                           │
//                                                           ▼
//                              (train, val, test, provenance)
//
// One StdRng, seeded from the config, is consumed in this exact
// order: permutation, subsample, corruption draws, train image
// patches, validation image patches, test image patches.
//
// The corruption plan is built before the generator is created and
// before any store is touched, so a rejected configuration never
// mutates anything. Train and validation are claimed in the arena
// before corruption runs; the arena refuses any write outside the
// train claim.
//
// Predefined sources (Clothing1M) are neither split nor corrupted.
// Their provenance is None.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::arena::LabelArena;
use crate::data::confusion::ConfusionStrategy;
use crate::data::corruptor::{CorruptionPlan, CorruptionReport, NoiseModel};
use crate::data::dataset::LabeledDataset;
use crate::data::loader::{DatasetKind, DatasetSource};
use crate::data::splitter::split_with_rng;
use crate::data::subsampler::subsample;
use crate::data::transforms::ImageTransform;
use crate::domain::error::{ensure_probability, NoiseError, NoiseResult};
use crate::domain::provenance::ProvenanceVector;
use crate::domain::sample::{Partition, SplitRole};
use crate::domain::traits::DatasetStore;
use crate::infra::rng::seeded_rng;

/// Everything that controls split, subsample and corruption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub val_ratio:            f64,
    pub seed:                 u64,
    pub noise_level:          f64,
    pub num_train_examples:   Option<usize>,
    pub confusion_function:   ConfusionStrategy,
    /// Overrides the dataset's default corruption mode
    pub noise_model:          Option<NoiseModel>,
    /// Consumed by the training-side transform pipeline only
    pub data_augmentation:    bool,
    pub image_transform:      Option<ImageTransform>,
    pub transform_validation: bool,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            val_ratio:            0.2,
            seed:                 42,
            noise_level:          0.0,
            num_train_examples:   None,
            confusion_function:   ConfusionStrategy::UniformFlip,
            noise_model:          None,
            data_augmentation:    false,
            image_transform:      None,
            transform_validation: false,
        }
    }
}

impl NoiseConfig {
    pub fn validate(&self) -> NoiseResult<()> {
        ensure_probability("val_ratio", self.val_ratio)?;
        ensure_probability("noise_level", self.noise_level)?;
        if self.num_train_examples == Some(0) {
            return Err(NoiseError::invalid("num_train_examples must be positive"));
        }
        if let Some(transform) = &self.image_transform {
            transform.validate()?;
        }
        Ok(())
    }
}

/// Output of [`assemble`]
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub train:      LabeledDataset,
    pub val:        LabeledDataset,
    pub test:       LabeledDataset,
    /// Aligned with `train.partition()`; None when labels were not corrupted
    pub provenance: Option<ProvenanceVector>,
    pub corruption: Option<CorruptionReport>,
}

/// Corruption plan for `kind` under `config`, or None when the dataset
/// has no corruption mode and the config does not pick one
pub fn corruption_plan(
    kind:      DatasetKind,
    config:    &NoiseConfig,
    n_classes: usize,
) -> NoiseResult<Option<CorruptionPlan>> {
    config
        .noise_model
        .or_else(|| kind.default_noise_model())
        .map(|model| CorruptionPlan::build(model, config.confusion_function, n_classes, config.noise_level))
        .transpose()
}

/// Split a train+val store, subsample the training side and claim
/// both partitions. Returns the arena with (train, val).
pub fn split_and_claim<R: Rng>(
    store:  Box<dyn DatasetStore>,
    config: &NoiseConfig,
    rng:    &mut R,
) -> NoiseResult<(LabelArena, Partition, Partition)> {
    let (mut train, val) = split_with_rng(store.len(), config.val_ratio, rng)?;
    if let Some(count) = config.num_train_examples {
        train = subsample(&train, count, rng)?.partition;
    }

    let mut arena = LabelArena::new(store);
    arena.claim(SplitRole::Train, &train)?;
    arena.claim(SplitRole::Validation, &val)?;
    Ok((arena, train, val))
}

pub fn assemble(source: DatasetSource, kind: DatasetKind, config: &NoiseConfig) -> NoiseResult<PreparedData> {
    config.validate()?;
    let prepared = match source {
        DatasetSource::Splittable { train_val, test } => assemble_splittable(train_val, test, kind, config)?,
        DatasetSource::Predefined { train, val, test } => assemble_predefined(train, val, test, kind, config)?,
    };

    tracing::info!(
        "Dataset is loaded: train {} samples, val {} samples, test {} samples, sample shape {:?}",
        prepared.train.sample_count(),
        prepared.val.sample_count(),
        prepared.test.sample_count(),
        prepared.train.shape().dims()
    );
    Ok(prepared)
}

fn assemble_splittable(
    train_val: Box<dyn DatasetStore>,
    test:      Box<dyn DatasetStore>,
    kind:      DatasetKind,
    config:    &NoiseConfig,
) -> NoiseResult<PreparedData> {
    let plan = corruption_plan(kind, config, train_val.num_classes())?;
    let mut rng = seeded_rng(config.seed);

    let (mut arena, train, val) = split_and_claim(train_val, config, &mut rng)?;

    let corruption = match &plan {
        Some(plan) => Some(plan.apply(&mut arena, &train, &mut rng)?),
        None => {
            if config.noise_level > 0.0 {
                tracing::warn!("{} has no corruption mode; noise_level {} ignored", kind, config.noise_level);
            }
            None
        }
    };
    let provenance = Some(match &corruption {
        Some(report) => report.provenance.clone(),
        None => ProvenanceVector::all_clean(train.len()),
    });

    let mut test_arena = LabelArena::new(test);
    let test_part = Partition::full(test_arena.len());
    test_arena.claim(SplitRole::Test, &test_part)?;

    if let Some(transform) = &config.image_transform {
        transform_partition(&mut arena, SplitRole::Train, &train, transform, &mut rng)?;
        if config.transform_validation {
            transform_partition(&mut arena, SplitRole::Validation, &val, transform, &mut rng)?;
            transform_partition(&mut test_arena, SplitRole::Test, &test_part, transform, &mut rng)?;
        }
    }

    let shared = Arc::new(arena);
    let stats  = kind.statistics();
    Ok(PreparedData {
        train: LabeledDataset::new(shared.clone(), train, SplitRole::Train, kind.name(), stats.clone())?
            .with_augmentation(config.data_augmentation),
        val:   LabeledDataset::new(shared, val, SplitRole::Validation, kind.name(), stats.clone())?,
        test:  LabeledDataset::new(Arc::new(test_arena), test_part, SplitRole::Test, kind.name(), stats)?,
        provenance,
        corruption,
    })
}

fn assemble_predefined(
    train:  Box<dyn DatasetStore>,
    val:    Box<dyn DatasetStore>,
    test:   Box<dyn DatasetStore>,
    kind:   DatasetKind,
    config: &NoiseConfig,
) -> NoiseResult<PreparedData> {
    if config.noise_level > 0.0 || config.noise_model.is_some() {
        tracing::warn!("{} labels are natively noisy; noise settings are ignored", kind);
    }
    let mut rng = seeded_rng(config.seed);

    let mut train_arena = LabelArena::new(train);
    let mut train_part  = Partition::full(train_arena.len());
    if let Some(count) = config.num_train_examples {
        train_part = subsample(&train_part, count, &mut rng)?.partition;
    }
    train_arena.claim(SplitRole::Train, &train_part)?;

    let mut val_arena = LabelArena::new(val);
    let val_part = Partition::full(val_arena.len());
    val_arena.claim(SplitRole::Validation, &val_part)?;

    let mut test_arena = LabelArena::new(test);
    let test_part = Partition::full(test_arena.len());
    test_arena.claim(SplitRole::Test, &test_part)?;

    if let Some(transform) = &config.image_transform {
        transform_partition(&mut train_arena, SplitRole::Train, &train_part, transform, &mut rng)?;
        if config.transform_validation {
            transform_partition(&mut val_arena, SplitRole::Validation, &val_part, transform, &mut rng)?;
            transform_partition(&mut test_arena, SplitRole::Test, &test_part, transform, &mut rng)?;
        }
    }

    let stats = kind.statistics();
    Ok(PreparedData {
        train: LabeledDataset::new(Arc::new(train_arena), train_part, SplitRole::Train, kind.name(), stats.clone())?
            .with_augmentation(config.data_augmentation),
        val:   LabeledDataset::new(Arc::new(val_arena), val_part, SplitRole::Validation, kind.name(), stats.clone())?,
        test:  LabeledDataset::new(Arc::new(test_arena), test_part, SplitRole::Test, kind.name(), stats)?,
        provenance: None,
        corruption: None,
    })
}

/// Apply `transform` in place to every image of `partition`
fn transform_partition<R: Rng>(
    arena:     &mut LabelArena,
    role:      SplitRole,
    partition: &Partition,
    transform: &ImageTransform,
    rng:       &mut R,
) -> NoiseResult<()> {
    let shape = arena.shape();
    for idx in partition.iter() {
        let mut pixels = arena.image_at(idx)?;
        transform.apply(&mut pixels, shape, rng)?;
        arena.set_image(role, idx, pixels)?;
    }
    tracing::debug!("Applied {:?} to {} {} images", transform, partition.len(), role);
    Ok(())
}
