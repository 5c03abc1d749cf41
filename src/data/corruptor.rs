// ============================================================
// Layer 4 — Label Corruptor
// ============================================================
// Injects synthetic label noise into the training partition of a
// LabelArena, in partition order, and records provenance.
//
// Independent-redraw mode (noise_level = p):
//   for each sample:
//     u ~ Uniform[0, 1)
//     if u < p:
//       new ~ Uniform{0 .. C-1}
//       new == old → AccidentallyCorrect
//       new != old → Corrupted, label overwritten
//     else         → Clean
//
// Confusion-matrix mode (matrix M):
//   for each sample with label ℓ:
//     new ~ Categorical(M[ℓ, ·])
//     label overwritten with new
//     new != ℓ → Corrupted, else Clean
//
// Both passes mutate the arena in place and are NOT idempotent:
// running one twice drifts labels further from ground truth. Take
// a LabelSnapshot first when several noise levels must start from
// the same clean labels.
//
// Every argument and every label is checked before the first
// write, so a rejected pass leaves the arena untouched.
//
// Reference: rand crate documentation (distributions::WeightedIndex)

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::arena::LabelArena;
use crate::data::confusion::{ConfusionMatrix, ConfusionStrategy};
use crate::domain::error::{ensure_probability, NoiseError, NoiseResult};
use crate::domain::provenance::{Provenance, ProvenanceVector};
use crate::domain::sample::{ClassId, Partition, SampleIndex, SplitRole};

/// Which corruption algorithm a dataset uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseModel {
    IndependentRedraw,
    ConfusionMatrix,
}

impl NoiseModel {
    /// True when `strategy` was picked explicitly but this model never
    /// builds a confusion matrix to apply it to
    pub fn ignores_strategy(self, strategy: ConfusionStrategy) -> bool {
        self == NoiseModel::IndependentRedraw && strategy != ConfusionStrategy::default()
    }
}

impl std::str::FromStr for NoiseModel {
    type Err = NoiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "independent_redraw" | "redraw" => Ok(NoiseModel::IndependentRedraw),
            "confusion_matrix" | "matrix"   => Ok(NoiseModel::ConfusionMatrix),
            other => Err(NoiseError::invalid(format!("unknown noise model '{other}'"))),
        }
    }
}

/// What happened to one training sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptionRecord {
    pub sample:     SampleIndex,
    pub original:   ClassId,
    pub assigned:   ClassId,
    pub provenance: Provenance,
}

/// Output of one corruption pass, aligned with the training partition
#[derive(Debug, Clone, PartialEq)]
pub struct CorruptionReport {
    pub provenance: ProvenanceVector,
    pub records:    Vec<CorruptionRecord>,
}

/// A fully validated corruption pass, ready to run
#[derive(Debug, Clone, PartialEq)]
pub enum CorruptionPlan {
    IndependentRedraw { noise_level: f64, n_classes: usize },
    ConfusionMatrix(ConfusionMatrix),
}

impl CorruptionPlan {
    /// Validate arguments and build the matrix if one is needed
    pub fn build(
        model:       NoiseModel,
        strategy:    ConfusionStrategy,
        n_classes:   usize,
        noise_level: f64,
    ) -> NoiseResult<Self> {
        match model {
            NoiseModel::IndependentRedraw => {
                ensure_probability("noise_level", noise_level)?;
                if n_classes == 0 {
                    return Err(NoiseError::invalid("cannot redraw labels over zero classes"));
                }
                if model.ignores_strategy(strategy) {
                    tracing::warn!("Independent redraw has no confusion matrix; {} ignored", strategy);
                }
                Ok(CorruptionPlan::IndependentRedraw { noise_level, n_classes })
            }
            NoiseModel::ConfusionMatrix => Ok(CorruptionPlan::ConfusionMatrix(
                ConfusionMatrix::generate(strategy, n_classes, noise_level)?,
            )),
        }
    }

    pub fn n_classes(&self) -> usize {
        match self {
            CorruptionPlan::IndependentRedraw { n_classes, .. } => *n_classes,
            CorruptionPlan::ConfusionMatrix(m) => m.n_classes(),
        }
    }

    pub fn apply<R: Rng>(
        &self,
        arena:     &mut LabelArena,
        partition: &Partition,
        rng:       &mut R,
    ) -> NoiseResult<CorruptionReport> {
        match self {
            CorruptionPlan::IndependentRedraw { noise_level, .. } => {
                corrupt_independent(arena, partition, *noise_level, rng)
            }
            CorruptionPlan::ConfusionMatrix(matrix) => corrupt_with_matrix(arena, partition, matrix, rng),
        }
    }
}

/// Read the current labels of `partition`, checking that the train
/// role owns every index and every label is a valid class.
fn checked_labels(
    arena:     &LabelArena,
    partition: &Partition,
    n_classes: usize,
) -> NoiseResult<Vec<ClassId>> {
    if arena.num_classes() != n_classes {
        return Err(NoiseError::invalid(format!(
            "store has {} classes but the corruption model expects {n_classes}",
            arena.num_classes()
        )));
    }
    arena.ensure_claimed(SplitRole::Train, partition)?;
    let labels = arena.labels_of(partition)?;
    if let Some((pos, &bad)) = labels.iter().enumerate().find(|(_, l)| **l >= n_classes) {
        return Err(NoiseError::invalid(format!(
            "label {bad} of sample {} is outside [0, {n_classes})",
            partition.indices()[pos]
        )));
    }
    Ok(labels)
}

pub fn corrupt_independent<R: Rng>(
    arena:       &mut LabelArena,
    partition:   &Partition,
    noise_level: f64,
    rng:         &mut R,
) -> NoiseResult<CorruptionReport> {
    ensure_probability("noise_level", noise_level)?;
    let n_classes = arena.num_classes();
    let originals = checked_labels(arena, partition, n_classes)?;

    let mut records = Vec::with_capacity(partition.len());
    for (sample, original) in partition.iter().zip(originals) {
        let (assigned, provenance) = if rng.gen::<f64>() < noise_level {
            let drawn = rng.gen_range(0..n_classes);
            arena.set_label(SplitRole::Train, sample, drawn)?;
            if drawn == original {
                (drawn, Provenance::AccidentallyCorrect)
            } else {
                (drawn, Provenance::Corrupted)
            }
        } else {
            (original, Provenance::Clean)
        };
        records.push(CorruptionRecord { sample, original, assigned, provenance });
    }

    Ok(finish(records, "independent redraw"))
}

pub fn corrupt_with_matrix<R: Rng>(
    arena:     &mut LabelArena,
    partition: &Partition,
    matrix:    &ConfusionMatrix,
    rng:       &mut R,
) -> NoiseResult<CorruptionReport> {
    matrix.validate()?;
    let n_classes = matrix.n_classes();
    let originals = checked_labels(arena, partition, n_classes)?;

    // one categorical sampler per true class
    let samplers = (0..n_classes)
        .map(|class| {
            WeightedIndex::new(matrix.row(class).iter().copied()).map_err(|e| {
                NoiseError::precondition(format!("confusion row {class} cannot be sampled: {e}"))
            })
        })
        .collect::<NoiseResult<Vec<_>>>()?;

    let mut records = Vec::with_capacity(partition.len());
    for (sample, original) in partition.iter().zip(originals) {
        let assigned = samplers[original].sample(rng);
        arena.set_label(SplitRole::Train, sample, assigned)?;
        let provenance = if assigned != original {
            Provenance::Corrupted
        } else {
            Provenance::Clean
        };
        records.push(CorruptionRecord { sample, original, assigned, provenance });
    }

    Ok(finish(records, "confusion matrix"))
}

fn finish(records: Vec<CorruptionRecord>, mode: &str) -> CorruptionReport {
    let provenance = ProvenanceVector::from_entries(records.iter().map(|r| r.provenance).collect());
    tracing::info!("Label corruption ({}): {}", mode, provenance.summary());
    CorruptionReport { provenance, records }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::confusion::FIXED_MAP_FLIPS;
    use crate::data::store::InMemoryStore;
    use crate::domain::image::ImageShape;
    use crate::infra::rng::seeded_rng;

    /// Arena of `n` samples over `classes` classes, all claimed for training
    fn train_arena(n: usize, classes: usize) -> (LabelArena, Partition) {
        let labels = (0..n).map(|i| i % classes).collect();
        let store  = InMemoryStore::new(ImageShape::new(1, 1, 1), classes, vec![0; n], labels).unwrap();
        let mut arena = LabelArena::new(Box::new(store));
        let train = Partition::full(n);
        arena.claim(SplitRole::Train, &train).unwrap();
        (arena, train)
    }

    #[test]
    fn test_zero_noise_leaves_everything_clean() {
        let (mut arena, train) = train_arena(200, 10);
        let before = arena.labels_of(&train).unwrap();
        let report = corrupt_independent(&mut arena, &train, 0.0, &mut seeded_rng(1)).unwrap();
        assert_eq!(report.provenance.count(Provenance::Clean), 200);
        assert_eq!(arena.labels_of(&train).unwrap(), before);
    }

    #[test]
    fn test_full_noise_redraws_every_sample() {
        let (mut arena, train) = train_arena(500, 10);
        let report = corrupt_independent(&mut arena, &train, 1.0, &mut seeded_rng(2)).unwrap();
        assert_eq!(report.provenance.len(), 500);
        assert_eq!(report.provenance.count(Provenance::Clean), 0);
        assert!(report.provenance.count(Provenance::AccidentallyCorrect) > 0);
    }

    #[test]
    fn test_provenance_matches_label_changes() {
        let (mut arena, train) = train_arena(300, 10);
        let before = arena.labels_of(&train).unwrap();
        let report = corrupt_independent(&mut arena, &train, 0.5, &mut seeded_rng(3)).unwrap();
        let after  = arena.labels_of(&train).unwrap();
        for (pos, state) in report.provenance.iter().enumerate() {
            match state {
                Provenance::Corrupted => assert_ne!(before[pos], after[pos]),
                _                     => assert_eq!(before[pos], after[pos]),
            }
        }
    }

    #[test]
    fn test_matrix_mode_uniform_error_rate() {
        let (mut arena, train) = train_arena(10_000, 10);
        let matrix = ConfusionMatrix::uniform_error(10, 0.3).unwrap();
        let report = corrupt_with_matrix(&mut arena, &train, &matrix, &mut seeded_rng(4)).unwrap();
        assert_eq!(report.provenance.count(Provenance::AccidentallyCorrect), 0);
        let rate = report.provenance.corrupted_fraction();
        assert!((rate - 0.3).abs() < 0.03, "corrupted fraction {rate}");
    }

    #[test]
    fn test_matrix_mode_identity_rows_never_change() {
        let (mut arena, train) = train_arena(1000, 10);
        let matrix = ConfusionMatrix::custom_fixed_map(10, 0.5).unwrap();
        let report = corrupt_with_matrix(&mut arena, &train, &matrix, &mut seeded_rng(5)).unwrap();
        for r in &report.records {
            if !FIXED_MAP_FLIPS.iter().any(|&(from, _)| from == r.original) {
                assert_eq!(r.original, r.assigned);
            }
        }
    }

    #[test]
    fn test_out_of_range_label_rejected_before_mutation() {
        let labels = vec![0, 1, 12, 3];
        let store  = InMemoryStore::new(ImageShape::new(1, 1, 1), 10, vec![0; 4], labels.clone()).unwrap();
        let mut arena = LabelArena::new(Box::new(store));
        let train = Partition::full(4);
        arena.claim(SplitRole::Train, &train).unwrap();
        let err = corrupt_independent(&mut arena, &train, 1.0, &mut seeded_rng(6)).unwrap_err();
        assert!(matches!(err, NoiseError::InvalidArgument(_)));
        assert_eq!(arena.labels_of(&train).unwrap(), labels);
    }

    #[test]
    fn test_invalid_noise_level() {
        let (mut arena, train) = train_arena(10, 10);
        assert!(corrupt_independent(&mut arena, &train, 1.1, &mut seeded_rng(7)).is_err());
        assert!(CorruptionPlan::build(NoiseModel::IndependentRedraw, ConfusionStrategy::UniformFlip, 10, -0.1).is_err());
        assert!(CorruptionPlan::build(NoiseModel::ConfusionMatrix, ConfusionStrategy::CustomFixedMap, 7, 0.1).is_err());
    }

    #[test]
    fn test_unclaimed_partition_rejected() {
        let store = InMemoryStore::new(ImageShape::new(1, 1, 1), 2, vec![0; 4], vec![0, 1, 0, 1]).unwrap();
        let mut arena = LabelArena::new(Box::new(store));
        let train = Partition::full(4);
        let err = corrupt_independent(&mut arena, &train, 0.5, &mut seeded_rng(8)).unwrap_err();
        assert!(matches!(err, NoiseError::PreconditionViolation(_)));
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let run = |seed| {
            let (mut arena, train) = train_arena(400, 10);
            let plan = CorruptionPlan::build(NoiseModel::ConfusionMatrix, ConfusionStrategy::UniformFlip, 10, 0.4).unwrap();
            plan.apply(&mut arena, &train, &mut seeded_rng(seed)).unwrap().provenance
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn test_second_pass_drifts_further_from_ground_truth() {
        let (mut arena, train) = train_arena(5000, 10);
        let truth  = arena.labels_of(&train).unwrap();
        let matrix = ConfusionMatrix::uniform_error(10, 0.3).unwrap();
        let mut rng = seeded_rng(10);

        let diverged = |labels: &[usize]| labels.iter().zip(&truth).filter(|(a, b)| a != b).count();

        corrupt_with_matrix(&mut arena, &train, &matrix, &mut rng).unwrap();
        let single = diverged(&arena.labels_of(&train).unwrap());

        corrupt_with_matrix(&mut arena, &train, &matrix, &mut rng).unwrap();
        let double = diverged(&arena.labels_of(&train).unwrap());

        // ≈30% after one pass, ≈50% after two
        assert!(single > 1200 && single < 1800, "single pass diverged {single}");
        assert!(double > single + 500, "double pass diverged {double}");
    }

    #[test]
    fn test_redraw_ignores_non_default_strategy() {
        assert!(NoiseModel::IndependentRedraw.ignores_strategy(ConfusionStrategy::UniformError));
        assert!(!NoiseModel::IndependentRedraw.ignores_strategy(ConfusionStrategy::UniformFlip));
        assert!(!NoiseModel::ConfusionMatrix.ignores_strategy(ConfusionStrategy::UniformError));

        // the plan is still a plain redraw
        let plan = CorruptionPlan::build(NoiseModel::IndependentRedraw, ConfusionStrategy::UniformError, 10, 0.2)
            .unwrap();
        assert_eq!(plan, CorruptionPlan::IndependentRedraw { noise_level: 0.2, n_classes: 10 });
    }
}
