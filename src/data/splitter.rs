// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Produces a reproducible, disjoint train/validation partition
// of `[0, n_samples)`:
//
//   1. seed a StdRng (or take the caller's shared one)
//   2. train_count = floor((1 - val_ratio) * n_samples)
//   3. shuffle [0, n_samples) with Fisher-Yates
//   4. first train_count entries → train, the rest → validation
//
// Every call site goes through `split_with_rng`, so the same
// (n_samples, val_ratio, seed) always yields the same partitions.
//
// Reference: Rust Book §8 (Vectors)
//            rand crate documentation (SliceRandom)

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::error::{ensure_probability, NoiseError, NoiseResult};
use crate::domain::sample::Partition;
use crate::infra::rng::seeded_rng;

/// Split `n_samples` indices into (train, validation) with a fresh
/// generator seeded from `seed`.
pub fn split(n_samples: usize, val_ratio: f64, seed: u64) -> NoiseResult<(Partition, Partition)> {
    let mut rng = seeded_rng(seed);
    split_with_rng(n_samples, val_ratio, &mut rng)
}

/// Same as [`split`], drawing the permutation from the caller's
/// generator so later pipeline steps continue the same stream.
pub fn split_with_rng<R: Rng>(
    n_samples: usize,
    val_ratio: f64,
    rng:       &mut R,
) -> NoiseResult<(Partition, Partition)> {
    if n_samples == 0 {
        return Err(NoiseError::invalid("cannot split an empty dataset"));
    }
    ensure_probability("val_ratio", val_ratio)?;

    let train_count = (((1.0 - val_ratio) * n_samples as f64).floor() as usize).min(n_samples);

    let mut perm: Vec<usize> = (0..n_samples).collect();
    perm.shuffle(rng);

    // split_off(n) leaves [0..n) in `perm` and returns [n..len)
    let val = perm.split_off(train_count);

    tracing::debug!(
        "Dataset split: {} training, {} validation (val_ratio={})",
        perm.len(),
        val.len(),
        val_ratio,
    );

    Ok((Partition::from_unique(perm), Partition::from_unique(val)))
}
