// ============================================================
// Layer 4 — Training Subsampler
// ============================================================
// Restricts a partition to `count` distinct entries drawn without
// replacement. The result keeps the positions that were picked so
// anything aligned with the original partition (a provenance
// vector, for instance) can be filtered the same way instead of
// being recomputed.
//
// Reference: rand crate documentation (seq::index::sample)

use rand::Rng;

use crate::domain::error::{NoiseError, NoiseResult};
use crate::domain::provenance::ProvenanceVector;
use crate::domain::sample::Partition;
use crate::infra::rng::seeded_rng;

/// A subsampled partition plus the positions (into the source
/// partition) that were kept, in draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct Subsample {
    pub partition: Partition,
    pub positions: Vec<usize>,
}

pub fn subsample<R: Rng>(partition: &Partition, count: usize, rng: &mut R) -> NoiseResult<Subsample> {
    if count > partition.len() {
        return Err(NoiseError::invalid(format!(
            "cannot draw {count} examples from a partition of {}",
            partition.len()
        )));
    }

    let positions = rand::seq::index::sample(rng, partition.len(), count).into_vec();
    let picked    = partition.select(&positions)?;

    tracing::debug!("Subsampled {} of {} training examples", count, partition.len());
    Ok(Subsample { partition: picked, positions })
}

/// [`subsample`] with a generator of its own
pub fn subsample_seeded(partition: &Partition, count: usize, seed: u64) -> NoiseResult<Subsample> {
    let mut rng = seeded_rng(seed);
    subsample(partition, count, &mut rng)
}

/// Subsample a partition that has already been corrupted, filtering
/// its provenance vector with the same positions.
pub fn subsample_with_provenance<R: Rng>(
    partition:  &Partition,
    provenance: &ProvenanceVector,
    count:      usize,
    rng:        &mut R,
) -> NoiseResult<(Partition, ProvenanceVector)> {
    if provenance.len() != partition.len() {
        return Err(NoiseError::precondition(format!(
            "provenance has {} entries but the partition has {} samples",
            provenance.len(),
            partition.len()
        )));
    }
    let sub  = subsample(partition, count, rng)?;
    let prov = provenance.select(&sub.positions)?;
    Ok((sub.partition, prov))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provenance::Provenance;
    use std::collections::HashSet;

    fn part(n: usize) -> Partition {
        Partition::new((100..100 + n).collect()).unwrap()
    }

    #[test]
    fn test_subset_of_requested_size() {
        let p   = part(50);
        let sub = subsample_seeded(&p, 20, 1).unwrap();
        assert_eq!(sub.partition.len(), 20);
        let all: HashSet<usize> = p.iter().collect();
        assert!(sub.partition.iter().all(|i| all.contains(&i)));
    }

    #[test]
    fn test_full_count_is_set_equal() {
        let p   = part(30);
        let sub = subsample_seeded(&p, 30, 5).unwrap();
        let a: HashSet<usize> = p.iter().collect();
        let b: HashSet<usize> = sub.partition.iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_many_is_invalid() {
        let p = part(3);
        assert!(matches!(subsample_seeded(&p, 4, 0), Err(NoiseError::InvalidArgument(_))));
    }

    #[test]
    fn test_provenance_follows_positions() {
        let p = part(6);
        let prov = ProvenanceVector::from_entries(vec![
            Provenance::Clean,
            Provenance::Corrupted,
            Provenance::Clean,
            Provenance::AccidentallyCorrect,
            Provenance::Clean,
            Provenance::Corrupted,
        ]);
        let mut rng = seeded_rng(11);
        let (sub, sub_prov) = subsample_with_provenance(&p, &prov, 4, &mut rng).unwrap();
        assert_eq!(sub.len(), 4);
        for (pos, idx) in sub.iter().enumerate() {
            // partition index 100 + k carries provenance entry k
            assert_eq!(sub_prov.get(pos), prov.get(idx - 100));
        }

        let short = ProvenanceVector::all_clean(2);
        assert!(subsample_with_provenance(&p, &short, 1, &mut rng).is_err());
    }
}
