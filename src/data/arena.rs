// ============================================================
// Layer 4 — Label Arena
// ============================================================
// One canonical owner of a DatasetStore, with a claim table that
// records which split every SampleIndex belongs to.
//
//   claims[i] = None             → index not used by any split
//   claims[i] = Some(Train)      → only the train split may mutate i
//   claims[i] = Some(Validation) → ...
//
// Rules:
//   - a partition must be claimed before its labels are mutated
//   - claiming an index already held by another role fails
//   - mutation through role R on an index not claimed by R fails
//
// After assembly the arena is frozen behind an Arc and shared
// read-only by the train and validation datasets.
//
// Reference: Rust Book §15 (Smart Pointers), §16 (Shared State)

use serde::{Deserialize, Serialize};

use crate::domain::error::{NoiseError, NoiseResult};
use crate::domain::image::ImageShape;
use crate::domain::sample::{ClassId, Partition, SampleIndex, SplitRole};
use crate::domain::traits::DatasetStore;

pub struct LabelArena {
    store:  Box<dyn DatasetStore>,
    claims: Vec<Option<SplitRole>>,
}

/// A copy of the labels of one partition, taken before corruption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSnapshot {
    partition: Partition,
    labels:    Vec<ClassId>,
}

impl LabelSnapshot {
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Labels in partition order
    pub fn labels(&self) -> &[ClassId] {
        &self.labels
    }
}

impl LabelArena {
    pub fn new(store: Box<dyn DatasetStore>) -> Self {
        let claims = vec![None; store.len()];
        Self { store, claims }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn shape(&self) -> ImageShape {
        self.store.shape()
    }

    pub fn num_classes(&self) -> usize {
        self.store.num_classes()
    }

    pub fn role_of(&self, index: SampleIndex) -> Option<SplitRole> {
        self.claims.get(index).copied().flatten()
    }

    /// Reserve every index of `partition` for `role`.
    /// Nothing is recorded unless the whole partition can be claimed.
    pub fn claim(&mut self, role: SplitRole, partition: &Partition) -> NoiseResult<()> {
        for idx in partition.iter() {
            match self.claims.get(idx) {
                None => {
                    return Err(NoiseError::precondition(format!(
                        "{role} partition holds index {idx}, store has {} samples",
                        self.claims.len()
                    )))
                }
                Some(Some(other)) if *other != role => {
                    return Err(NoiseError::precondition(format!(
                        "index {idx} is already claimed by the {other} partition; \
                         {role} may not overlap it"
                    )))
                }
                Some(_) => {}
            }
        }
        for idx in partition.iter() {
            self.claims[idx] = Some(role);
        }
        tracing::debug!("Claimed {} indices for {}", partition.len(), role);
        Ok(())
    }

    /// Fail unless every index of `partition` is claimed by `role`
    pub fn ensure_claimed(&self, role: SplitRole, partition: &Partition) -> NoiseResult<()> {
        for idx in partition.iter() {
            self.ensure_owner(role, idx)?;
        }
        Ok(())
    }

    fn ensure_owner(&self, role: SplitRole, index: SampleIndex) -> NoiseResult<()> {
        match self.role_of(index) {
            Some(owner) if owner == role => Ok(()),
            Some(owner) => Err(NoiseError::precondition(format!(
                "index {index} belongs to the {owner} partition, not {role}"
            ))),
            None if index >= self.claims.len() => Err(NoiseError::precondition(format!(
                "sample index {index} is out of bounds for a store of {} samples",
                self.claims.len()
            ))),
            None => Err(NoiseError::precondition(format!(
                "index {index} has not been claimed by the {role} partition"
            ))),
        }
    }

    pub fn label_at(&self, index: SampleIndex) -> NoiseResult<ClassId> {
        self.store.label_at(index)
    }

    pub fn image_at(&self, index: SampleIndex) -> NoiseResult<Vec<u8>> {
        self.store.image_at(index)
    }

    /// Labels of `partition`, in partition order
    pub fn labels_of(&self, partition: &Partition) -> NoiseResult<Vec<ClassId>> {
        partition.iter().map(|idx| self.store.label_at(idx)).collect()
    }

    pub fn set_label(&mut self, role: SplitRole, index: SampleIndex, label: ClassId) -> NoiseResult<()> {
        self.ensure_owner(role, index)?;
        if label >= self.num_classes() {
            return Err(NoiseError::invalid(format!(
                "label {label} is outside [0, {})",
                self.num_classes()
            )));
        }
        self.store.set_label(index, label)
    }

    pub fn set_image(&mut self, role: SplitRole, index: SampleIndex, pixels: Vec<u8>) -> NoiseResult<()> {
        self.ensure_owner(role, index)?;
        self.store.set_image(index, pixels)
    }

    pub fn snapshot_labels(&self, partition: &Partition) -> NoiseResult<LabelSnapshot> {
        Ok(LabelSnapshot {
            partition: partition.clone(),
            labels:    self.labels_of(partition)?,
        })
    }

    /// Write a snapshot back through `role`, undoing any corruption
    /// applied since it was taken.
    pub fn restore_labels(&mut self, role: SplitRole, snapshot: &LabelSnapshot) -> NoiseResult<()> {
        self.ensure_claimed(role, &snapshot.partition)?;
        for (idx, &label) in snapshot.partition.iter().zip(&snapshot.labels) {
            self.store.set_label(idx, label)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for LabelArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelArena")
            .field("len", &self.len())
            .field("shape", &self.shape())
            .field("num_classes", &self.num_classes())
            .finish()
    }
}
