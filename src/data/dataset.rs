// ============================================================
// Layer 4 — Labeled Dataset
// ============================================================
// A view of one split: the shared arena, the partition it owns,
// the dataset name and the normalisation statistics. Item i of
// the view is sample `partition[i]` of the arena, normalised.
//
// Train, validation and test views of the same source share one
// Arc<LabelArena>, so a label written during corruption is what
// every view reads afterwards.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

use std::sync::Arc;

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::arena::LabelArena;
use crate::data::transforms::normalize;
use crate::domain::error::{NoiseError, NoiseResult};
use crate::domain::image::{ImageShape, NormalizationStats};
use crate::domain::sample::{ClassId, Partition, SampleIndex, SplitRole};

/// One normalised sample, ready for batching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledImage {
    /// Position of the sample in the underlying store
    pub index:  SampleIndex,
    /// CHW values after per-channel normalisation
    pub pixels: Vec<f32>,
    pub label:  ClassId,
    pub shape:  ImageShape,
}

#[derive(Debug, Clone)]
pub struct LabeledDataset {
    storage:      Arc<LabelArena>,
    partition:    Partition,
    dataset_name: String,
    statistics:   NormalizationStats,
    role:         SplitRole,
    augmentation: bool,
}

impl LabeledDataset {
    /// The arena must already hold a claim for `role` over `partition`.
    pub fn new(
        storage:      Arc<LabelArena>,
        partition:    Partition,
        role:         SplitRole,
        dataset_name: impl Into<String>,
        statistics:   NormalizationStats,
    ) -> NoiseResult<Self> {
        storage.ensure_claimed(role, &partition)?;
        if statistics.channels() != storage.shape().channels {
            return Err(NoiseError::invalid(format!(
                "statistics cover {} channels but images have {}",
                statistics.channels(),
                storage.shape().channels
            )));
        }
        Ok(Self {
            storage,
            partition,
            dataset_name: dataset_name.into(),
            statistics,
            role,
            augmentation: false,
        })
    }

    /// Mark the view as one that training should augment
    pub fn with_augmentation(mut self, enabled: bool) -> Self {
        self.augmentation = enabled;
        self
    }

    pub fn sample_count(&self) -> usize {
        self.partition.len()
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    pub fn statistics(&self) -> &NormalizationStats {
        &self.statistics
    }

    pub fn role(&self) -> SplitRole {
        self.role
    }

    pub fn augmentation(&self) -> bool {
        self.augmentation
    }

    pub fn shape(&self) -> ImageShape {
        self.storage.shape()
    }

    pub fn num_classes(&self) -> usize {
        self.storage.num_classes()
    }

    /// Current labels of the view, in partition order
    pub fn labels(&self) -> NoiseResult<Vec<ClassId>> {
        self.storage.labels_of(&self.partition)
    }

    /// Load and normalise the sample at `position` within the view
    pub fn at(&self, position: usize) -> NoiseResult<LabeledImage> {
        let index = self.partition.get(position).ok_or_else(|| {
            NoiseError::invalid(format!(
                "position {position} is outside a {} view of {} samples",
                self.role,
                self.partition.len()
            ))
        })?;
        let shape  = self.storage.shape();
        let raw    = self.storage.image_at(index)?;
        let pixels = normalize(&raw, shape, &self.statistics)?;
        Ok(LabeledImage { index, pixels, label: self.storage.label_at(index)?, shape })
    }
}

impl Dataset<LabeledImage> for LabeledDataset {
    /// `None` only past the end of the view.
    ///
    /// # Panics
    ///
    /// If an in-range sample cannot be read. Burn's iterators stop at
    /// the first `None`, so a failed read may not be reported as one.
    /// Use [`LabeledDataset::at`] to handle the error instead.
    fn get(&self, index: usize) -> Option<LabeledImage> {
        if index >= self.partition.len() {
            return None;
        }
        match self.at(index) {
            Ok(item) => Some(item),
            Err(e) => panic!("cannot read {} sample {} of '{}': {}", self.role, index, self.dataset_name, e),
        }
    }

    fn len(&self) -> usize {
        self.partition.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::{FileListStore, InMemoryStore};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn arena() -> LabelArena {
        let shape  = ImageShape::new(1, 2, 2);
        let pixels = (0..4 * 6).map(|p| (p * 10) as u8).collect();
        let store  = InMemoryStore::new(shape, 3, pixels, vec![0, 1, 2, 0, 1, 2]).unwrap();
        LabelArena::new(Box::new(store))
    }

    fn stats() -> NormalizationStats {
        NormalizationStats::new(vec![0.0], vec![1.0]).unwrap()
    }

    #[test]
    fn test_view_reads_partition_order() {
        let mut arena = arena();
        let part = Partition::new(vec![4, 1]).unwrap();
        arena.claim(SplitRole::Validation, &part).unwrap();

        let ds = LabeledDataset::new(Arc::new(arena), part, SplitRole::Validation, "toy", stats()).unwrap();
        assert_eq!(ds.len(), 2);
        let first = ds.get(0).unwrap();
        assert_eq!(first.index, 4);
        assert_eq!(first.label, 1);
        assert!((first.pixels[0] - 160.0 / 255.0).abs() < 1e-6);
        assert!(ds.get(2).is_none());

        let (mean, std) = ds.statistics().as_pair();
        assert_eq!((mean, std), (&[0.0f32][..], &[1.0f32][..]));
    }

    #[test]
    fn test_unclaimed_view_is_rejected() {
        let arena = arena();
        let part  = Partition::new(vec![0]).unwrap();
        assert!(LabeledDataset::new(Arc::new(arena), part, SplitRole::Train, "toy", stats()).is_err());
    }

    #[test]
    fn test_channel_mismatch_is_rejected() {
        let mut arena = arena();
        let part = Partition::new(vec![0]).unwrap();
        arena.claim(SplitRole::Train, &part).unwrap();
        let rgb = NormalizationStats::new(vec![0.5; 3], vec![0.2; 3]).unwrap();
        assert!(LabeledDataset::new(Arc::new(arena), part, SplitRole::Train, "toy", rgb).is_err());
    }

    /// Four-image file-list view; `missing` names an entry left off disk
    fn file_view(dir: &std::path::Path, missing: Option<usize>) -> LabeledDataset {
        let entries: Vec<(PathBuf, ClassId)> = (0..4)
            .map(|i| {
                let path = dir.join(format!("img{i}.png"));
                if missing != Some(i) {
                    image::RgbImage::from_pixel(4, 4, image::Rgb([i as u8 * 40, 0, 0])).save(&path).unwrap();
                }
                (path, i + 1)
            })
            .collect();
        let mut arena = LabelArena::new(Box::new(FileListStore::new(entries, 14, 4)));
        let part = Partition::full(4);
        arena.claim(SplitRole::Train, &part).unwrap();
        let rgb = NormalizationStats::new(vec![0.5; 3], vec![0.25; 3]).unwrap();
        LabeledDataset::new(Arc::new(arena), part, SplitRole::Train, "clothing1M", rgb).unwrap()
    }

    #[test]
    fn test_iteration_visits_every_file() {
        let dir = tempdir().unwrap();
        let ds  = file_view(dir.path(), None);
        let labels: Vec<ClassId> = ds.iter().map(|item| item.label).collect();
        assert_eq!(labels, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_missing_file_is_reported_not_truncated() {
        let dir = tempdir().unwrap();
        let ds  = file_view(dir.path(), Some(1));
        assert!(ds.at(0).is_ok());
        assert!(matches!(ds.at(1), Err(NoiseError::ResourceUnavailable { .. })));
        assert!(ds.at(2).is_ok());
    }

    #[test]
    #[should_panic(expected = "cannot read train sample 1")]
    fn test_iteration_stops_loudly_on_missing_file() {
        let dir = tempdir().unwrap();
        let ds  = file_view(dir.path(), Some(1));
        let _ = ds.iter().count();
    }
}
