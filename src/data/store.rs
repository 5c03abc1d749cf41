// ============================================================
// Layer 4 — Dataset Stores
// ============================================================
// Two concrete DatasetStore implementations:
//
//   InMemoryStore — every image and label held in two flat Vecs.
//                   Used for MNIST, CIFAR-10 and synthetic data.
//
//   FileListStore — (path, label) pairs read from an annotation
//                   list; images are decoded from disk on demand
//                   with the `image` crate and resized to a fixed
//                   square. Used for Clothing1M.
//
// Pixels are always returned in CHW order.
//
// Reference: Rust Book §17 (Trait Objects)
//            image crate documentation

use std::path::PathBuf;

use image::imageops::FilterType;

use crate::domain::error::{NoiseError, NoiseResult};
use crate::domain::image::ImageShape;
use crate::domain::sample::{ClassId, SampleIndex};
use crate::domain::traits::DatasetStore;

fn out_of_bounds(index: SampleIndex, len: usize) -> NoiseError {
    NoiseError::precondition(format!(
        "sample index {index} is out of bounds for a store of {len} samples"
    ))
}

// ─── InMemoryStore ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct InMemoryStore {
    shape:       ImageShape,
    num_classes: usize,
    /// All images back to back, `shape.pixel_count()` bytes each
    pixels:      Vec<u8>,
    labels:      Vec<ClassId>,
}

impl InMemoryStore {
    /// Labels are not range-checked here; the corruptor rejects
    /// out-of-range labels before it mutates anything.
    pub fn new(
        shape:       ImageShape,
        num_classes: usize,
        pixels:      Vec<u8>,
        labels:      Vec<ClassId>,
    ) -> NoiseResult<Self> {
        if num_classes == 0 {
            return Err(NoiseError::invalid("a store needs at least one class"));
        }
        if shape.pixel_count() == 0 {
            return Err(NoiseError::invalid("image shape has a zero dimension"));
        }
        if pixels.len() != labels.len() * shape.pixel_count() {
            return Err(NoiseError::invalid(format!(
                "{} pixel bytes do not match {} labels of shape {:?}",
                pixels.len(),
                labels.len(),
                shape.dims()
            )));
        }
        Ok(Self { shape, num_classes, pixels, labels })
    }

    pub fn labels(&self) -> &[ClassId] {
        &self.labels
    }

    fn image_range(&self, index: SampleIndex) -> NoiseResult<std::ops::Range<usize>> {
        if index >= self.labels.len() {
            return Err(out_of_bounds(index, self.labels.len()));
        }
        let size = self.shape.pixel_count();
        Ok(index * size..(index + 1) * size)
    }
}

impl DatasetStore for InMemoryStore {
    fn len(&self) -> usize {
        self.labels.len()
    }

    fn shape(&self) -> ImageShape {
        self.shape
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn label_at(&self, index: SampleIndex) -> NoiseResult<ClassId> {
        self.labels
            .get(index)
            .copied()
            .ok_or_else(|| out_of_bounds(index, self.labels.len()))
    }

    fn image_at(&self, index: SampleIndex) -> NoiseResult<Vec<u8>> {
        let range = self.image_range(index)?;
        Ok(self.pixels[range].to_vec())
    }

    fn set_label(&mut self, index: SampleIndex, label: ClassId) -> NoiseResult<()> {
        let len  = self.labels.len();
        let slot = self.labels.get_mut(index).ok_or_else(|| out_of_bounds(index, len))?;
        *slot = label;
        Ok(())
    }

    fn set_image(&mut self, index: SampleIndex, pixels: Vec<u8>) -> NoiseResult<()> {
        let range = self.image_range(index)?;
        if pixels.len() != range.len() {
            return Err(NoiseError::invalid(format!(
                "replacement image has {} bytes, expected {}",
                pixels.len(),
                range.len()
            )));
        }
        self.pixels[range].copy_from_slice(&pixels);
        Ok(())
    }
}

// ─── FileListStore ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FileListStore {
    entries:     Vec<(PathBuf, ClassId)>,
    num_classes: usize,
    /// Every decoded image is resized to `side × side` RGB
    side:        u32,
}

impl FileListStore {
    pub fn new(entries: Vec<(PathBuf, ClassId)>, num_classes: usize, side: u32) -> Self {
        Self { entries, num_classes, side }
    }

    pub fn path_at(&self, index: SampleIndex) -> NoiseResult<&PathBuf> {
        self.entries
            .get(index)
            .map(|(path, _)| path)
            .ok_or_else(|| out_of_bounds(index, self.entries.len()))
    }
}

impl DatasetStore for FileListStore {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn shape(&self) -> ImageShape {
        ImageShape::new(3, self.side as usize, self.side as usize)
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn label_at(&self, index: SampleIndex) -> NoiseResult<ClassId> {
        self.entries
            .get(index)
            .map(|(_, label)| *label)
            .ok_or_else(|| out_of_bounds(index, self.entries.len()))
    }

    fn image_at(&self, index: SampleIndex) -> NoiseResult<Vec<u8>> {
        let path = self.path_at(index)?;
        let rgb  = image::open(path)
            .map_err(|e| NoiseError::unavailable(path.display(), e))?
            .resize_exact(self.side, self.side, FilterType::Triangle)
            .to_rgb8();

        // HWC (interleaved RGB) → CHW planes
        let plane = (self.side * self.side) as usize;
        let mut chw = vec![0u8; 3 * plane];
        for (p, pixel) in rgb.pixels().enumerate() {
            for c in 0..3 {
                chw[c * plane + p] = pixel[c];
            }
        }
        Ok(chw)
    }

    fn set_label(&mut self, index: SampleIndex, label: ClassId) -> NoiseResult<()> {
        let len  = self.entries.len();
        let slot = self.entries.get_mut(index).ok_or_else(|| out_of_bounds(index, len))?;
        slot.1 = label;
        Ok(())
    }

    fn set_image(&mut self, _index: SampleIndex, _pixels: Vec<u8>) -> NoiseResult<()> {
        Err(NoiseError::precondition(
            "images of a file-list store live on disk and cannot be rewritten",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> InMemoryStore {
        let shape = ImageShape::new(1, 2, 2);
        InMemoryStore::new(shape, 3, (0..12).collect(), vec![0, 1, 2]).unwrap()
    }

    #[test]
    fn test_image_and_label_access() {
        let store = tiny();
        assert_eq!(store.len(), 3);
        assert_eq!(store.image_at(1).unwrap(), vec![4, 5, 6, 7]);
        assert_eq!(store.label_at(2).unwrap(), 2);
        assert!(store.label_at(3).is_err());
    }

    #[test]
    fn test_mutation_is_visible() {
        let mut store = tiny();
        store.set_label(0, 2).unwrap();
        store.set_image(0, vec![9; 4]).unwrap();
        assert_eq!(store.label_at(0).unwrap(), 2);
        assert_eq!(store.image_at(0).unwrap(), vec![9; 4]);
        assert!(store.set_image(0, vec![1; 3]).is_err());
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let shape = ImageShape::new(1, 2, 2);
        assert!(InMemoryStore::new(shape, 3, vec![0; 7], vec![0, 1]).is_err());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let store = FileListStore::new(vec![(PathBuf::from("/nonexistent/x.jpg"), 1)], 14, 8);
        assert_eq!(store.label_at(0).unwrap(), 1);
        assert!(matches!(
            store.image_at(0),
            Err(NoiseError::ResourceUnavailable { .. })
        ));
        let mut store = store;
        assert!(store.set_image(0, vec![]).is_err());
    }
}
