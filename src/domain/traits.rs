// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// DatasetStore is the boundary between the noisy-label core and
// whatever actually holds images on disk or in memory.
//
// Implementations (Layer 4, data/store.rs):
//   - InMemoryStore  → MNIST, CIFAR-10 and synthetic data
//   - FileListStore  → Clothing1M annotation lists, decoded lazily
//
// The core only reads and writes through this trait, so adding a
// dataset means adding one more implementation, never touching
// the splitter or corruptor.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::error::NoiseResult;
use crate::domain::image::ImageShape;
use crate::domain::sample::{ClassId, SampleIndex};

/// Images plus mutable labels, addressed by SampleIndex.
///
/// Images are returned as flat CHW `u8` buffers matching `shape()`.
/// A label written with `set_label` must be visible to every reader
/// of the store afterwards.
pub trait DatasetStore: Send + Sync {
    /// Number of samples in the store
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape of every image in the store
    fn shape(&self) -> ImageShape;

    /// Number of label classes
    fn num_classes(&self) -> usize;

    fn label_at(&self, index: SampleIndex) -> NoiseResult<ClassId>;

    fn image_at(&self, index: SampleIndex) -> NoiseResult<Vec<u8>>;

    fn set_label(&mut self, index: SampleIndex, label: ClassId) -> NoiseResult<()>;

    /// Overwrite an image in place. Stores backed by files on disk
    /// may refuse with `PreconditionViolation`.
    fn set_image(&mut self, index: SampleIndex, pixels: Vec<u8>) -> NoiseResult<()>;
}
