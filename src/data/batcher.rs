// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to stack LabeledImages into
// tensors a training loop can consume.
//
//   Input:  N LabeledImages, each a flat CHW Vec<f32>
//   Output: ImageBatch with images [N, C, H, W] and labels [N]
//
// All images of a dataset share one shape, so the flat pixels are
// concatenated and reshaped in one go.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::LabeledImage;
use crate::domain::image::ImageShape;
use crate::domain::sample::SampleIndex;

// ─── ImageBatch ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Normalised images — shape: [batch_size, channels, height, width]
    pub images: Tensor<B, 4>,

    /// Current (possibly noisy) labels — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,

    /// Store index of each row, so provenance can be looked up later
    pub indices: Vec<SampleIndex>,
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
    shape:      ImageShape,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device, shape: ImageShape) -> Self {
        Self { device, shape }
    }
}

impl<B: Backend> Batcher<LabeledImage, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<LabeledImage>) -> ImageBatch<B> {
        let [c, h, w]  = self.shape.dims();
        let batch_size = items.len();

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.pixels.iter().copied())
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|s| s.label as i32)
            .collect();

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([batch_size, c, h, w]);

        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ImageBatch {
            images,
            labels,
            indices: items.iter().map(|s| s.index).collect(),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn item(index: usize, label: usize, fill: f32) -> LabeledImage {
        let shape = ImageShape::new(1, 2, 2);
        LabeledImage { index, pixels: vec![fill; shape.pixel_count()], label, shape }
    }

    #[test]
    fn test_batch_shapes() {
        let device  = Default::default();
        let batcher = ImageBatcher::<TestBackend>::new(device, ImageShape::new(1, 2, 2));
        let batch   = batcher.batch(vec![item(5, 1, 0.5), item(9, 3, -0.5), item(2, 0, 0.0)]);

        assert_eq!(batch.images.dims(), [3, 1, 2, 2]);
        assert_eq!(batch.labels.dims(), [3]);
        assert_eq!(batch.indices, vec![5, 9, 2]);
    }

    #[test]
    fn test_batch_keeps_labels() {
        let device  = Default::default();
        let batcher = ImageBatcher::<TestBackend>::new(device, ImageShape::new(1, 2, 2));
        let batch   = batcher.batch(vec![item(0, 4, 0.0), item(1, 7, 0.0)]);

        let labels: Vec<i64> = batch.labels.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(labels, vec![4, 7]);
    }
}
