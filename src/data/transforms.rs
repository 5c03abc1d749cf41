// ============================================================
// Layer 4 — Image Transforms
// ============================================================
// Pixel-level operations used by the assembler and by training
// code consuming its output:
//
//   remove_random_chunks — tile the image into 4×4 patches and
//                          zero each patch with probability `prob`
//                          (all channels at once)
//   normalize            — u8 CHW → f32, (x/255 − mean[c]) / std[c]
//   revert_normalization — the inverse, back to the [0, 1] scale
//
// Reference: Rust Book §13 (Iterators)

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::error::{ensure_probability, NoiseError, NoiseResult};
use crate::domain::image::{ImageShape, NormalizationStats};

/// Side length of the square patches removed by `remove_random_chunks`
pub const CHUNK_SIZE: usize = 4;

/// Image modifications applied once, in place, at assembly time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageTransform {
    RemoveRandomChunks { prob: f64 },
}

impl ImageTransform {
    pub fn validate(&self) -> NoiseResult<()> {
        match self {
            ImageTransform::RemoveRandomChunks { prob } => ensure_probability("remove_prob", *prob),
        }
    }

    pub fn apply<R: Rng>(&self, pixels: &mut [u8], shape: ImageShape, rng: &mut R) -> NoiseResult<()> {
        match self {
            ImageTransform::RemoveRandomChunks { prob } => remove_random_chunks(pixels, shape, *prob, rng),
        }
    }
}

pub fn remove_random_chunks<R: Rng>(
    pixels: &mut [u8],
    shape:  ImageShape,
    prob:   f64,
    rng:    &mut R,
) -> NoiseResult<()> {
    ensure_probability("remove_prob", prob)?;
    if shape.height % CHUNK_SIZE != 0 || shape.width % CHUNK_SIZE != 0 {
        return Err(NoiseError::invalid(format!(
            "image of {}×{} cannot be tiled into {CHUNK_SIZE}×{CHUNK_SIZE} patches",
            shape.height, shape.width
        )));
    }
    check_len(pixels.len(), shape)?;

    let rows = shape.height / CHUNK_SIZE;
    let cols = shape.width / CHUNK_SIZE;

    // draw the whole patch grid first, row-major
    let removed: Vec<bool> = (0..rows * cols).map(|_| rng.gen::<f64>() < prob).collect();

    let plane = shape.plane_len();
    for (patch, _) in removed.iter().enumerate().filter(|(_, r)| **r) {
        let (pi, pj) = (patch / cols, patch % cols);
        for c in 0..shape.channels {
            for y in pi * CHUNK_SIZE..(pi + 1) * CHUNK_SIZE {
                let start = c * plane + y * shape.width + pj * CHUNK_SIZE;
                pixels[start..start + CHUNK_SIZE].fill(0);
            }
        }
    }
    Ok(())
}

pub fn normalize(pixels: &[u8], shape: ImageShape, stats: &NormalizationStats) -> NoiseResult<Vec<f32>> {
    check_len(pixels.len(), shape)?;
    check_channels(shape, stats)?;
    let plane = shape.plane_len();
    Ok(pixels
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let c = i / plane;
            (p as f32 / 255.0 - stats.mean()[c]) / stats.std()[c]
        })
        .collect())
}

/// Undo [`normalize`], returning values on the [0, 1] scale
pub fn revert_normalization(
    values: &[f32],
    shape:  ImageShape,
    stats:  &NormalizationStats,
) -> NoiseResult<Vec<f32>> {
    check_len(values.len(), shape)?;
    check_channels(shape, stats)?;
    let plane = shape.plane_len();
    Ok(values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let c = i / plane;
            v * stats.std()[c] + stats.mean()[c]
        })
        .collect())
}

fn check_len(len: usize, shape: ImageShape) -> NoiseResult<()> {
    if len != shape.pixel_count() {
        return Err(NoiseError::invalid(format!(
            "buffer of {len} values does not match shape {:?}",
            shape.dims()
        )));
    }
    Ok(())
}

fn check_channels(shape: ImageShape, stats: &NormalizationStats) -> NoiseResult<()> {
    if shape.channels != stats.channels() {
        return Err(NoiseError::invalid(format!(
            "image has {} channels but statistics cover {}",
            shape.channels,
            stats.channels()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::rng::seeded_rng;

    #[test]
    fn test_remove_all_chunks() {
        let shape = ImageShape::new(3, 8, 8);
        let mut px = vec![200u8; shape.pixel_count()];
        remove_random_chunks(&mut px, shape, 1.0, &mut seeded_rng(0)).unwrap();
        assert!(px.iter().all(|&p| p == 0));
    }

    #[test]
    fn test_remove_no_chunks() {
        let shape = ImageShape::new(1, 8, 8);
        let mut px = vec![7u8; shape.pixel_count()];
        remove_random_chunks(&mut px, shape, 0.0, &mut seeded_rng(0)).unwrap();
        assert!(px.iter().all(|&p| p == 7));
    }

    #[test]
    fn test_removed_pixels_form_whole_patches() {
        let shape = ImageShape::new(1, 8, 8);
        let mut px = vec![1u8; shape.pixel_count()];
        remove_random_chunks(&mut px, shape, 0.5, &mut seeded_rng(21)).unwrap();
        for pi in 0..2 {
            for pj in 0..2 {
                let first = px[pi * 4 * 8 + pj * 4];
                for y in 0..4 {
                    for x in 0..4 {
                        assert_eq!(px[(pi * 4 + y) * 8 + pj * 4 + x], first);
                    }
                }
            }
        }
    }

    #[test]
    fn test_untileable_shape_rejected() {
        let shape = ImageShape::new(1, 6, 8);
        let mut px = vec![0u8; shape.pixel_count()];
        assert!(remove_random_chunks(&mut px, shape, 0.5, &mut seeded_rng(0)).is_err());
    }

    #[test]
    fn test_normalize_then_revert() {
        let shape = ImageShape::new(3, 1, 2);
        let stats = NormalizationStats::new(vec![0.485, 0.456, 0.406], vec![0.229, 0.224, 0.225]).unwrap();
        let px    = vec![0u8, 255, 128, 64, 32, 16];
        let norm  = normalize(&px, shape, &stats).unwrap();
        assert!((norm[0] - (-0.485 / 0.229)).abs() < 1e-5);
        let back  = revert_normalization(&norm, shape, &stats).unwrap();
        for (b, p) in back.iter().zip(&px) {
            assert!((b - *p as f32 / 255.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_channel_mismatch_rejected() {
        let shape = ImageShape::new(3, 1, 1);
        let stats = NormalizationStats::new(vec![0.5], vec![0.5]).unwrap();
        assert!(normalize(&[1, 2, 3], shape, &stats).is_err());
    }
}
