// ============================================================
// Layer 3 — Image Shape and Normalisation Statistics
// ============================================================
// Every store hands out raw pixels as a flat `Vec<u8>` in
// channel-major (CHW) order. The shape tells consumers how to
// read it back, and the statistics are the fixed per-channel
// mean / std that each dataset is normalised with.

use serde::{Deserialize, Serialize};

use crate::domain::error::{NoiseError, NoiseResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShape {
    pub channels: usize,
    pub height:   usize,
    pub width:    usize,
}

impl ImageShape {
    pub const fn new(channels: usize, height: usize, width: usize) -> Self {
        Self { channels, height, width }
    }

    /// Pixels in one channel plane
    pub fn plane_len(&self) -> usize {
        self.height * self.width
    }

    /// Bytes in one CHW image
    pub fn pixel_count(&self) -> usize {
        self.channels * self.plane_len()
    }

    pub fn dims(&self) -> [usize; 3] {
        [self.channels, self.height, self.width]
    }
}

/// Per-channel mean and standard deviation on the [0, 1] scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStats {
    mean: Vec<f32>,
    std:  Vec<f32>,
}

impl NormalizationStats {
    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> NoiseResult<Self> {
        if mean.is_empty() || mean.len() != std.len() {
            return Err(NoiseError::invalid(format!(
                "mean has {} channels but std has {}",
                mean.len(),
                std.len()
            )));
        }
        if std.iter().any(|&s| !(s > 0.0)) {
            return Err(NoiseError::invalid("every std entry must be positive"));
        }
        Ok(Self { mean, std })
    }

    /// Compile-time constants known to be well formed
    pub(crate) fn fixed(mean: &[f32], std: &[f32]) -> Self {
        Self { mean: mean.to_vec(), std: std.to_vec() }
    }

    pub fn mean(&self) -> &[f32] {
        &self.mean
    }

    pub fn std(&self) -> &[f32] {
        &self.std
    }

    pub fn channels(&self) -> usize {
        self.mean.len()
    }

    /// The `(mean, std)` pair handed to training code
    pub fn as_pair(&self) -> (&[f32], &[f32]) {
        (&self.mean, &self.std)
    }
}
