// ============================================================
// Layer 4 — Dataset Loaders
// ============================================================
// Turns a DatasetKind plus a data directory into DatasetStores.
//
//   Mnist      → IDX files read with the `mnist` crate
//                  train-images-idx3-ubyte / train-labels-idx1-ubyte
//                  t10k-images-idx3-ubyte  / t10k-labels-idx1-ubyte
//   Cifar10    → binary batches, 3073 bytes per record
//                  [label][1024 R][1024 G][1024 B]
//                  data_batch_1..5.bin + test_batch.bin
//   Clothing1M → annotation lists under dmi_annotations/
//                  noisy_train.txt / clean_val.txt / clean_test.txt
//                  one "<relative path> <label>" per line
//   Synthetic  → deterministic in-memory images, no files
//
// Mnist, Cifar10 and Synthetic come as one train+val store that the
// assembler splits, plus a separate test store. Clothing1M ships
// with its three splits predefined.
//
// Missing or truncated files surface as ResourceUnavailable.
//
// Reference: Rust Book §9 (Error Handling)
//            mnist crate documentation

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use mnist::MnistBuilder;
use serde::{Deserialize, Serialize};

use crate::data::corruptor::NoiseModel;
use crate::data::store::{FileListStore, InMemoryStore};
use crate::domain::error::{NoiseError, NoiseResult};
use crate::domain::image::{ImageShape, NormalizationStats};
use crate::domain::sample::ClassId;
use crate::domain::traits::DatasetStore;

const MNIST_SHAPE: ImageShape = ImageShape::new(1, 28, 28);
const MNIST_TRAIN: usize      = 60_000;
const MNIST_TEST: usize       = 10_000;

const CIFAR_SHAPE: ImageShape = ImageShape::new(3, 32, 32);
const CIFAR_TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];
const CIFAR_TEST_FILE: &str = "test_batch.bin";

const CLOTHING_CLASSES: usize = 14;
const CLOTHING_SIDE: u32      = 224;

const SYNTHETIC_SHAPE: ImageShape = ImageShape::new(1, 8, 8);

// ImageNet statistics, shared by every colour dataset
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3]  = [0.229, 0.224, 0.225];

/// Available datasets supported by the crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// MNIST handwritten digits
    #[default]
    Mnist,
    /// CIFAR-10 colour images
    Cifar10,
    /// Clothing1M, natively noisy web labels
    Clothing1M,
    /// Generated in memory, for demos and tests
    Synthetic,
}

impl DatasetKind {
    /// Name tag attached to every LabeledDataset of this kind
    pub fn name(self) -> &'static str {
        match self {
            DatasetKind::Mnist      => "mnist",
            DatasetKind::Cifar10    => "cifar10",
            DatasetKind::Clothing1M => "clothing1M",
            DatasetKind::Synthetic  => "synthetic",
        }
    }

    /// Fixed per-channel normalisation constants
    pub fn statistics(self) -> NormalizationStats {
        match self {
            DatasetKind::Mnist                          => NormalizationStats::fixed(&[0.456], &[0.224]),
            DatasetKind::Cifar10 | DatasetKind::Clothing1M => NormalizationStats::fixed(&IMAGENET_MEAN, &IMAGENET_STD),
            DatasetKind::Synthetic                      => NormalizationStats::fixed(&[0.5], &[0.25]),
        }
    }

    /// Corruption algorithm used when the config does not pick one.
    /// Clothing1M labels are already noisy, so it gets none.
    pub fn default_noise_model(self) -> Option<NoiseModel> {
        match self {
            DatasetKind::Mnist                            => Some(NoiseModel::IndependentRedraw),
            DatasetKind::Cifar10 | DatasetKind::Synthetic => Some(NoiseModel::ConfusionMatrix),
            DatasetKind::Clothing1M                       => None,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetKind {
    type Err = NoiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mnist"                 => Ok(DatasetKind::Mnist),
            "cifar10" | "cifar-10"  => Ok(DatasetKind::Cifar10),
            "clothing1m"            => Ok(DatasetKind::Clothing1M),
            "synthetic"             => Ok(DatasetKind::Synthetic),
            other => Err(NoiseError::invalid(format!("unknown dataset '{other}'"))),
        }
    }
}

/// Size of the generated synthetic dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    pub n_samples: usize,
    pub n_test:    usize,
    pub n_classes: usize,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self { n_samples: 1000, n_test: 200, n_classes: 10 }
    }
}

/// Stores produced by a loader
pub enum DatasetSource {
    /// One store to be split into train/validation, plus a test store
    Splittable {
        train_val: Box<dyn DatasetStore>,
        test:      Box<dyn DatasetStore>,
    },
    /// Three stores whose split is fixed by the dataset itself
    Predefined {
        train: Box<dyn DatasetStore>,
        val:   Box<dyn DatasetStore>,
        test:  Box<dyn DatasetStore>,
    },
}

/// Load the stores for `kind` from `data_dir`
pub fn load_source(kind: DatasetKind, data_dir: &Path, synthetic: &SyntheticSpec) -> NoiseResult<DatasetSource> {
    tracing::info!("Loading {} from '{}'", kind, data_dir.display());
    match kind {
        DatasetKind::Mnist      => load_mnist(data_dir),
        DatasetKind::Cifar10    => load_cifar10(data_dir),
        DatasetKind::Clothing1M => load_clothing1m(data_dir),
        DatasetKind::Synthetic  => synthetic_source(synthetic),
    }
}

fn require_file(path: &Path) -> NoiseResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(NoiseError::unavailable(path.display(), "file not found"))
    }
}

// ─── MNIST ────────────────────────────────────────────────────────────────────

fn load_mnist(dir: &Path) -> NoiseResult<DatasetSource> {
    for name in [
        "train-images-idx3-ubyte",
        "train-labels-idx1-ubyte",
        "t10k-images-idx3-ubyte",
        "t10k-labels-idx1-ubyte",
    ] {
        require_file(&dir.join(name))?;
    }

    // MnistBuilder concatenates base_path and file name
    let base  = format!("{}/", dir.display());
    let mnist = MnistBuilder::new()
        .label_format_digit()
        .base_path(&base)
        .training_set_length(MNIST_TRAIN as u32)
        .validation_set_length(0)
        .test_set_length(MNIST_TEST as u32)
        .finalize();

    let to_labels = |raw: &[u8]| raw.iter().map(|&l| l as ClassId).collect::<Vec<_>>();
    let train_val = InMemoryStore::new(MNIST_SHAPE, 10, mnist.trn_img, to_labels(&mnist.trn_lbl))?;
    let test      = InMemoryStore::new(MNIST_SHAPE, 10, mnist.tst_img, to_labels(&mnist.tst_lbl))?;

    Ok(DatasetSource::Splittable {
        train_val: Box::new(train_val),
        test:      Box::new(test),
    })
}

// ─── CIFAR-10 ─────────────────────────────────────────────────────────────────

/// Parse one CIFAR-10 binary batch into (CHW pixels, labels)
fn read_cifar_batch(path: &Path) -> NoiseResult<(Vec<u8>, Vec<ClassId>)> {
    let bytes  = fs::read(path).map_err(|e| NoiseError::unavailable(path.display(), e))?;
    let record = CIFAR_SHAPE.pixel_count() + 1;
    if bytes.is_empty() || bytes.len() % record != 0 {
        return Err(NoiseError::unavailable(
            path.display(),
            format!("{} bytes is not a whole number of {record}-byte records", bytes.len()),
        ));
    }

    let count      = bytes.len() / record;
    let mut pixels = Vec::with_capacity(count * (record - 1));
    let mut labels = Vec::with_capacity(count);
    for chunk in bytes.chunks_exact(record) {
        labels.push(chunk[0] as ClassId);
        pixels.extend_from_slice(&chunk[1..]);
    }
    Ok((pixels, labels))
}

fn load_cifar10(dir: &Path) -> NoiseResult<DatasetSource> {
    let mut pixels = Vec::new();
    let mut labels = Vec::new();
    for name in CIFAR_TRAIN_FILES {
        let (p, l) = read_cifar_batch(&dir.join(name))?;
        pixels.extend(p);
        labels.extend(l);
    }
    let (test_pixels, test_labels) = read_cifar_batch(&dir.join(CIFAR_TEST_FILE))?;

    Ok(DatasetSource::Splittable {
        train_val: Box::new(InMemoryStore::new(CIFAR_SHAPE, 10, pixels, labels)?),
        test:      Box::new(InMemoryStore::new(CIFAR_SHAPE, 10, test_pixels, test_labels)?),
    })
}

// ─── Clothing1M ───────────────────────────────────────────────────────────────

/// Parse an annotation list. Image paths are relative to `root`
/// and every one of them must exist.
pub fn read_file_list(root: &Path, list: &Path) -> NoiseResult<Vec<(PathBuf, ClassId)>> {
    let text = fs::read_to_string(list).map_err(|e| NoiseError::unavailable(list.display(), e))?;

    let mut entries = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let parsed = match (parts.next(), parts.next().map(str::parse::<ClassId>)) {
            (Some(rel), Some(Ok(label))) => Some((root.join(rel.trim_start_matches('/')), label)),
            _ => None,
        };
        let entry = parsed.ok_or_else(|| {
            NoiseError::unavailable(list.display(), format!("malformed line {}: '{line}'", line_no + 1))
        })?;
        require_file(&entry.0)?;
        entries.push(entry);
    }
    Ok(entries)
}

fn load_clothing1m(dir: &Path) -> NoiseResult<DatasetSource> {
    let annotations = dir.join("dmi_annotations");
    let store = |file: &str| -> NoiseResult<Box<dyn DatasetStore>> {
        let entries = read_file_list(dir, &annotations.join(file))?;
        Ok(Box::new(FileListStore::new(entries, CLOTHING_CLASSES, CLOTHING_SIDE)))
    };

    Ok(DatasetSource::Predefined {
        train: store("noisy_train.txt")?,
        val:   store("clean_val.txt")?,
        test:  store("clean_test.txt")?,
    })
}

// ─── Synthetic ────────────────────────────────────────────────────────────────

/// Deterministic pixel pattern; depends only on index and label
fn synthetic_store(n: usize, n_classes: usize, offset: usize) -> NoiseResult<InMemoryStore> {
    let size = SYNTHETIC_SHAPE.pixel_count();
    let mut pixels = Vec::with_capacity(n * size);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let label = (i + offset) % n_classes;
        pixels.extend((0..size).map(|p| ((i * 31 + p * 7 + label * 13) % 256) as u8));
        labels.push(label);
    }
    InMemoryStore::new(SYNTHETIC_SHAPE, n_classes, pixels, labels)
}

pub fn synthetic_source(size: &SyntheticSpec) -> NoiseResult<DatasetSource> {
    if size.n_samples == 0 || size.n_classes == 0 {
        return Err(NoiseError::invalid("synthetic data needs at least one sample and one class"));
    }
    Ok(DatasetSource::Splittable {
        train_val: Box::new(synthetic_store(size.n_samples, size.n_classes, 0)?),
        test:      Box::new(synthetic_store(size.n_test, size.n_classes, 1)?),
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("MNIST".parse::<DatasetKind>().unwrap(), DatasetKind::Mnist);
        assert_eq!("cifar-10".parse::<DatasetKind>().unwrap(), DatasetKind::Cifar10);
        assert_eq!("clothing1M".parse::<DatasetKind>().unwrap(), DatasetKind::Clothing1M);
        assert!("imagenet".parse::<DatasetKind>().is_err());
    }

    #[test]
    fn test_statistics_channels() {
        assert_eq!(DatasetKind::Mnist.statistics().channels(), 1);
        assert_eq!(DatasetKind::Cifar10.statistics().channels(), 3);
        assert_eq!(DatasetKind::Clothing1M.statistics().mean(), &IMAGENET_MEAN);
    }

    #[test]
    fn test_missing_mnist_is_unavailable() {
        let dir = tempdir().unwrap();
        let err = load_source(DatasetKind::Mnist, dir.path(), &SyntheticSpec::default()).err();
        assert!(matches!(err, Some(NoiseError::ResourceUnavailable { .. })));
    }

    #[test]
    fn test_cifar_batch_parsing() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("batch.bin");
        let mut bytes = vec![7u8];
        bytes.extend(vec![1u8; 3072]);
        bytes.push(3);
        bytes.extend(vec![2u8; 3072]);
        fs::write(&path, &bytes).unwrap();

        let (pixels, labels) = read_cifar_batch(&path).unwrap();
        assert_eq!(labels, vec![7, 3]);
        assert_eq!(pixels.len(), 2 * 3072);
        assert_eq!(pixels[3072], 2);

        fs::write(&path, &bytes[..100]).unwrap();
        assert!(read_cifar_batch(&path).is_err());
    }

    #[test]
    fn test_file_list_parsing() {
        let dir  = tempdir().unwrap();
        fs::create_dir(dir.path().join("images")).unwrap();
        fs::write(dir.path().join("images/a.jpg"), b"").unwrap();
        fs::write(dir.path().join("images/b.jpg"), b"").unwrap();
        let list = dir.path().join("list.txt");
        let mut f = fs::File::create(&list).unwrap();
        writeln!(f, "images/a.jpg 3").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "/images/b.jpg 11").unwrap();
        drop(f);

        let entries = read_file_list(dir.path(), &list).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], (dir.path().join("images/a.jpg"), 3));
        assert_eq!(entries[1].1, 11);

        fs::write(&list, "images/c.jpg notalabel\n").unwrap();
        assert!(read_file_list(dir.path(), &list).is_err());
    }

    #[test]
    fn test_missing_listed_image_fails_at_load() {
        let dir = tempdir().unwrap();
        let ann = dir.path().join("dmi_annotations");
        fs::create_dir(&ann).unwrap();
        fs::write(dir.path().join("a.png"), b"").unwrap();
        for name in ["noisy_train.txt", "clean_val.txt", "clean_test.txt"] {
            fs::write(ann.join(name), "a.png 1\n").unwrap();
        }
        assert!(load_source(DatasetKind::Clothing1M, dir.path(), &SyntheticSpec::default()).is_ok());

        fs::write(ann.join("noisy_train.txt"), "a.png 1\nmissing.png 4\na.png 2\n").unwrap();
        let err = load_source(DatasetKind::Clothing1M, dir.path(), &SyntheticSpec::default()).err();
        match err {
            Some(NoiseError::ResourceUnavailable { resource, .. }) => assert!(resource.ends_with("missing.png")),
            other => panic!("expected ResourceUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_synthetic_source() {
        let size = SyntheticSpec { n_samples: 50, n_test: 10, n_classes: 5 };
        match synthetic_source(&size).unwrap() {
            DatasetSource::Splittable { train_val, test } => {
                assert_eq!(train_val.len(), 50);
                assert_eq!(test.len(), 10);
                assert_eq!(train_val.label_at(7).unwrap(), 2);
                assert_eq!(train_val.shape(), SYNTHETIC_SHAPE);
            }
            DatasetSource::Predefined { .. } => panic!("synthetic data is splittable"),
        }
    }
}
