// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `prepare`, `sweep` and
// `confusion`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → f64, DatasetKind, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::prepare_use_case::PrepareConfig;
use crate::data::{
    assembler::NoiseConfig,
    confusion::ConfusionStrategy,
    corruptor::NoiseModel,
    loader::{DatasetKind, SyntheticSpec},
    transforms::ImageTransform,
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split, subsample and corrupt a dataset, then write its provenance
    Prepare(PrepareArgs),

    /// Corrupt the same training split at several noise levels
    Sweep(SweepArgs),

    /// Print a generated confusion matrix
    Confusion(ConfusionArgs),
}

/// All arguments for the `prepare` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug, Clone)]
pub struct PrepareArgs {
    /// JSON file holding a full PrepareConfig; other flags are ignored
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// mnist, cifar10, clothing1m or synthetic
    #[arg(long, default_value = "mnist")]
    pub dataset: DatasetKind,

    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Where prepare_config.json, provenance.json and sweep.csv go
    #[arg(long, default_value = "output")]
    pub output_dir: String,

    /// Fraction of the train+val store held out for validation
    #[arg(long, default_value_t = 0.2)]
    pub val_ratio: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Corruption probability in [0, 1]
    #[arg(long, default_value_t = 0.0)]
    pub noise_level: f64,

    /// Keep only this many training examples
    #[arg(long)]
    pub num_train_examples: Option<usize>,

    /// uniform_flip, uniform_error or custom_fixed_map
    #[arg(long, default_value = "uniform_flip")]
    pub confusion_function: ConfusionStrategy,

    /// independent_redraw or confusion_matrix; defaults per dataset
    #[arg(long)]
    pub noise_model: Option<NoiseModel>,

    #[arg(long)]
    pub data_augmentation: bool,

    /// Zero each 4×4 patch of a training image with this probability
    #[arg(long)]
    pub remove_prob: Option<f64>,

    /// Also remove patches from validation and test images
    #[arg(long)]
    pub transform_validation: bool,

    #[arg(long, default_value_t = 1000)]
    pub synthetic_samples: usize,

    #[arg(long, default_value_t = 200)]
    pub synthetic_test: usize,

    #[arg(long, default_value_t = 10)]
    pub synthetic_classes: usize,
}

impl PrepareArgs {
    /// The flags as a config, or the `--config` file when one is given
    pub fn resolve(self) -> anyhow::Result<PrepareConfig> {
        match &self.config {
            Some(path) => PrepareConfig::from_json_file(path),
            None => Ok(self.into()),
        }
    }
}

/// Convert CLI PrepareArgs into the application-layer PrepareConfig.
/// The application layer never sees clap types.
impl From<PrepareArgs> for PrepareConfig {
    fn from(a: PrepareArgs) -> Self {
        PrepareConfig {
            dataset:    a.dataset,
            data_dir:   a.data_dir,
            output_dir: a.output_dir,
            noise: NoiseConfig {
                val_ratio:            a.val_ratio,
                seed:                 a.seed,
                noise_level:          a.noise_level,
                num_train_examples:   a.num_train_examples,
                confusion_function:   a.confusion_function,
                noise_model:          a.noise_model,
                data_augmentation:    a.data_augmentation,
                image_transform:      a.remove_prob.map(|prob| ImageTransform::RemoveRandomChunks { prob }),
                transform_validation: a.transform_validation,
            },
            synthetic: SyntheticSpec {
                n_samples: a.synthetic_samples,
                n_test:    a.synthetic_test,
                n_classes: a.synthetic_classes,
            },
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub prepare: PrepareArgs,

    /// Comma-separated noise levels
    #[arg(long, value_delimiter = ',', default_value = "0.0,0.1,0.2,0.3,0.4,0.5")]
    pub noise_levels: Vec<f64>,

    /// Repetitions, each with its own corruption seed
    #[arg(long, default_value_t = 1)]
    pub trials: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ConfusionArgs {
    #[arg(long, default_value = "uniform_flip")]
    pub strategy: ConfusionStrategy,

    #[arg(long, default_value_t = 10)]
    pub classes: usize,

    #[arg(long, default_value_t = 0.2)]
    pub error_prob: f64,
}
