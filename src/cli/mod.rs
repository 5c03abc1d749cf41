// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `prepare`   — builds train/val/test with label noise
//   2. `sweep`     — realised noise over several levels
//   3. `confusion` — prints one confusion matrix
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ConfusionArgs, PrepareArgs, SweepArgs};

#[derive(Parser, Debug)]
#[command(
    name = "noisy-label-prep",
    version = "0.1.0",
    about = "Prepare image datasets with controlled, reproducible label noise."
)]
pub struct Cli {
    /// The subcommand to run (prepare, sweep or confusion)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args)   => run_prepare(args),
            Commands::Sweep(args)     => run_sweep(args),
            Commands::Confusion(args) => run_confusion(args),
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;

    let config = args.resolve()?;
    tracing::info!("Preparing {} with noise level {}", config.dataset, config.noise.noise_level);

    let outcome = PrepareUseCase::new(config).execute()?;
    let data    = &outcome.data;

    println!(
        "train: {}  val: {}  test: {}",
        data.train.sample_count(),
        data.val.sample_count(),
        data.test.sample_count()
    );
    match &data.provenance {
        Some(prov) => println!("provenance: {}", prov.summary()),
        None       => println!("provenance: labels not corrupted"),
    }
    println!("Reports saved to '{}'.", outcome.provenance_path.display());
    Ok(())
}

fn run_sweep(args: SweepArgs) -> Result<()> {
    use crate::application::sweep_use_case::{SweepConfig, SweepUseCase};

    let config = SweepConfig {
        base:         args.prepare.resolve()?,
        noise_levels: args.noise_levels,
        trials:       args.trials,
    };
    let rows = SweepUseCase::new(config).execute()?;

    println!("{:>5} {:>8} {:>10} {:>10}", "trial", "level", "realised", "deviation");
    for row in &rows {
        println!(
            "{:>5} {:>8.3} {:>10.4} {:>+10.4}",
            row.trial,
            row.noise_level,
            row.summary.noisy_fraction(),
            row.deviation()
        );
    }
    Ok(())
}

fn run_confusion(args: ConfusionArgs) -> Result<()> {
    use crate::data::confusion::ConfusionMatrix;

    let matrix = ConfusionMatrix::generate(args.strategy, args.classes, args.error_prob)?;
    println!("{} over {} classes, error_prob {}:", args.strategy, args.classes, args.error_prob);
    print!("{matrix}");
    Ok(())
}
