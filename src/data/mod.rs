// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from a raw dataset on disk all the
// way to normalised tensor batches with controlled label noise.
//
// The pipeline flows in this order:
//
//   IDX / binary / list files
//       │
//       ▼
//   loader            → picks a DatasetStore per DatasetKind
//       │
//       ▼
//   splitter          → seeded train / validation permutation
//       │
//       ▼
//   subsampler        → optional fixed-size training subset
//       │
//       ▼
//   arena             → claims each partition for one role
//       │
//       ▼
//   confusion         → row-stochastic flip matrix
//   corruptor         → rewrites train labels, records provenance
//       │
//       ▼
//   transforms        → patch removal, normalisation
//       │
//       ▼
//   dataset           → implements Burn's Dataset trait
//       │
//       ▼
//   batcher           → stacks samples into tensor batches
//
// assembler runs the whole chain from one seeded generator.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// In-memory and file-list DatasetStore implementations
pub mod store;

/// Per-index ownership of one store's labels and images
pub mod arena;

/// Shuffles and splits indices into train/validation partitions
pub mod splitter;

/// Draws a fixed-size subset of a partition without replacement
pub mod subsampler;

/// Generates confusion matrices for the named flip strategies
pub mod confusion;

/// Injects label noise and records provenance
pub mod corruptor;

/// Patch removal and per-channel normalisation
pub mod transforms;

/// Loads MNIST, CIFAR-10, Clothing1M or synthetic data
pub mod loader;

/// Implements Burn's Dataset trait for one split
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Runs split, subsample and corruption in a fixed order
pub mod assembler;
