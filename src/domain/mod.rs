// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits that describe a noisy-label
// experiment: which samples exist, which split they belong to,
// what happened to their labels, and how images are normalised.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - NO randomness
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

/// Error kinds shared by the whole data pipeline
pub mod error;

/// Sample indices, class ids, partitions and split roles
pub mod sample;

/// Image shapes and per-channel normalisation statistics
pub mod image;

/// Per-sample record of what corruption did to a label
pub mod provenance;

/// The raw dataset store abstraction implemented by every loader
pub mod traits;
