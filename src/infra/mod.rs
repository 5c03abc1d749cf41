// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong in any specific
// business layer:
//
//   rng.rs        — Seeded generator construction
//                   One StdRng per run, plus per-trial seeds
//                   for repeated experiments.
//
//   report.rs     — Run reports
//                   Saves the PrepareConfig and the split /
//                   provenance of a run as JSON so training
//                   can be reproduced and analysed by subset.
//
//   sweep_log.rs  — Noise sweep logging
//                   Writes one CSV row per corruption pass
//                   for later analysis and plotting.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Seeded random number generators
pub mod rng;

/// JSON config and provenance reports
pub mod report;

/// Noise sweep CSV logger
pub mod sweep_log;
