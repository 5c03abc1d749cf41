// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal per command (prepare a dataset, sweep noise levels).
//
// Rules for this layer:
//   - No sampling or label arithmetic here (that's Layer 4)
//   - No argument parsing or printing here (that's Layer 1)
//   - No direct file formats here (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Split, subsample, corrupt and report one dataset
pub mod prepare_use_case;

// Repeat corruption over a list of noise levels
pub mod sweep_use_case;
