// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Optional run artifacts, only touched when --artifact-dir is set:
//
//   checkpoint.rs — run config (JSON), model config (burn Config)
//                   and final weights (model.mpk.gz)
//
//   metrics.rs    — per-epoch metrics appended to metrics.csv
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
