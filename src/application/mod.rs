// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to run one training job:
// load → shuffle → build → fit → predict → evaluate.
//
// No ML math and no printing here; the CLI layer presents the
// returned report.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Re-scoring a saved run
pub mod evaluate_use_case;
