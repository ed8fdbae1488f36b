// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that builds, trains or runs the network.
//
//   attention.rs      — multi-head self-attention from Linear +
//                       matmul + softmax
//   block.rs          — pre-norm residual transformer block
//                       (attention + 1x1 conv feed-forward)
//   model.rs          — stacked blocks, channels-first pooling,
//                       dense head with softmax output
//   early_stopping.rs — patience-based stop / best-weight restore
//   trainer.rs        — fit(): validation split, Adam, epoch loop
//   inferencer.rs     — predict() and evaluate() without gradients
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

pub mod attention;

pub mod block;

pub mod model;

pub mod early_stopping;

/// Full training loop with validation and early stopping
pub mod trainer;

/// Prediction and evaluation on trained weights
pub mod inferencer;
