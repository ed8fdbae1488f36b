// ============================================================
// Layer 1 — CLI Arguments
// ============================================================
// Every flag is optional; the defaults match the reference run.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, ValueEnum};

use crate::application::train_use_case::{ComputeBackend, TrainConfig};
use crate::data::source::{FORDA_TEST_URL, FORDA_TRAIN_URL};

/// Backend choice as spelled on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendArg {
    /// NdArray on the CPU
    Cpu,
    /// WGPU on the default adapter
    Gpu,
}

impl From<BackendArg> for ComputeBackend {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Cpu => ComputeBackend::Cpu,
            BackendArg::Gpu => ComputeBackend::Gpu,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Training table: URL or local path (tab-separated, label first)
    #[arg(long, default_value = FORDA_TRAIN_URL)]
    pub train_source: String,

    /// Test table: URL or local path
    #[arg(long, default_value = FORDA_TEST_URL)]
    pub test_source: String,

    /// Maximum number of passes over the training split
    #[arg(long, default_value_t = 1)]
    pub epochs: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Fraction of training rows (taken from the end) held out for validation
    #[arg(long, default_value_t = 0.2)]
    pub validation_split: f64,

    /// Epochs without validation improvement before stopping
    #[arg(long, default_value_t = 10)]
    pub patience: usize,

    /// Seed for shuffling, weight init and dropout; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Give each stacked block its own weights instead of reusing one
    #[arg(long)]
    pub independent_blocks: bool,

    /// Number of block applications
    #[arg(long, default_value_t = 2)]
    pub num_transformer: usize,

    #[arg(long, default_value_t = 4)]
    pub num_heads: usize,

    /// Width of each attention head
    #[arg(long, default_value_t = 128)]
    pub head_size: usize,

    /// Hidden channels of the 1x1 convolution
    #[arg(long, default_value_t = 4)]
    pub num_filters: usize,

    #[arg(long, default_value_t = 64)]
    pub dense_units: usize,

    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// How many leading test samples to print predictions for
    #[arg(long, default_value_t = 2)]
    pub predict_count: usize,

    #[arg(long, value_enum, default_value_t = BackendArg::Cpu)]
    pub backend: BackendArg,

    /// Directory for configs, weights and metrics.csv; nothing is written when omitted
    #[arg(long)]
    pub artifact_dir: Option<String>,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            train_source:        a.train_source,
            test_source:         a.test_source,
            epochs:              a.epochs,
            batch_size:          a.batch_size,
            lr:                  a.lr,
            validation_split:    a.validation_split,
            patience:            a.patience,
            seed:                a.seed,
            share_block_weights: !a.independent_blocks,
            num_transformer:     a.num_transformer,
            num_heads:           a.num_heads,
            head_size:           a.head_size,
            num_filters:         a.num_filters,
            dense_units:         a.dense_units,
            dropout:             a.dropout,
            predict_count:       a.predict_count,
            backend:             a.backend.into(),
            artifact_dir:        a.artifact_dir,
        }
    }
}
