// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Runs the full pipeline in order:
//
//   Step 1: Load train/test tables        (Layer 4 - data)
//   Step 2: Shuffle the training rows     (Layer 4 - data)
//   Step 3: Check shapes, build the model (Layer 5 - ml)
//   Step 4: Save configs if requested     (Layer 6 - infra)
//   Step 5: Fit with early stopping       (Layer 5 - ml)
//   Step 6: Predict a few test samples    (Layer 5 - ml)
//   Step 7: Evaluate on the test split    (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{ensure, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    module::AutodiffModule,
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::{
    loader::{shuffle_samples, UcrLoader},
    source::{source_for, FORDA_TEST_URL, FORDA_TRAIN_URL},
};
use crate::infra::{checkpoint::CheckpointManager, metrics::{EpochMetrics, MetricsLogger}};
use crate::ml::{
    block::TransformerBlockConfig,
    inferencer::{Evaluation, Inferencer},
    model::TimeSeriesTransformerConfig,
    trainer::{fit, FitConfig},
};

/// Which Burn backend runs the tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeBackend {
    /// NdArray on the CPU
    Cpu,
    /// Wgpu on the default adapter
    Gpu,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Defaults reproduce the reference FordA run: 1 epoch, batch 64,
// Adam at 1e-4, 20% validation, patience 10, one shared block
// applied twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub train_source:        String,
    pub test_source:         String,
    pub epochs:              usize,
    pub batch_size:          usize,
    pub lr:                  f64,
    pub validation_split:    f64,
    pub patience:            usize,
    pub seed:                Option<u64>,
    pub share_block_weights: bool,
    pub num_transformer:     usize,
    pub num_heads:           usize,
    pub head_size:           usize,
    pub num_filters:         usize,
    pub dense_units:         usize,
    pub dropout:             f64,
    pub predict_count:       usize,
    pub backend:             ComputeBackend,
    pub artifact_dir:        Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_source:        FORDA_TRAIN_URL.to_string(),
            test_source:         FORDA_TEST_URL.to_string(),
            epochs:              1,
            batch_size:          64,
            lr:                  1e-4,
            validation_split:    0.2,
            patience:            10,
            seed:                None,
            share_block_weights: true,
            num_transformer:     2,
            num_heads:           4,
            head_size:           128,
            num_filters:         4,
            dense_units:         64,
            dropout:             0.2,
            predict_count:       2,
            backend:             ComputeBackend::Cpu,
            artifact_dir:        None,
        }
    }
}

impl TrainConfig {
    pub fn model_config(&self, timesteps: usize, channels: usize, num_classes: usize) -> TimeSeriesTransformerConfig {
        let block = TransformerBlockConfig::new(channels)
            .with_num_heads(self.num_heads)
            .with_head_size(self.head_size)
            .with_num_filters(self.num_filters)
            .with_dropout(self.dropout);

        TimeSeriesTransformerConfig::new(timesteps, num_classes, block)
            .with_channels(channels)
            .with_num_transformer(self.num_transformer)
            .with_share_block_weights(self.share_block_weights)
            .with_dense_units(self.dense_units)
            .with_dropout(self.dropout)
    }

    pub fn fit_config(&self, channels: usize, shuffle_seed: u64) -> FitConfig {
        FitConfig::new()
            .with_epochs(self.epochs)
            .with_batch_size(self.batch_size)
            .with_learning_rate(self.lr)
            .with_validation_split(self.validation_split)
            .with_patience(self.patience)
            .with_seed(shuffle_seed)
            .with_channels(channels)
    }
}

/// Everything the run produced, for the CLI to present.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub train_shape:   [usize; 3],
    pub test_shape:    [usize; 3],
    pub history:       Vec<EpochMetrics>,
    pub best_epoch:    Option<usize>,
    pub stopped_epoch: Option<usize>,
    pub predictions:   Vec<Vec<f32>>,
    pub evaluation:    Evaluation,
}

impl RunReport {
    /// Epoch whose weights were put back after early stopping.
    /// None when training ran to the cap or no epoch ever improved.
    pub fn restored_epoch(&self) -> Option<usize> {
        self.stopped_epoch.and(self.best_epoch)
    }
}

pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full pipeline on the configured backend.
    pub fn execute(&self) -> Result<RunReport> {
        match self.config.backend {
            ComputeBackend::Cpu => {
                tracing::info!("Using NdArray CPU backend");
                self.run::<Autodiff<NdArray>>(NdArrayDevice::default())
            }
            ComputeBackend::Gpu => {
                let device = WgpuDevice::default();
                tracing::info!("Using WGPU device: {:?}", device);
                self.run::<Autodiff<Wgpu>>(device)
            }
        }
    }

    pub fn run<B: AutodiffBackend>(&self, device: B::Device) -> Result<RunReport> {
        let cfg = &self.config;

        // ── Step 1: Load both partitions ──────────────────────────────────────
        let loader = UcrLoader::new();
        let train  = loader.load(source_for(&cfg.train_source).as_ref())?;
        let test   = loader.load(source_for(&cfg.test_source).as_ref())?;

        // ── Step 2: Shuffle the training rows ─────────────────────────────────
        // Seeded runs are reproducible; otherwise the OS supplies entropy.
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        let train = shuffle_samples(train, &mut rng);

        // ── Step 3: Model configuration and shape checks ──────────────────────
        let num_classes = train.num_classes();
        let model_cfg   = cfg.model_config(train.timesteps(), train.channels(), num_classes);
        model_cfg.validate()?;
        model_cfg.check_input(train.shape())?;
        model_cfg.check_input(test.shape())?;
        ensure!(
            test.num_classes() <= num_classes,
            "test labels reach class {} but training only has {} classes",
            test.num_classes() - 1,
            num_classes
        );

        if let Some(seed) = cfg.seed {
            B::seed(seed);
        }
        let model = model_cfg.init::<B>(&device)?;
        tracing::info!(
            "Model ready: {} parameters, {} block application(s), {} distinct block(s)",
            model.num_params(),
            model.num_transformer,
            model.distinct_blocks()
        );

        // ── Step 4: Optional artifacts ────────────────────────────────────────
        let ckpt_manager = cfg.artifact_dir.as_deref().map(|dir| CheckpointManager::new(dir)).transpose()?;
        let metrics_log  = match &ckpt_manager {
            Some(ckpt) => {
                ckpt.save_config(cfg)?;
                ckpt.save_model_config(&model_cfg)?;
                Some(MetricsLogger::new(ckpt.dir().clone())?)
            }
            None => None,
        };

        // ── Step 5: Fit ───────────────────────────────────────────────────────
        let shuffle_seed = cfg.seed.unwrap_or_else(|| rng.gen());
        let fit_cfg      = cfg.fit_config(train.channels(), shuffle_seed);
        let train_shape  = train.shape();

        let outcome = fit(model, train.into_samples(), &fit_cfg, &device, |m| {
            match &metrics_log {
                Some(log) => log.log(m),
                None      => Ok(()),
            }
        })?;

        if let Some(ckpt) = &ckpt_manager {
            ckpt.save_model(&outcome.model)?;
            tracing::info!("Weights saved to '{}'", ckpt.dir().display());
        }

        // ── Step 6 + 7: Predict and evaluate without autodiff ─────────────────
        let inferencer  = Inferencer::new(outcome.model.valid(), device, test.channels(), cfg.batch_size);
        let head        = &test.samples()[..cfg.predict_count.min(test.len())];
        let predictions = inferencer.predict(head)?;
        let evaluation  = inferencer.evaluate(test.samples());

        tracing::info!(
            "Test evaluation: loss={:.4} accuracy={:.4} over {} samples",
            evaluation.loss, evaluation.accuracy, evaluation.samples
        );

        Ok(RunReport {
            train_shape,
            test_shape: test.shape(),
            history: outcome.history,
            best_epoch: outcome.best_epoch,
            stopped_epoch: outcome.stopped_epoch,
            predictions,
            evaluation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    type TestBackend = Autodiff<NdArray>;

    /// Writes a small UCR-style table with labels in {-1, +1}.
    fn write_table(dir: &std::path::Path, name: &str, rows: usize, timesteps: usize) -> String {
        let text: String = (0..rows)
            .map(|i| {
                let label = if i % 2 == 0 { "-1" } else { "1" };
                let values: Vec<String> = (0..timesteps)
                    .map(|t| format!("{:.3}", if i % 2 == 0 { t as f32 * 0.1 } else { -(t as f32) * 0.1 }))
                    .collect();
                format!("{label}\t{}\n", values.join("\t"))
            })
            .collect();
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path.display().to_string()
    }

    fn small_config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            train_source: write_table(dir, "train.tsv", 20, 6),
            test_source:  write_table(dir, "test.tsv", 6, 6),
            batch_size:   4,
            head_size:    8,
            dense_units:  8,
            seed:         Some(11),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_defaults_match_reference_run() {
        let cfg = TrainConfig::default();
        assert_eq!((cfg.epochs, cfg.batch_size, cfg.patience), (1, 64, 10));
        assert_eq!((cfg.num_heads, cfg.head_size, cfg.num_filters), (4, 128, 4));
        assert!(cfg.share_block_weights);
        assert_eq!(cfg.train_source, FORDA_TRAIN_URL);
    }

    #[test]
    fn test_end_to_end_on_local_tables() {
        let dir    = tempfile::tempdir().unwrap();
        let report = TrainUseCase::new(small_config(dir.path()))
            .run::<TestBackend>(Default::default())
            .unwrap();

        assert_eq!(report.train_shape, [20, 6, 1]);
        assert_eq!(report.test_shape, [6, 6, 1]);
        assert_eq!(report.history.len(), 1);
        assert_eq!(report.predictions.len(), 2);
        assert!(report.evaluation.loss.is_finite());
        assert!((0.0..=1.0).contains(&report.evaluation.accuracy));
    }

    #[test]
    fn test_artifacts_are_written_when_requested() {
        let dir       = tempfile::tempdir().unwrap();
        let artifacts = dir.path().join("run");
        let cfg = TrainConfig {
            artifact_dir: Some(artifacts.display().to_string()),
            ..small_config(dir.path())
        };

        TrainUseCase::new(cfg).run::<TestBackend>(Default::default()).unwrap();

        assert!(artifacts.join("train_config.json").exists());
        assert!(artifacts.join("model_config.json").exists());
        assert!(artifacts.join("model.mpk.gz").exists());
        let csv = fs::read_to_string(artifacts.join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn test_mismatched_test_length_fails_before_training() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            test_source: write_table(dir.path(), "short.tsv", 4, 5),
            ..small_config(dir.path())
        };
        let err = TrainUseCase::new(cfg).run::<TestBackend>(Default::default()).unwrap_err();
        assert!(err.to_string().contains("shape mismatch"));
    }

    fn report(best_epoch: Option<usize>, stopped_epoch: Option<usize>) -> RunReport {
        RunReport {
            train_shape: [0, 0, 1],
            test_shape:  [0, 0, 1],
            history:     Vec::new(),
            best_epoch,
            stopped_epoch,
            predictions: Vec::new(),
            evaluation:  Evaluation { loss: f64::NAN, accuracy: 0.0, samples: 0 },
        }
    }

    #[test]
    fn test_restored_epoch_needs_a_stop_and_a_best() {
        assert_eq!(report(Some(3), Some(13)).restored_epoch(), Some(3));
        // ran to the epoch cap: last weights kept
        assert_eq!(report(Some(3), None).restored_epoch(), None);
        // stopped without any improving epoch (all NaN losses)
        assert_eq!(report(None, Some(10)).restored_epoch(), None);
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            train_source: dir.path().join("absent.tsv").display().to_string(),
            ..small_config(dir.path())
        };
        assert!(TrainUseCase::new(cfg).run::<TestBackend>(Default::default()).is_err());
    }
}
