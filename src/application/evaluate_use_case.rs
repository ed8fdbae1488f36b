// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a run saved with --artifact-dir without training again:
//
//   Step 1: Rebuild the model from its saved configs + weights
//   Step 2: Load the test table and check it fits the model
//   Step 3: Predict the leading samples, evaluate the rest
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{ensure, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu},
    prelude::*,
};

use crate::application::train_use_case::ComputeBackend;
use crate::data::{loader::UcrLoader, source::source_for};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::{Evaluation, Inferencer};

#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub test_shape:  [usize; 3],
    pub predictions: Vec<Vec<f32>>,
    pub evaluation:  Evaluation,
}

pub struct EvaluateUseCase {
    artifact_dir:  String,
    test_source:   String,
    predict_count: usize,
    backend:       ComputeBackend,
}

impl EvaluateUseCase {
    pub fn new(
        artifact_dir:  String,
        test_source:   String,
        predict_count: usize,
        backend:       ComputeBackend,
    ) -> Self {
        Self { artifact_dir, test_source, predict_count, backend }
    }

    pub fn execute(&self) -> Result<EvaluationReport> {
        // Inference only, so no Autodiff wrapper
        match self.backend {
            ComputeBackend::Cpu => self.run::<NdArray>(NdArrayDevice::default()),
            ComputeBackend::Gpu => self.run::<Wgpu>(WgpuDevice::default()),
        }
    }

    pub fn run<B: Backend>(&self, device: B::Device) -> Result<EvaluationReport> {
        // ── Step 1: Rebuild ───────────────────────────────────────────────────
        let ckpt_manager = CheckpointManager::open(&self.artifact_dir)?;
        let model_cfg    = ckpt_manager.load_model_config()?;
        let inferencer   = Inferencer::<B>::from_checkpoint(&ckpt_manager, device)?;

        // ── Step 2: Test data ─────────────────────────────────────────────────
        let test = UcrLoader::new().load(source_for(&self.test_source).as_ref())?;
        model_cfg.check_input(test.shape())?;
        ensure!(
            test.num_classes() <= model_cfg.num_classes,
            "test labels reach class {} but the saved model has {} classes",
            test.num_classes() - 1,
            model_cfg.num_classes
        );

        // ── Step 3: Predict + evaluate ────────────────────────────────────────
        let head        = &test.samples()[..self.predict_count.min(test.len())];
        let predictions = inferencer.predict(head)?;
        let evaluation  = inferencer.evaluate(test.samples());

        tracing::info!(
            "Evaluated saved run '{}': loss={:.4} accuracy={:.4}",
            self.artifact_dir, evaluation.loss, evaluation.accuracy
        );

        Ok(EvaluationReport { test_shape: test.shape(), predictions, evaluation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use burn::backend::Autodiff;
    use std::fs;

    fn write_table(path: &std::path::Path, rows: usize, timesteps: usize) -> String {
        let text: String = (0..rows)
            .map(|i| {
                let sign   = if i % 2 == 0 { 1.0 } else { -1.0 };
                let label  = if i % 2 == 0 { "-1" } else { "1" };
                let values: Vec<String> = (0..timesteps)
                    .map(|t| format!("{:.3}", sign * t as f32 * 0.1))
                    .collect();
                format!("{label}\t{}\n", values.join("\t"))
            })
            .collect();
        fs::write(path, text).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_saved_run_scores_like_the_trained_model() {
        let dir       = tempfile::tempdir().unwrap();
        let artifacts = dir.path().join("run").display().to_string();
        let test_path = write_table(&dir.path().join("test.tsv"), 6, 6);

        let cfg = TrainConfig {
            train_source: write_table(&dir.path().join("train.tsv"), 20, 6),
            test_source:  test_path.clone(),
            batch_size:   4,
            head_size:    8,
            dense_units:  8,
            seed:         Some(5),
            artifact_dir: Some(artifacts.clone()),
            ..TrainConfig::default()
        };
        let trained = TrainUseCase::new(cfg)
            .run::<Autodiff<NdArray>>(Default::default())
            .unwrap();

        let report = EvaluateUseCase::new(artifacts, test_path, 2, ComputeBackend::Cpu)
            .run::<NdArray>(Default::default())
            .unwrap();

        assert_eq!(report.test_shape, [6, 6, 1]);
        assert_eq!(report.predictions.len(), 2);
        assert_eq!(report.evaluation.samples, trained.evaluation.samples);
        // weights round-trip through half precision
        assert!((report.evaluation.loss - trained.evaluation.loss).abs() < 1e-2);
    }

    #[test]
    fn test_missing_run_directory_fails() {
        let dir       = tempfile::tempdir().unwrap();
        let test_path = write_table(&dir.path().join("test.tsv"), 4, 6);
        let missing   = dir.path().join("nothing-here").display().to_string();

        let result = EvaluateUseCase::new(missing, test_path, 2, ComputeBackend::Cpu)
            .run::<NdArray>(Default::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_test_length_must_match_saved_model() {
        let dir       = tempfile::tempdir().unwrap();
        let artifacts = dir.path().join("run").display().to_string();

        let cfg = TrainConfig {
            train_source: write_table(&dir.path().join("train.tsv"), 20, 6),
            test_source:  write_table(&dir.path().join("test.tsv"), 6, 6),
            epochs:       0,
            batch_size:   4,
            head_size:    8,
            dense_units:  8,
            seed:         Some(5),
            artifact_dir: Some(artifacts.clone()),
            ..TrainConfig::default()
        };
        TrainUseCase::new(cfg).run::<Autodiff<NdArray>>(Default::default()).unwrap();

        let short = write_table(&dir.path().join("short.tsv"), 4, 5);
        let err   = EvaluateUseCase::new(artifacts, short, 2, ComputeBackend::Cpu)
            .run::<NdArray>(Default::default())
            .unwrap_err();
        assert!(err.to_string().contains("shape mismatch"));
    }
}
