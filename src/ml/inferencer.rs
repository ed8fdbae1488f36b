// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Runs a model without gradients: class probabilities for a few
// samples (predict) and aggregate loss/accuracy over a whole
// partition (evaluate).
//
// Evaluation batches are taken in order; the loss of each batch
// is weighted by its size so the result is the per-sample mean.

use anyhow::Result;
use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::ElementConversion,
};
use serde::{Deserialize, Serialize};

use crate::data::batcher::SeriesBatcher;
use crate::domain::series::TimeSeriesSample;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::TimeSeriesTransformer;

/// Aggregate result of an evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub loss:     f64,
    pub accuracy: f64,
    pub samples:  usize,
}

pub struct Inferencer<B: Backend> {
    model:      TimeSeriesTransformer<B>,
    batcher:    SeriesBatcher<B>,
    batch_size: usize,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(
        model:      TimeSeriesTransformer<B>,
        device:     B::Device,
        channels:   usize,
        batch_size: usize,
    ) -> Self {
        Self {
            model,
            batcher: SeriesBatcher::with_channels(device, channels),
            batch_size: batch_size.max(1),
        }
    }

    /// Rebuild the model from a saved run and load its weights.
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, device: B::Device) -> Result<Self> {
        let run_cfg   = ckpt_manager.load_config()?;
        let model_cfg = ckpt_manager.load_model_config()?;
        let model     = model_cfg.init::<B>(&device)?;
        let model     = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint");
        Ok(Self::new(model, device, model_cfg.channels, run_cfg.batch_size))
    }

    /// Class probabilities, one Vec per sample.
    pub fn predict(&self, samples: &[TimeSeriesSample]) -> Result<Vec<Vec<f32>>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let batch       = self.batcher.batch(samples.to_vec());
        let probs       = self.model.forward(batch.inputs);
        let [_, classes] = probs.dims();

        let flat = probs
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read probabilities: {e:?}"))?;

        Ok(flat.chunks(classes).map(<[f32]>::to_vec).collect())
    }

    pub fn evaluate(&self, samples: &[TimeSeriesSample]) -> Evaluation {
        let mut loss_sum = 0.0f64;
        let mut correct  = 0usize;

        for chunk in samples.chunks(self.batch_size) {
            let batch = self.batcher.batch(chunk.to_vec());
            let (loss, logits) = self
                .model
                .forward_classification(batch.inputs, batch.targets.clone());

            loss_sum += loss.into_scalar().elem::<f64>() * chunk.len() as f64;
            correct  += count_correct(logits, batch.targets);
        }

        let total = samples.len();
        let evaluation = Evaluation {
            loss:     if total > 0 { loss_sum / total as f64 } else { f64::NAN },
            accuracy: if total > 0 { correct as f64 / total as f64 } else { 0.0 },
            samples:  total,
        };
        tracing::debug!("Evaluated {} samples: {:?}", total, evaluation);
        evaluation
    }
}

/// Number of rows whose argmax matches the target class.
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    // argmax(1) returns [batch, 1] — flatten to [batch] before comparing
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    let correct: i64 = predicted
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{block::TransformerBlockConfig, model::TimeSeriesTransformerConfig};
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray;

    fn inferencer() -> Inferencer<TestBackend> {
        let device = Default::default();
        let model  = TimeSeriesTransformerConfig::new(6, 2, TransformerBlockConfig::new(1).with_head_size(8))
            .with_dense_units(8)
            .init::<TestBackend>(&device)
            .unwrap();
        Inferencer::new(model, device, 1, 4)
    }

    fn samples(n: usize) -> Vec<TimeSeriesSample> {
        (0..n)
            .map(|i| TimeSeriesSample::new(vec![i as f32 * 0.1; 6], i % 2))
            .collect()
    }

    #[test]
    fn test_predict_returns_distributions() {
        let probs = inferencer().predict(&samples(2)).unwrap();
        assert_eq!(probs.len(), 2);
        for row in probs {
            assert_eq!(row.len(), 2);
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_evaluate_over_uneven_batches() {
        let eval = inferencer().evaluate(&samples(10));
        assert_eq!(eval.samples, 10);
        assert!(eval.loss.is_finite());
        assert!((0.0..=1.0).contains(&eval.accuracy));
    }

    #[test]
    fn test_evaluate_empty() {
        let eval = inferencer().evaluate(&[]);
        assert!(eval.loss.is_nan());
        assert_eq!(eval.accuracy, 0.0);
    }

    #[test]
    fn test_count_correct() {
        let device  = Default::default();
        let logits  = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![2.0f32, 1.0, 0.0, 3.0, 5.0, 4.0], [3, 2]),
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![0i64, 1, 1], [3]), &device);
        assert_eq!(count_correct(logits, targets), 2);
    }
}
