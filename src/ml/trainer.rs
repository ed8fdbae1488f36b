// ============================================================
// Layer 5 — Training Loop
// ============================================================
// fit() = validation split + epoch loop + early stopping.
//
//   - Training runs on an AutodiffBackend so loss.backward() works
//   - model.valid() returns the model on B::InnerBackend, which
//     disables dropout for validation and skips graph tracking
//   - Adam: θ ← θ - lr · m̂ / (√v̂ + ε), lr = 1e-4, ε = 1e-7
//   - Loss: sparse categorical cross-entropy (integer targets)
//
// Reference: Burn Book §5 (Training)
//            Kingma & Ba (2015) Adam

use anyhow::{ensure, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};

use crate::data::{batcher::SeriesBatcher, dataset::SeriesDataset, splitter::split_validation};
use crate::domain::series::TimeSeriesSample;
use crate::infra::metrics::EpochMetrics;
use crate::ml::early_stopping::{EarlyStopping, EarlyStoppingConfig, StopDecision};
use crate::ml::inferencer::{count_correct, Inferencer};
use crate::ml::model::TimeSeriesTransformer;

#[derive(Config, Debug)]
pub struct FitConfig {
    #[config(default = 1)]
    pub epochs: usize,
    #[config(default = 64)]
    pub batch_size: usize,
    #[config(default = 1e-4)]
    pub learning_rate: f64,
    /// Tail fraction of the training rows held out for validation
    #[config(default = 0.2)]
    pub validation_split: f64,
    #[config(default = 10)]
    pub patience: usize,
    #[config(default = 0.0)]
    pub min_delta: f64,
    #[config(default = true)]
    pub restore_best_weights: bool,
    /// Seed for the per-epoch batch shuffling
    #[config(default = 42)]
    pub seed: u64,
    #[config(default = 1)]
    pub channels: usize,
}

impl FitConfig {
    fn early_stopping(&self) -> EarlyStoppingConfig {
        EarlyStoppingConfig {
            patience:             self.patience,
            min_delta:            self.min_delta,
            restore_best_weights: self.restore_best_weights,
        }
    }
}

pub struct FitOutcome<B: AutodiffBackend> {
    pub model:         TimeSeriesTransformer<B>,
    pub history:       Vec<EpochMetrics>,
    pub best_epoch:    Option<usize>,
    pub stopped_epoch: Option<usize>,
}

/// Train `model` on `samples`.
///
/// `on_epoch` sees every epoch's metrics as soon as they are
/// known (progress output, CSV logging).
pub fn fit<B, F>(
    model:        TimeSeriesTransformer<B>,
    samples:      Vec<TimeSeriesSample>,
    cfg:          &FitConfig,
    device:       &B::Device,
    mut on_epoch: F,
) -> Result<FitOutcome<B>>
where
    B: AutodiffBackend,
    F: FnMut(&EpochMetrics) -> Result<()>,
{
    ensure!(cfg.batch_size > 0, "batch size must be positive");
    ensure!(cfg.learning_rate >= 0.0, "learning rate must not be negative");

    let (train_samples, val_samples) = split_validation(samples, cfg.validation_split)?;
    tracing::info!(
        "Fitting on {} samples, validating on {}",
        train_samples.len(),
        val_samples.len()
    );

    if cfg.epochs == 0 {
        return Ok(FitOutcome { model, history: Vec::new(), best_epoch: None, stopped_epoch: None });
    }
    ensure!(!train_samples.is_empty(), "no training samples left after the validation split");

    let mut model = model;
    let mut optim = AdamConfig::new().with_epsilon(1e-7).init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_count  = train_samples.len();
    let train_loader = DataLoaderBuilder::new(SeriesBatcher::<B>::with_channels(device.clone(), cfg.channels))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(SeriesDataset::new(train_samples));

    let mut stopper = EarlyStopping::new(cfg.early_stopping());
    let mut history = Vec::with_capacity(cfg.epochs);

    for epoch in 1..=cfg.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut correct  = 0usize;
        let mut batches  = 0usize;

        for batch in train_loader.iter() {
            let batch_size = batch.targets.dims()[0];
            let (loss, logits) = model.forward_classification(batch.inputs, batch.targets.clone());

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            loss_sum += loss_val * batch_size as f64;
            correct  += count_correct(logits.detach(), batch.targets);
            batches  += 1;

            tracing::debug!("Epoch {} batch {}: loss={:.4}", epoch, batches, loss_val);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let validation = (!val_samples.is_empty()).then(|| {
            Inferencer::new(model.valid(), device.clone(), cfg.channels, cfg.batch_size)
                .evaluate(&val_samples)
        });

        let metrics = EpochMetrics {
            epoch,
            train_loss: loss_sum / train_count as f64,
            train_acc:  correct as f64 / train_count as f64,
            val_loss:   validation.map(|v| v.loss),
            val_acc:    validation.map(|v| v.accuracy),
        };

        tracing::info!(
            "Epoch {}/{} | loss={:.4} acc={:.4} | val_loss={:?} val_acc={:?}",
            epoch, cfg.epochs, metrics.train_loss, metrics.train_acc,
            metrics.val_loss, metrics.val_acc,
        );
        on_epoch(&metrics)?;

        let decision = stopper.observe(epoch, metrics.monitored_loss(), &model);
        history.push(metrics);
        if decision == StopDecision::Stop {
            break;
        }
    }

    let best_epoch    = stopper.best_epoch();
    let stopped_epoch = stopper.stopped_epoch();
    let model         = stopper.finish(model);

    tracing::info!("Training complete after {} epochs", history.len());
    Ok(FitOutcome { model, history, best_epoch, stopped_epoch })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{block::TransformerBlockConfig, model::TimeSeriesTransformerConfig};
    use burn::backend::{Autodiff, NdArray};
    use burn::module::{ModuleVisitor, ParamId};

    type TestBackend = Autodiff<NdArray>;

    const TIMESTEPS: usize = 8;

    fn model(device: &<TestBackend as Backend>::Device) -> TimeSeriesTransformer<TestBackend> {
        TestBackend::seed(3);
        TimeSeriesTransformerConfig::new(TIMESTEPS, 2, TransformerBlockConfig::new(1).with_head_size(8))
            .with_dense_units(8)
            .init(device)
            .unwrap()
    }

    /// Class 0 is a rising ramp, class 1 a falling one.
    fn samples(n: usize) -> Vec<TimeSeriesSample> {
        (0..n)
            .map(|i| {
                let label  = i % 2;
                let values = (0..TIMESTEPS)
                    .map(|t| {
                        let ramp = t as f32 / TIMESTEPS as f32;
                        if label == 0 { ramp } else { 1.0 - ramp }
                    })
                    .collect();
                TimeSeriesSample::new(values, label)
            })
            .collect()
    }

    /// Flattens every float parameter of a module, blocks included.
    struct ParamCollector {
        values: Vec<f32>,
    }

    impl<B: Backend> ModuleVisitor<B> for ParamCollector {
        fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
            self.values.extend(tensor.to_data().to_vec::<f32>().unwrap());
        }
    }

    fn weights(model: &TimeSeriesTransformer<TestBackend>) -> Vec<f32> {
        let mut collector = ParamCollector { values: Vec::new() };
        model.visit(&mut collector);
        collector.values
    }

    /// Same ramps, but the validation tail carries the opposite labels,
    /// so fitting the training rows makes the validation loss worse.
    fn contradicted_samples(n: usize) -> Vec<TimeSeriesSample> {
        let mut data  = samples(n);
        let split     = n - n / 5;
        for s in &mut data[split..] {
            s.label = 1 - s.label;
        }
        data
    }

    #[test]
    fn test_zero_epochs_leave_parameters_unchanged() {
        let device = Default::default();
        let model  = model(&device);
        let before = weights(&model);

        let cfg     = FitConfig::new().with_epochs(0).with_batch_size(4);
        let outcome = fit(model, samples(16), &cfg, &device, |_| Ok(())).unwrap();

        assert!(outcome.history.is_empty());
        assert_eq!(weights(&outcome.model), before);
    }

    #[test]
    fn test_one_epoch_reports_finite_metrics() {
        let device = Default::default();
        let cfg    = FitConfig::new().with_batch_size(4);

        let mut seen = Vec::new();
        let outcome = fit(model(&device), samples(20), &cfg, &device, |m| {
            seen.push(m.epoch);
            Ok(())
        })
        .unwrap();

        assert_eq!(seen, vec![1]);
        let m = &outcome.history[0];
        assert!(m.train_loss.is_finite());
        assert!((0.0..=1.0).contains(&m.train_acc));
        assert!(m.val_loss.map_or(false, f64::is_finite));
        assert!(m.val_acc.map_or(false, |a| (0.0..=1.0).contains(&a)));
    }

    #[test]
    fn test_training_changes_parameters() {
        let device = Default::default();
        let model  = model(&device);
        let before = weights(&model);

        let cfg     = FitConfig::new().with_batch_size(4).with_learning_rate(1e-2);
        let outcome = fit(model, samples(16), &cfg, &device, |_| Ok(())).unwrap();
        assert_ne!(weights(&outcome.model), before);
    }

    #[test]
    fn test_early_stopping_halts_before_epoch_cap() {
        // lr = 0 keeps the validation loss exactly constant, so epoch 1
        // stays the best and every later epoch is stale.
        let device = Default::default();
        let model  = model(&device);
        let before = weights(&model);

        let cfg = FitConfig::new()
            .with_epochs(50)
            .with_batch_size(4)
            .with_learning_rate(0.0)
            .with_patience(3);
        let outcome = fit(model, samples(20), &cfg, &device, |_| Ok(())).unwrap();

        assert_eq!(outcome.history.len(), 4);
        assert_eq!(outcome.best_epoch, Some(1));
        assert_eq!(outcome.stopped_epoch, Some(4));
        assert_eq!(weights(&outcome.model), before);
    }

    #[test]
    fn test_early_stopping_restores_best_validation_weights() {
        let device = Default::default();
        let data   = contradicted_samples(20);
        let (_, val_tail) = split_validation(data.clone(), 0.2).unwrap();

        let cfg = FitConfig::new()
            .with_epochs(40)
            .with_batch_size(4)
            .with_learning_rate(0.05)
            .with_patience(2);
        let outcome = fit(model(&device), data, &cfg, &device, |_| Ok(())).unwrap();

        let stopped = outcome.stopped_epoch.expect("validation loss should stall");
        let best    = outcome.best_epoch.expect("first epoch always sets a best");
        assert!(stopped < 40);
        assert!(best < stopped);

        let best_loss = outcome.history[best - 1].val_loss.unwrap();
        let reloaded  = Inferencer::new(outcome.model.valid(), device, 1, cfg.batch_size)
            .evaluate(&val_tail);
        assert!((reloaded.loss - best_loss).abs() < 1e-6);

        let last_loss = outcome.history.last().and_then(|m| m.val_loss).unwrap();
        assert!(last_loss >= best_loss);
    }

    #[test]
    fn test_without_validation_split() {
        let device = Default::default();
        let cfg    = FitConfig::new().with_batch_size(8).with_validation_split(0.0);

        let outcome = fit(model(&device), samples(8), &cfg, &device, |_| Ok(())).unwrap();
        assert!(outcome.history[0].val_loss.is_none());
    }

    #[test]
    fn test_invalid_settings_fail_before_training() {
        let device = Default::default();
        let zero_batch = FitConfig::new().with_batch_size(0);
        assert!(fit(model(&device), samples(8), &zero_batch, &device, |_| Ok(())).is_err());

        let bad_split = FitConfig::new().with_validation_split(1.5);
        assert!(fit(model(&device), samples(8), &bad_split, &device, |_| Ok(())).is_err());
    }

    #[test]
    fn test_callback_error_aborts() {
        let device = Default::default();
        let cfg    = FitConfig::new().with_epochs(3).with_batch_size(4);
        let result = fit(model(&device), samples(8), &cfg, &device, |_| anyhow::bail!("disk full"));
        assert!(result.is_err());
    }
}
