// ============================================================
// Layer 5 — Early Stopping
// ============================================================
// Watches one scalar per epoch (validation loss) and decides when
// to stop training:
//
//   improved  ⇔ value < best - min_delta
//   stale epochs counter resets on improvement, otherwise +1
//   stop once the counter reaches `patience`
//
// With restore_best_weights the model snapshot taken at the best
// epoch replaces the current one, but only when stopping actually
// triggered. Reaching the epoch cap keeps the last weights.
//
// Generic over the snapshot type so the policy can be tested
// without building a network.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarlyStoppingConfig {
    pub patience:             usize,
    pub min_delta:            f64,
    pub restore_best_weights: bool,
}

impl Default for EarlyStoppingConfig {
    fn default() -> Self {
        Self { patience: 10, min_delta: 0.0, restore_best_weights: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    Continue,
    Stop,
}

pub struct EarlyStopping<M> {
    config:       EarlyStoppingConfig,
    best:         f64,
    best_epoch:   Option<usize>,
    wait:         usize,
    best_model:   Option<M>,
    stopped_epoch: Option<usize>,
}

impl<M: Clone> EarlyStopping<M> {
    pub fn new(config: EarlyStoppingConfig) -> Self {
        Self {
            config,
            best:          f64::INFINITY,
            best_epoch:    None,
            wait:          0,
            best_model:    None,
            stopped_epoch: None,
        }
    }

    /// Record the monitored value for `epoch` (1-based) and the
    /// model that produced it.
    pub fn observe(&mut self, epoch: usize, value: f64, model: &M) -> StopDecision {
        if value < self.best - self.config.min_delta {
            self.best       = value;
            self.best_epoch = Some(epoch);
            self.wait       = 0;
            if self.config.restore_best_weights {
                self.best_model = Some(model.clone());
            }
            return StopDecision::Continue;
        }

        self.wait += 1;
        if self.wait >= self.config.patience {
            self.stopped_epoch = Some(epoch);
            tracing::info!(
                "Early stopping at epoch {}: no improvement for {} epochs (best {:.4} at epoch {:?})",
                epoch, self.wait, self.best, self.best_epoch
            );
            return StopDecision::Stop;
        }
        StopDecision::Continue
    }

    pub fn best_epoch(&self) -> Option<usize> { self.best_epoch }

    pub fn stopped_epoch(&self) -> Option<usize> { self.stopped_epoch }

    /// Final model: the best snapshot if stopping triggered and
    /// restoring is enabled, otherwise `current`.
    pub fn finish(self, current: M) -> M {
        match (self.stopped_epoch, self.best_model) {
            (Some(_), Some(best)) if self.config.restore_best_weights => {
                tracing::info!("Restoring weights from epoch {:?}", self.best_epoch);
                best
            }
            _ => current,
        }
    }
}
