use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{relu, softmax},
};
use thiserror::Error;

use crate::ml::block::{TransformerBlock, TransformerBlockConfig};

/// Configuration problems caught before any training happens.
#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("input shape mismatch: model expects [*, {expected_timesteps}, {expected_channels}], got {actual:?}")]
    ShapeMismatch {
        expected_timesteps: usize,
        expected_channels:  usize,
        actual:             [usize; 3],
    },

    #[error("invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct TimeSeriesTransformerConfig {
    /// Series length T; also the input width of the dense head
    pub timesteps:   usize,
    pub num_classes: usize,
    pub block:       TransformerBlockConfig,
    #[config(default = 1)]
    pub channels:    usize,
    /// How many times the transformer block is applied
    #[config(default = 2)]
    pub num_transformer: usize,
    /// true  → one block instance applied `num_transformer` times
    /// false → `num_transformer` independently parameterised blocks
    #[config(default = true)]
    pub share_block_weights: bool,
    #[config(default = 64)]
    pub dense_units: usize,
    #[config(default = 0.2)]
    pub dropout: f64,
}

impl TimeSeriesTransformerConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |msg: String| Err(ModelError::InvalidHyperparameter(msg));

        if self.timesteps == 0 || self.channels == 0 {
            return invalid(format!(
                "timesteps ({}) and channels ({}) must be positive",
                self.timesteps, self.channels
            ));
        }
        if self.num_classes < 2 {
            return invalid(format!("need at least 2 classes, got {}", self.num_classes));
        }
        if self.block.d_model != self.channels {
            return invalid(format!(
                "block d_model ({}) must equal input channels ({})",
                self.block.d_model, self.channels
            ));
        }
        if self.block.num_heads == 0 || self.block.head_size == 0 || self.block.num_filters == 0 {
            return invalid("attention heads, head size and filters must be positive".into());
        }
        let out = self.block.output_filters;
        if out != 1 && out != self.channels {
            return invalid(format!(
                "block output filters ({out}) must be 1 or equal to channels ({})",
                self.channels
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) || !(0.0..1.0).contains(&self.block.dropout) {
            return invalid("dropout must be in [0, 1)".into());
        }
        Ok(())
    }

    /// Reject an input shape the model cannot consume.
    pub fn check_input(&self, shape: [usize; 3]) -> Result<(), ModelError> {
        let [_, timesteps, channels] = shape;
        if timesteps != self.timesteps || channels != self.channels {
            return Err(ModelError::ShapeMismatch {
                expected_timesteps: self.timesteps,
                expected_channels:  self.channels,
                actual:             shape,
            });
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<TimeSeriesTransformer<B>, ModelError> {
        self.validate()?;

        let block_count = match (self.num_transformer, self.share_block_weights) {
            (0, _)     => 0,
            (_, true)  => 1,
            (n, false) => n,
        };
        let blocks = (0..block_count).map(|_| self.block.init(device)).collect();

        Ok(TimeSeriesTransformer {
            blocks,
            dense:   LinearConfig::new(self.timesteps, self.dense_units).init(device),
            output:  LinearConfig::new(self.dense_units, self.num_classes).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            num_transformer: self.num_transformer,
        })
    }
}

#[derive(Module, Debug)]
pub struct TimeSeriesTransformer<B: Backend> {
    /// One entry when weights are shared, otherwise one per position
    pub blocks:  Vec<TransformerBlock<B>>,
    pub dense:   Linear<B>,
    pub output:  Linear<B>,
    pub dropout: Dropout,
    pub num_transformer: usize,
}

impl<B: Backend> TimeSeriesTransformer<B> {
    /// inputs: [batch, time, channels] → class logits [batch, classes]
    pub fn forward_logits(&self, inputs: Tensor<B, 3>) -> Tensor<B, 2> {
        let mut x = inputs;
        if !self.blocks.is_empty() {
            for position in 0..self.num_transformer {
                x = self.blocks[position % self.blocks.len()].forward(x);
            }
        }

        // Channels-first global average pooling: axis 1 is read as
        // "channels" and axis 2 as "steps", so the average runs over
        // the trailing axis and [B, T, 1] becomes [B, T].
        let [batch_size, seq_len, _] = x.dims();
        let x = x.mean_dim(2).reshape([batch_size, seq_len]);

        let x = relu(self.dense.forward(x));
        let x = self.dropout.forward(x);
        self.output.forward(x)
    }

    /// Class probabilities; every row sums to 1.
    pub fn forward(&self, inputs: Tensor<B, 3>) -> Tensor<B, 2> {
        softmax(self.forward_logits(inputs), 1)
    }

    /// Sparse categorical cross-entropy against integer targets.
    /// Returns (mean loss, logits).
    pub fn forward_classification(
        &self,
        inputs:  Tensor<B, 3>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward_logits(inputs);
        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets);
        (loss, logits)
    }

    /// Number of distinct parameterised blocks.
    pub fn distinct_blocks(&self) -> usize {
        self.blocks.len()
    }
}
