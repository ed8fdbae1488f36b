// ============================================================
// Layer 5 — Pre-Norm Transformer Block
// ============================================================
// One residual self-attention unit followed by a position-wise
// 1x1-convolution feed-forward unit:
//
//   h   = norm(x)
//   h   = attention(h)               (self-attention, q = k = v)
//   res = dropout(h) + x             ← first residual
//   h   = norm(res)                  (same LayerNorm as above)
//   h   = conv1x1(D → filters), relu, dropout
//   h   = conv1x1(filters → out)     (out = 1 for FordA)
//   y   = h + res                    ← second residual
//
// A single LayerNorm instance serves both normalisation points.
//
// Conv1d in Burn expects [batch, channels, length], while the
// block works on [batch, time, channels], so the feed-forward
// path swaps axes 1 and 2 on the way in and out.
//
// When `out` < D the collapsed tensor is broadcast over the channel
// axis before the second residual, so the output is always
// [batch, time, D].
//
// Reference: Xiong et al. (2020) On Layer Normalization in the
//            Transformer Architecture (pre-LN)
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        Dropout, DropoutConfig,
        LayerNorm, LayerNormConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::attention::{SelfAttention, SelfAttentionConfig};

#[derive(Config, Debug)]
pub struct TransformerBlockConfig {
    /// Channel count of the series (D)
    pub d_model: usize,
    #[config(default = 4)]
    pub num_heads: usize,
    #[config(default = 128)]
    pub head_size: usize,
    /// Channels of the expanding 1x1 convolution
    #[config(default = 4)]
    pub num_filters: usize,
    /// Channels of the collapsing 1x1 convolution
    #[config(default = 1)]
    pub output_filters: usize,
    #[config(default = 0.2)]
    pub dropout: f64,
    #[config(default = 1e-6)]
    pub norm_epsilon: f64,
}

impl TransformerBlockConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TransformerBlock<B> {
        let attention = SelfAttentionConfig::new(self.d_model)
            .with_n_heads(self.num_heads)
            .with_head_dim(self.head_size)
            .with_dropout(self.dropout)
            .init(device);

        TransformerBlock {
            norm: LayerNormConfig::new(self.d_model)
                .with_epsilon(self.norm_epsilon)
                .init(device),
            attention,
            expand:   Conv1dConfig::new(self.d_model, self.num_filters, 1).init(device),
            collapse: Conv1dConfig::new(self.num_filters, self.output_filters, 1).init(device),
            dropout:  DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct TransformerBlock<B: Backend> {
    pub norm:      LayerNorm<B>,
    pub attention: SelfAttention<B>,
    pub expand:    Conv1d<B>,
    pub collapse:  Conv1d<B>,
    pub dropout:   Dropout,
}

impl<B: Backend> TransformerBlock<B> {
    /// x: [batch, time, channels] → same shape
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch_size, seq_len, channels] = x.dims();

        let h   = self.attention.forward(self.norm.forward(x.clone()));
        let res = self.dropout.forward(h) + x;

        let h = self.norm.forward(res.clone()).swap_dims(1, 2); // [B, D, T]
        let h = relu(self.expand.forward(h));
        let h = self.dropout.forward(h);
        let h = self.collapse.forward(h).swap_dims(1, 2); // [B, T, out]

        let h = if h.dims()[2] == channels {
            h
        } else {
            h.expand([batch_size, seq_len, channels])
        };

        h + res
    }
}
