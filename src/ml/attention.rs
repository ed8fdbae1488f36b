// ============================================================
// Layer 5 — Multi-Head Self-Attention
// ============================================================
// Burn's built-in MultiHeadAttention splits d_model across the
// heads (head width = d_model / n_heads), which cannot express a
// 1-channel series attended by 4 heads of width 128. This module
// projects to an independent head space instead:
//
//   x       [B, T, D]
//   Q, K, V [B, T, H*Dh] → [B, H, T, Dh]
//   scores  Q Kᵀ / sqrt(Dh)        [B, H, T, T]
//   weights softmax over keys, then dropout (training only)
//   context weights · V → [B, T, H*Dh] → output projection [B, T, D]
//
// Reference: Vaswani et al. (2017) Attention Is All You Need
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::softmax,
};

#[derive(Config, Debug)]
pub struct SelfAttentionConfig {
    /// Channel count of the input and output
    pub d_model: usize,
    #[config(default = 4)]
    pub n_heads: usize,
    /// Width of each head's query/key/value projection
    #[config(default = 128)]
    pub head_dim: usize,
    /// Dropout applied to the attention weights
    #[config(default = 0.2)]
    pub dropout: f64,
}

impl SelfAttentionConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SelfAttention<B> {
        let inner = self.n_heads * self.head_dim;
        SelfAttention {
            query:    LinearConfig::new(self.d_model, inner).init(device),
            key:      LinearConfig::new(self.d_model, inner).init(device),
            value:    LinearConfig::new(self.d_model, inner).init(device),
            output:   LinearConfig::new(inner, self.d_model).init(device),
            dropout:  DropoutConfig::new(self.dropout).init(),
            n_heads:  self.n_heads,
            head_dim: self.head_dim,
        }
    }
}

#[derive(Module, Debug)]
pub struct SelfAttention<B: Backend> {
    pub query:  Linear<B>,
    pub key:    Linear<B>,
    pub value:  Linear<B>,
    pub output: Linear<B>,
    pub dropout: Dropout,
    pub n_heads:  usize,
    pub head_dim: usize,
}

impl<B: Backend> SelfAttention<B> {
    /// x: [batch, time, d_model] → [batch, time, d_model]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch_size, seq_len, _] = x.dims();

        let q = self.split_heads(self.query.forward(x.clone()));
        let k = self.split_heads(self.key.forward(x.clone()));
        let v = self.split_heads(self.value.forward(x));

        let scale   = (self.head_dim as f64).sqrt();
        let scores  = q.matmul(k.swap_dims(2, 3)).div_scalar(scale);
        let weights = self.dropout.forward(softmax(scores, 3));

        let context = weights
            .matmul(v)
            .swap_dims(1, 2)
            .reshape([batch_size, seq_len, self.n_heads * self.head_dim]);

        self.output.forward(context)
    }

    // [B, T, H*Dh] → [B, H, T, Dh]
    fn split_heads(&self, x: Tensor<B, 3>) -> Tensor<B, 4> {
        let [batch_size, seq_len, _] = x.dims();
        x.reshape([batch_size, seq_len, self.n_heads, self.head_dim])
            .swap_dims(1, 2)
    }
}
