// ============================================================
// Layer 4 — Series Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<TimeSeriesSample>
// into model-ready tensors.
//
// How batching works here:
//   Input:  N samples, each holding T * D values (time-major)
//   Output: inputs  [N, T, D] float tensor
//           targets [N]       int tensor of class indices
//
//   All values are flattened into one Vec in sample order and the
//   TensorData is given the final 3-D shape directly:
//   [s1_t1, s1_t2, ..., s1_tT, s2_t1, ..., sN_tT] → [N, T, D]
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::domain::series::TimeSeriesSample;

// ─── SeriesBatch ──────────────────────────────────────────────────────────────
/// A batch of series ready for the forward pass.
#[derive(Debug, Clone)]
pub struct SeriesBatch<B: Backend> {
    /// Observations — shape: [batch_size, timesteps, channels]
    pub inputs: Tensor<B, 3>,

    /// Class index per sample — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

// ─── SeriesBatcher ────────────────────────────────────────────────────────────
/// Holds the target device and the channel count so the flat
/// value vectors can be given their (T, D) layout.
#[derive(Clone, Debug)]
pub struct SeriesBatcher<B: Backend> {
    pub device:   B::Device,
    pub channels: usize,
}

impl<B: Backend> SeriesBatcher<B> {
    pub fn with_channels(device: B::Device, channels: usize) -> Self {
        Self { device, channels }
    }
}

impl<B: Backend> Batcher<TimeSeriesSample, SeriesBatch<B>> for SeriesBatcher<B> {
    fn batch(&self, items: Vec<TimeSeriesSample>) -> SeriesBatch<B> {
        let batch_size = items.len();
        // All samples share one width (checked when the SeriesSet was built)
        let width      = items.first().map(|s| s.values.len()).unwrap_or(0);
        let timesteps  = width / self.channels;

        let values: Vec<f32> = items
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .collect();

        let labels: Vec<i64> = items
            .iter()
            .map(|s| s.label as i64)
            .collect();

        let inputs = Tensor::<B, 3>::from_data(
            TensorData::new(values, [batch_size, timesteps, self.channels]),
            &self.device,
        );

        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]),
            &self.device,
        );

        SeriesBatch { inputs, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_batch_shapes_and_values() {
        let device  = Default::default();
        let batcher = SeriesBatcher::<TestBackend>::with_channels(device, 1);

        let batch = batcher.batch(vec![
            TimeSeriesSample::new(vec![1.0, 2.0, 3.0], 0),
            TimeSeriesSample::new(vec![4.0, 5.0, 6.0], 1),
        ]);

        assert_eq!(batch.inputs.dims(), [2, 3, 1]);
        assert_eq!(batch.targets.dims(), [2]);

        let values = batch.inputs.into_data().to_vec::<f32>().unwrap();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_multichannel_layout() {
        let device  = Default::default();
        let batcher = SeriesBatcher::<TestBackend>::with_channels(device, 2);

        let batch = batcher.batch(vec![TimeSeriesSample::new(vec![0.0; 8], 1)]);
        assert_eq!(batch.inputs.dims(), [1, 4, 2]);
    }
}
