use burn::data::dataset::Dataset;

use crate::domain::series::TimeSeriesSample;

/// Burn view over a list of series so the DataLoader can
/// call `get(index)` and `len()` on it.
pub struct SeriesDataset {
    samples: Vec<TimeSeriesSample>,
}

impl SeriesDataset {
    pub fn new(samples: Vec<TimeSeriesSample>) -> Self { Self { samples } }
}

impl Dataset<TimeSeriesSample> for SeriesDataset {
    fn get(&self, index: usize) -> Option<TimeSeriesSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
