// ============================================================
// Layer 3 — Time-Series Domain Types
// ============================================================
// A labelled univariate series and the ordered set that holds
// every series of one partition (train or test).
//
// Shape convention used everywhere downstream:
//   (samples, time-steps, channels) — FordA has channels = 1
//
// Reference: Rust Book §5 (Structs and Methods)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// One labelled observation sequence.
///
/// `values` is stored time-major: `values[t * channels + c]`.
/// With a single channel this is simply the ordered series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesSample {
    pub values: Vec<f32>,
    pub label:  usize,
}

impl TimeSeriesSample {
    pub fn new(values: Vec<f32>, label: usize) -> Self {
        Self { values, label }
    }
}

/// An ordered collection of samples that all share the same
/// number of time steps and channels.
#[derive(Debug, Clone, Default)]
pub struct SeriesSet {
    samples:   Vec<TimeSeriesSample>,
    timesteps: usize,
    channels:  usize,
}

impl SeriesSet {
    /// Build a set of single-channel series.
    /// Fails if the samples do not all have the same length.
    pub fn new(samples: Vec<TimeSeriesSample>) -> Result<Self> {
        Self::with_channels(samples, 1)
    }

    pub fn with_channels(samples: Vec<TimeSeriesSample>, channels: usize) -> Result<Self> {
        if channels == 0 {
            bail!("a series set needs at least one channel");
        }
        let width = samples.first().map(|s| s.values.len()).unwrap_or(0);
        if width % channels != 0 {
            bail!("sample width {width} is not divisible by {channels} channels");
        }
        if let Some((row, s)) = samples
            .iter()
            .enumerate()
            .find(|(_, s)| s.values.len() != width)
        {
            bail!(
                "sample {row} has {} values, expected {width} like the first sample",
                s.values.len()
            );
        }
        Ok(Self { samples, timesteps: width / channels, channels })
    }

    pub fn len(&self) -> usize { self.samples.len() }

    pub fn timesteps(&self) -> usize { self.timesteps }

    pub fn channels(&self) -> usize { self.channels }

    /// (N, T, D) view of the whole set.
    pub fn shape(&self) -> [usize; 3] {
        [self.samples.len(), self.timesteps, self.channels]
    }

    /// Largest label + 1. For FordA after remapping this is 2.
    pub fn num_classes(&self) -> usize {
        self.samples.iter().map(|s| s.label + 1).max().unwrap_or(0)
    }

    pub fn samples(&self) -> &[TimeSeriesSample] { &self.samples }

    pub fn into_samples(self) -> Vec<TimeSeriesSample> { self.samples }

    /// Rebuild a set after the sample order was changed (e.g. shuffled).
    /// Shape metadata is kept as-is.
    pub fn map_samples<F>(self, f: F) -> Self
    where
        F: FnOnce(Vec<TimeSeriesSample>) -> Vec<TimeSeriesSample>,
    {
        let Self { samples, timesteps, channels } = self;
        Self { samples: f(samples), timesteps, channels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_and_classes() {
        let set = SeriesSet::new(vec![
            TimeSeriesSample::new(vec![0.1, 0.2, 0.3], 0),
            TimeSeriesSample::new(vec![0.4, 0.5, 0.6], 1),
        ])
        .unwrap();
        assert_eq!(set.shape(), [2, 3, 1]);
        assert_eq!(set.num_classes(), 2);
    }

    #[test]
    fn test_rejects_ragged_samples() {
        let result = SeriesSet::new(vec![
            TimeSeriesSample::new(vec![0.1, 0.2, 0.3], 0),
            TimeSeriesSample::new(vec![0.4, 0.5], 1),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_multichannel_width() {
        let set = SeriesSet::with_channels(
            vec![TimeSeriesSample::new(vec![0.0; 6], 0)],
            2,
        )
        .unwrap();
        assert_eq!(set.shape(), [1, 3, 2]);
    }

    #[test]
    fn test_empty_set() {
        let set = SeriesSet::new(Vec::new()).unwrap();
        assert_eq!(set.len(), 0);
        assert_eq!(set.num_classes(), 0);
    }
}
