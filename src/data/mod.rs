// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From a remote TSV file to tensor batches:
//
//   DatasetSource     → HTTP download or local file
//       │
//       ▼
//   UcrLoader         → parse rows, remap labels, (N, T, 1) samples
//       │
//       ▼
//   shuffle_samples   → one random permutation of the training rows
//       │
//       ▼
//   split_validation  → tail of the training rows held out
//       │
//       ▼
//   SeriesDataset     → implements Burn's Dataset trait
//       │
//       ▼
//   SeriesBatcher     → stacks samples into [batch, T, D] tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// HTTP / file / in-memory table sources
pub mod source;

/// Parses UCR tab-separated tables
pub mod loader;

/// Implements Burn's Dataset trait for series samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Splits the training rows into train/validation
pub mod splitter;
