// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Optional run artifacts. Nothing is written unless the user
// passes --artifact-dir.
//
// What gets saved:
//   1. train_config.json  — run configuration (serde_json)
//   2. model_config.json  — architecture (burn Config), needed to
//                           rebuild the network before loading
//   3. model.mpk.gz       — final weights (half precision, gzipped MessagePack)
//
// The recorder serialises parameters to named MessagePack, gzips
// them, and refuses to load into a mismatched architecture.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    config::Config,
    prelude::*,
    record::{HalfPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{TimeSeriesTransformer, TimeSeriesTransformerConfig};

const MODEL_FILE: &str        = "model";
const RUN_CONFIG_FILE: &str   = "train_config.json";
const MODEL_CONFIG_FILE: &str = "model_config.json";

type WeightsRecorder = NamedMpkGzFileRecorder<HalfPrecisionSettings>;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager and its directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create artifact directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Attach to a directory written by an earlier run.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        anyhow::ensure!(
            dir.is_dir(),
            "Artifact directory '{}' does not exist. Train with --artifact-dir first.",
            dir.display()
        );
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Save model weights; the recorder appends the .mpk.gz extension.
    pub fn save_model<B: Backend>(&self, model: &TimeSeriesTransformer<B>) -> Result<()> {
        let path = self.dir.join(MODEL_FILE);

        WeightsRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save weights to '{}'", path.display())
            })?;

        tracing::debug!("Saved weights to '{}'", path.display());
        Ok(())
    }

    /// Load saved weights into a model of the same architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  TimeSeriesTransformer<B>,
        device: &B::Device,
    ) -> Result<TimeSeriesTransformer<B>> {
        let path = self.dir.join(MODEL_FILE);

        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load weights '{}'. Was the run saved with --artifact-dir?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(RUN_CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved run config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(RUN_CONFIG_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;

        Ok(serde_json::from_str(&json)?)
    }

    pub fn save_model_config(&self, cfg: &TimeSeriesTransformerConfig) -> Result<()> {
        let path = self.dir.join(MODEL_CONFIG_FILE);
        cfg.save(&path)
            .with_context(|| format!("Cannot write model config to '{}'", path.display()))
    }

    pub fn load_model_config(&self) -> Result<TimeSeriesTransformerConfig> {
        let path = self.dir.join(MODEL_CONFIG_FILE);
        TimeSeriesTransformerConfig::load(&path).map_err(|e| {
            anyhow::anyhow!("Cannot read model config '{}': {e:?}", path.display())
        })
    }
}
