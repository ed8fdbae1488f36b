// ============================================================
// Layer 4 — Dataset Sources
// ============================================================
// Where the raw tab-separated tables come from.
//
// The UCR archive serves FordA as plain files over HTTPS, so the
// default source is a blocking GET with reqwest. A location that
// does not start with http:// or https:// is read from disk.
// Retrieval failures are not retried.
//
// Reference: reqwest::blocking documentation
//            Rust Book §9 (Error Handling)

use anyhow::Result;
use std::{fs, path::PathBuf};
use thiserror::Error;

use crate::domain::traits::DatasetSource;

/// Default FordA partitions (UCR time-series archive mirror).
pub const FORDA_TRAIN_URL: &str =
    "https://raw.githubusercontent.com/hfawaz/cd-diagram/master/FordA/FordA_TRAIN.tsv";
pub const FORDA_TEST_URL: &str =
    "https://raw.githubusercontent.com/hfawaz/cd-diagram/master/FordA/FordA_TEST.tsv";

/// Failures while fetching the raw table.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request to '{url}' failed: {source}")]
    Network {
        url:    String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot read '{path}': {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ─── RemoteSource ─────────────────────────────────────────────────────────────
pub struct RemoteSource {
    url: String,
}

impl RemoteSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    fn fetch(&self) -> Result<String, SourceError> {
        let network = |source| SourceError::Network { url: self.url.clone(), source };

        let response = reqwest::blocking::get(&self.url)
            .and_then(|r| r.error_for_status())
            .map_err(network)?;
        response.text().map_err(network)
    }
}

impl DatasetSource for RemoteSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn read_to_string(&self) -> Result<String> {
        tracing::info!("Downloading '{}'", self.url);
        let text = self.fetch()?;
        tracing::debug!("Received {} bytes from '{}'", text.len(), self.url);
        Ok(text)
    }
}

// ─── LocalSource ──────────────────────────────────────────────────────────────
pub struct LocalSource {
    path: PathBuf,
}

impl LocalSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for LocalSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_to_string(&self) -> Result<String> {
        let text = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(text)
    }
}

/// Pick a source for a location string: URLs go over HTTP,
/// anything else is treated as a file path.
pub fn source_for(location: &str) -> Box<dyn DatasetSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(RemoteSource::new(location))
    } else {
        Box::new(LocalSource::new(location))
    }
}
