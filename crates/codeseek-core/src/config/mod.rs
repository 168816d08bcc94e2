mod env;
mod types;


pub use types::*;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use codeseek_index::EmbedderConfig;
use codeseek_index::chunker::ChunkerConfig;

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.embedder.url.trim().is_empty() {
            bail!("embedder.url must not be empty");
        }
        if self.embedder.model.trim().is_empty() {
            bail!("embedder.model must not be empty");
        }
        if self.embedder.dimensions == 0 {
            bail!("embedder.dimensions must be greater than 0");
        }
        if self.embedder.poll_interval_secs == 0 {
            bail!("embedder.poll_interval_secs must be greater than 0");
        }
        if self.embedder.timeout_secs == 0 {
            bail!("embedder.timeout_secs must be greater than 0");
        }
        if self.embedder.probe_timeout_secs == 0 {
            bail!("embedder.probe_timeout_secs must be greater than 0");
        }
        if self.qdrant.url.trim().is_empty() {
            bail!("qdrant.url must not be empty");
        }
        if self.qdrant.collection.trim().is_empty() {
            bail!("qdrant.collection must not be empty");
        }
        if self.index.batch_size == 0 {
            bail!("index.batch_size must be greater than 0");
        }
        if self.index.window_size == 0 {
            bail!("index.window_size must be greater than 0");
        }
        Ok(())
    }

    #[must_use]
    pub fn embedder_config(&self) -> EmbedderConfig {
        EmbedderConfig {
            url: self.embedder.url.clone(),
            model: self.embedder.model.clone(),
            timeout: Duration::from_secs(self.embedder.timeout_secs),
            probe_timeout: Duration::from_secs(self.embedder.probe_timeout_secs),
        }
    }

    #[must_use]
    pub fn chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig {
            window_size: self.index.window_size,
            batch_size: self.index.batch_size,
        }
    }
}
