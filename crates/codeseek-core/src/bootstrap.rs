//! Application bootstrap: config resolution and pipeline construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use codeseek_index::manifest::IndexManifest;
use codeseek_index::{
    CodeIndexer, CodeSearch, Embedder, HttpEmbedder, IndexerConfig, QdrantOps, RepoFetcher,
    VectorStore,
};

use crate::config::Config;

pub struct AppBuilder {
    config: Config,
    config_path: PathBuf,
}

/// The two long-lived halves of the service, sharing one store and one embedder.
pub struct App {
    pub indexer: CodeIndexer,
    pub search: CodeSearch,
}

impl AppBuilder {
    /// Resolve config path, load and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be parsed or is invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        let config_path = resolve_config_path();
        let config = Config::load(&config_path)?;
        config.validate()?;
        Ok(Self {
            config,
            config_path,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the config is invalid.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            config_path: PathBuf::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// # Errors
    ///
    /// Returns an error if the Qdrant URL is invalid.
    pub fn build_store(&self) -> anyhow::Result<Arc<dyn VectorStore>> {
        let ops = QdrantOps::new(&self.config.qdrant.url, self.config.qdrant.api_key.as_deref())
            .with_context(|| {
                format!("failed to create Qdrant client for {}", self.config.qdrant.url)
            })?;
        tracing::info!(url = %self.config.qdrant.url, "Qdrant client configured");
        Ok(Arc::new(ops))
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn build_embedder(&self) -> anyhow::Result<Arc<dyn Embedder>> {
        let embedder = HttpEmbedder::new(self.config.embedder_config())
            .context("failed to build embedding client")?;
        tracing::info!(
            url = %self.config.embedder.url,
            model = %self.config.embedder.model,
            "embedding client configured"
        );
        Ok(Arc::new(embedder))
    }

    #[must_use]
    pub fn indexer_config(&self) -> IndexerConfig {
        let collection = self.config.qdrant.collection.clone();
        IndexerConfig {
            manifest_path: IndexManifest::path_for(&self.config.index.repos_dir, &collection),
            collection,
            dimensions: self.config.embedder.dimensions,
            repos_config: self.config.index.repos_config.clone(),
            poll_interval: Duration::from_secs(self.config.embedder.poll_interval_secs),
            chunker: self.config.chunker_config(),
        }
    }

    /// Wire the indexer and the search service over the given backends.
    #[must_use]
    pub fn build_with(&self, store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> App {
        let fetcher = RepoFetcher::new(&self.config.index.repos_dir)
            .with_base_url(self.config.index.git_base_url.as_str());
        let indexer = CodeIndexer::new(
            Arc::clone(&store),
            Arc::clone(&embedder),
            fetcher,
            self.indexer_config(),
        );
        let search = CodeSearch::new(
            store,
            embedder,
            indexer.status(),
            self.config.qdrant.collection.clone(),
            self.config.index.repos_config.clone(),
        );
        App { indexer, search }
    }

    /// # Errors
    ///
    /// Returns an error if either backend client cannot be constructed.
    pub fn build(&self) -> anyhow::Result<App> {
        let store = self.build_store()?;
        let embedder = self.build_embedder()?;
        Ok(self.build_with(store, embedder))
    }
}

/// `--config <path>`, then `CODESEEK_CONFIG`, then `config/default.toml`.
#[must_use]
pub fn resolve_config_path() -> PathBuf {
    let args: Vec<String> = std::env::args().collect();
    if let Some(path) = args.windows(2).find(|w| w[0] == "--config").map(|w| &w[1]) {
        return PathBuf::from(path);
    }
    if let Ok(path) = std::env::var("CODESEEK_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}
