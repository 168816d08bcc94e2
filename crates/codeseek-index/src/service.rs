//! `CodeSearch`: the surface exposed to callers (search, status, repository list).

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::embedder::Embedder;
use crate::error::Result;
use crate::repos;
use crate::retriever::CodeRetriever;
use crate::status::{IndexingStatus, StatusHandle};
use crate::types::{SearchQuery, SearchResult};
use crate::vector_store::VectorStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedderState {
    Ready,
    Starting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreState {
    Connected,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedderStatus {
    pub status: EmbedderState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStatus {
    pub status: StoreState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Point-in-time view of every dependency plus indexing progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub status: Health,
    pub embedder: EmbedderStatus,
    pub store: StoreStatus,
    pub index: IndexingStatus,
}

/// Search, status and repository listing over one collection.
#[derive(Clone)]
pub struct CodeSearch {
    retriever: Arc<CodeRetriever>,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    status: StatusHandle,
    collection: String,
    repos_config: PathBuf,
}

impl std::fmt::Debug for CodeSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeSearch")
            .field("collection", &self.collection)
            .field("repos_config", &self.repos_config)
            .finish_non_exhaustive()
    }
}

impl CodeSearch {
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        status: StatusHandle,
        collection: impl Into<String>,
        repos_config: impl Into<PathBuf>,
    ) -> Self {
        let collection = collection.into();
        Self {
            retriever: Arc::new(CodeRetriever::new(
                Arc::clone(&store),
                Arc::clone(&embedder),
                collection.clone(),
            )),
            store,
            embedder,
            status,
            collection,
            repos_config: repos_config.into(),
        }
    }

    /// Indexing progress without probing any backend.
    #[must_use]
    pub fn status_handle(&self) -> &StatusHandle {
        &self.status
    }

    /// # Errors
    ///
    /// See [`CodeRetriever::search`].
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
        self.retriever.search(query).await
    }

    /// Probe the embedder, ping the store and snapshot indexing progress.
    pub async fn status(&self) -> SystemStatus {
        let embedder = if self.embedder.probe().await {
            EmbedderStatus {
                status: EmbedderState::Ready,
                error: None,
            }
        } else {
            EmbedderStatus {
                status: EmbedderState::Starting,
                error: Some("embedding endpoint is not responding".into()),
            }
        };

        let mut index = self.status.snapshot();
        let store = match self.store.ping().await {
            Ok(()) => {
                if index.total_docs == 0 {
                    match self.store.collection_stats(&self.collection).await {
                        Ok(stats) => index.total_docs = stats.map_or(0, |s| s.points_count),
                        Err(e) => tracing::warn!("failed to read collection stats: {e}"),
                    }
                }
                StoreStatus {
                    status: StoreState::Connected,
                    error: None,
                }
            }
            Err(e) => StoreStatus {
                status: StoreState::Error,
                error: Some(e.to_string()),
            },
        };

        let healthy = store.status == StoreState::Connected
            && embedder.status == EmbedderState::Ready
            && index.error.is_none();

        SystemStatus {
            status: if healthy {
                Health::Healthy
            } else {
                Health::Degraded
            },
            embedder,
            store,
            index,
        }
    }

    /// The repository configuration document, verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or not JSON.
    pub async fn repositories(&self) -> Result<serde_json::Value> {
        repos::load_raw(&self.repos_config).await
    }
}
