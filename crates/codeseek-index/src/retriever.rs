//! Similarity search over the indexed collection with an optional repository allow-list.

use std::sync::Arc;

use crate::embedder::{EmbedMode, Embedder};
use crate::error::{IndexError, Result};
use crate::types::{CodeSnippet, SearchQuery, SearchResult};
use crate::vector_store::{VectorFilter, VectorStore};

/// Payload key the allow-list filter matches on.
pub const REPO_NAME_FIELD: &str = "repo.name";

/// Embeds queries and ranks stored snippets by cosine similarity.
pub struct CodeRetriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
}

impl std::fmt::Debug for CodeRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeRetriever")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl CodeRetriever {
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            embedder,
            collection: collection.into(),
        }
    }

    /// Top `top_n` snippets most similar to `query.query`, best first.
    ///
    /// A missing or empty collection yields an empty result without touching the
    /// embedder.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidQuery`] for `top_n == 0`, or the embedder/store
    /// error that stopped the search.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
        if query.top_n == 0 {
            return Err(IndexError::InvalidQuery("top_n must be greater than 0".into()));
        }

        let populated = self
            .store
            .collection_stats(&self.collection)
            .await?
            .is_some_and(|s| s.points_count > 0);
        if !populated {
            tracing::debug!(collection = %self.collection, "search on empty collection");
            return Ok(SearchResult::default());
        }

        let vector = self
            .embedder
            .embed(&query.query, EmbedMode::Query)
            .await?;

        let filter = query
            .allowed_repos
            .as_ref()
            .filter(|repos| !repos.is_empty())
            .map(|repos| VectorFilter::any_of(REPO_NAME_FIELD, repos.clone()));

        let hits = self
            .store
            .search(&self.collection, vector, u64::try_from(query.top_n)?, filter)
            .await?;

        let snippets = hits
            .into_iter()
            .filter_map(|hit| match CodeSnippet::from_payload(hit.payload) {
                Ok(snippet) => Some(snippet),
                Err(e) => {
                    tracing::warn!(point = %hit.id, "dropping point with malformed payload: {e}");
                    None
                }
            })
            .collect();

        Ok(SearchResult { snippets })
    }
}
