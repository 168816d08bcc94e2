//! Semantic code search over GitHub repositories.
//!
//! Repositories are cloned, split into fixed-size line windows, embedded through
//! an OpenAI-compatible endpoint and stored in a Qdrant collection. A background
//! [`indexer::CodeIndexer`] drives the collection to `completed`; a
//! [`service::CodeSearch`] answers similarity queries with an optional repository
//! allow-list and reports system status.

pub mod chunker;
pub mod embedder;
pub mod error;
pub mod fetcher;
pub mod in_memory_store;
pub mod indexer;
pub(crate) mod languages;
pub mod manifest;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod qdrant_ops;
pub mod repos;
pub mod retriever;
pub mod service;
pub mod status;
pub mod types;
pub mod vector_store;

pub use embedder::{EmbedError, EmbedMode, Embedder, EmbedderConfig, HttpEmbedder};
pub use error::{IndexError, Result};
pub use fetcher::{FetchError, RepoFetcher};
pub use in_memory_store::InMemoryVectorStore;
pub use indexer::{CodeIndexer, IndexerConfig, spawn_indexer};
pub use qdrant_ops::QdrantOps;
pub use service::{CodeSearch, SystemStatus};
pub use status::{IndexState, IndexingStatus, StatusHandle};
pub use types::{CodeSnippet, Repository, SearchQuery, SearchResult};
pub use vector_store::{
    CollectionStats, FieldCondition, ScoredVectorPoint, VectorFilter, VectorPoint,
    VectorStore, VectorStoreError,
};
