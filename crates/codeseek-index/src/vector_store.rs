use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("collection error: {0}")]
    Collection(String),
    #[error("collection {collection} has vector size {actual}, expected {expected}")]
    DimensionMismatch {
        collection: String,
        expected: u64,
        actual: u64,
    },
    #[error("upsert error: {0}")]
    Upsert(String),
    #[error("search error: {0}")]
    Search(String),
    #[error("delete error: {0}")]
    Delete(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: HashMap<String, serde_json::Value>,
}

/// Conjunction of field conditions.
#[derive(Debug, Clone, Default)]
pub struct VectorFilter {
    pub must: Vec<FieldCondition>,
}

impl VectorFilter {
    /// Filter matching points whose `field` equals one of `values`.
    #[must_use]
    pub fn any_of(field: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            must: vec![FieldCondition {
                field: field.into(),
                any_of: values,
            }],
        }
    }
}

/// Keyword match-any on a payload field. Dotted names (`repo.name`) address nested objects.
#[derive(Debug, Clone)]
pub struct FieldCondition {
    pub field: String,
    pub any_of: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ScoredVectorPoint {
    pub id: String,
    pub score: f32,
    pub payload: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStats {
    pub points_count: u64,
    pub vector_size: u64,
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait VectorStore: Send + Sync {
    /// Create the collection with cosine distance if absent.
    ///
    /// Fails with [`VectorStoreError::DimensionMismatch`] when it exists with a
    /// different vector size.
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    /// `None` when the collection does not exist.
    fn collection_stats(
        &self,
        collection: &str,
    ) -> BoxFuture<'_, Result<Option<CollectionStats>, VectorStoreError>>;

    /// Insert or replace points; completes once they are searchable.
    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>>;

    fn delete_by_filter(
        &self,
        collection: &str,
        filter: VectorFilter,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    /// Reachability check.
    fn ping(&self) -> BoxFuture<'_, Result<(), VectorStoreError>>;
}
