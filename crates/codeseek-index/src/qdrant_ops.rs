//! Qdrant-backed [`VectorStore`].

use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, DeletePointsBuilder,
    Distance, FieldType, Filter, PointStruct, ScoredPoint, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};

use crate::vector_store::{
    CollectionStats, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore, VectorStoreError,
};

type QdrantResult<T> = Result<T, Box<qdrant_client::QdrantError>>;
type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Payload fields that get a keyword index on collection creation.
const KEYWORD_INDEXES: &[&str] = &["repo.name"];

/// Thin wrapper over [`Qdrant`] client encapsulating the collection operations we need.
#[derive(Clone)]
pub struct QdrantOps {
    client: Qdrant,
}

impl std::fmt::Debug for QdrantOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantOps").finish_non_exhaustive()
    }
}

impl QdrantOps {
    /// Create a new `QdrantOps` connected to the given gRPC URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the Qdrant client cannot be created.
    pub fn new(url: &str, api_key: Option<&str>) -> QdrantResult<Self> {
        let mut config = Qdrant::from_url(url);
        if let Some(key) = api_key {
            config = config.api_key(key.to_owned());
        }
        let client = config.build().map_err(Box::new)?;
        Ok(Self { client })
    }

    /// Point count and vector size, or `None` if the collection is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if Qdrant cannot be reached.
    pub async fn collection_stats(&self, collection: &str) -> QdrantResult<Option<CollectionStats>> {
        if !self
            .client
            .collection_exists(collection)
            .await
            .map_err(Box::new)?
        {
            return Ok(None);
        }
        let info = self
            .client
            .collection_info(collection)
            .await
            .map_err(Box::new)?;
        let Some(info) = info.result else {
            return Ok(None);
        };

        let vector_size = info
            .config
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .map_or(0, |cfg| match cfg {
                VectorsConfigKind::Params(params) => params.size,
                VectorsConfigKind::ParamsMap(map) => {
                    map.map.values().next().map_or(0, |params| params.size)
                }
            });

        Ok(Some(CollectionStats {
            points_count: info.points_count.unwrap_or(0),
            vector_size,
        }))
    }

    /// Create a cosine-distance collection plus its keyword payload indexes.
    ///
    /// # Errors
    ///
    /// Returns an error if collection or index creation fails.
    pub async fn create_collection(&self, collection: &str, vector_size: u64) -> QdrantResult<()> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
            )
            .await
            .map_err(Box::new)?;

        for field in KEYWORD_INDEXES {
            self.client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(
                    collection,
                    *field,
                    FieldType::Keyword,
                ))
                .await
                .map_err(Box::new)?;
        }
        Ok(())
    }

    /// Upsert points and wait until they are searchable.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> QdrantResult<()> {
        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(Box::new)?;
        Ok(())
    }

    /// Search for similar vectors, returning scored points with payloads.
    ///
    /// # Errors
    ///
    /// Returns an error if the search fails.
    pub async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<Filter>,
    ) -> QdrantResult<Vec<ScoredPoint>> {
        let mut builder = SearchPointsBuilder::new(collection, vector, limit).with_payload(true);
        if let Some(f) = filter {
            builder = builder.filter(f);
        }
        let results = self.client.search_points(builder).await.map_err(Box::new)?;
        Ok(results.result)
    }

    /// Delete every point matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails.
    pub async fn delete_by_filter(&self, collection: &str, filter: Filter) -> QdrantResult<()> {
        self.client
            .delete_points(DeletePointsBuilder::new(collection).points(filter).wait(true))
            .await
            .map_err(Box::new)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the server does not answer the health check.
    pub async fn health_check(&self) -> QdrantResult<()> {
        self.client.health_check().await.map_err(Box::new)?;
        Ok(())
    }
}

impl VectorStore for QdrantOps {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let stats = self
                .collection_stats(&collection)
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            match stats {
                Some(stats) if stats.vector_size != vector_size => {
                    Err(VectorStoreError::DimensionMismatch {
                        collection,
                        expected: vector_size,
                        actual: stats.vector_size,
                    })
                }
                Some(_) => Ok(()),
                None => {
                    tracing::info!(%collection, vector_size, "creating Qdrant collection");
                    self.create_collection(&collection, vector_size)
                        .await
                        .map_err(|e| VectorStoreError::Collection(e.to_string()))
                }
            }
        })
    }

    fn collection_stats(
        &self,
        collection: &str,
    ) -> BoxFuture<'_, Result<Option<CollectionStats>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.collection_stats(&collection)
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let qdrant_points: Vec<PointStruct> = points
                .into_iter()
                .map(|p| {
                    let payload: HashMap<String, QdrantValue> = p
                        .payload
                        .into_iter()
                        .map(|(k, v)| (k, QdrantValue::from(v)))
                        .collect();
                    PointStruct::new(p.id, p.vector, payload)
                })
                .collect();
            self.upsert(&collection, qdrant_points)
                .await
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let qdrant_filter = filter.map(vector_filter_to_qdrant);
            let results = self
                .search(&collection, vector, limit, qdrant_filter)
                .await
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            Ok(results.into_iter().map(scored_point_to_vector).collect())
        })
    }

    fn delete_by_filter(
        &self,
        collection: &str,
        filter: VectorFilter,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.delete_by_filter(&collection, vector_filter_to_qdrant(filter))
                .await
                .map_err(|e| VectorStoreError::Delete(e.to_string()))
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        Box::pin(async move {
            self.health_check()
                .await
                .map_err(|e| VectorStoreError::Connection(e.to_string()))
        })
    }
}

fn vector_filter_to_qdrant(filter: VectorFilter) -> Filter {
    Filter::must(
        filter
            .must
            .into_iter()
            .map(|cond| Condition::matches(cond.field, cond.any_of)),
    )
}

fn scored_point_to_vector(point: ScoredPoint) -> ScoredVectorPoint {
    let payload: HashMap<String, serde_json::Value> = point
        .payload
        .into_iter()
        .map(|(k, v)| (k, v.into_json()))
        .collect();

    let id = match point.id.and_then(|pid| pid.point_id_options) {
        Some(PointIdOptions::Uuid(u)) => u,
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    };

    ScoredVectorPoint {
        id,
        score: point.score,
        payload,
    }
}
