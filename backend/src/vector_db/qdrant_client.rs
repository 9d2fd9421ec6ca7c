// backend/src/vector_db/qdrant_client.rs

use crate::config::Config;
use crate::errors::AppError;
use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::vectors_config::Config as QdrantVectorsConfig;
use qdrant_client::qdrant::{
    CreateCollection, Distance, Filter, PointStruct, RetrievedPoint, ScoredPoint, ScrollPoints,
    SearchPoints, UpsertPoints, Value, VectorParams, VectorsConfig,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Interface to the vector index holding message embeddings. The relational
/// store remains authoritative; points here exist only for retrieval.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert_points(&self, points: Vec<PointStruct>) -> Result<(), AppError>;

    async fn search_points(
        &self,
        query_vector: Vec<f32>,
        limit: u64,
        filter: Option<Filter>,
    ) -> Result<Vec<ScoredPoint>, AppError>;

    async fn scroll_points(
        &self,
        filter: Filter,
        limit: u32,
    ) -> Result<Vec<RetrievedPoint>, AppError>;
}

#[derive(Clone)]
pub struct QdrantClientService {
    client: Arc<Qdrant>,
    collection_name: String,
    embedding_dimension: u64,
}

impl QdrantClientService {
    #[instrument(skip(config), name = "qdrant_service_new")]
    pub async fn new(config: Arc<Config>) -> Result<Self, AppError> {
        let qdrant_url = config.qdrant_url.as_ref().ok_or_else(|| {
            error!("QDRANT_URL is not configured");
            AppError::ConfigError("QDRANT_URL is not configured".to_string())
        })?;

        info!("Connecting to Qdrant at URL: {}", qdrant_url);

        let qdrant_client = Qdrant::from_url(qdrant_url).build().map_err(|e| {
            error!(error = %e, "Failed to build Qdrant client");
            AppError::VectorDbError(format!("Failed to build Qdrant client: {e}"))
        })?;

        let service = Self {
            client: Arc::new(qdrant_client),
            collection_name: config.qdrant_collection_name.clone(),
            embedding_dimension: config.embedding_dimension,
        };

        // Ensure the collection exists on startup
        service.ensure_collection_exists().await?;

        Ok(service)
    }

    #[instrument(skip(self), name = "qdrant_ensure_collection")]
    async fn ensure_collection_exists(&self) -> Result<(), AppError> {
        let collection_exists = self
            .client
            .collection_exists(&self.collection_name)
            .await
            .map_err(|e| {
                error!(error = %e, collection = %self.collection_name, "Failed to check if Qdrant collection exists");
                AppError::VectorDbError(format!("Failed to check Qdrant collection existence: {e}"))
            })?;

        if collection_exists {
            info!("Collection '{}' already exists.", self.collection_name);
            return Ok(());
        }

        info!(
            "Collection '{}' does not exist. Creating...",
            self.collection_name
        );
        let create_result = self
            .client
            .create_collection(CreateCollection {
                collection_name: self.collection_name.clone(),
                vectors_config: Some(VectorsConfig {
                    config: Some(QdrantVectorsConfig::Params(VectorParams {
                        size: self.embedding_dimension,
                        distance: Distance::Cosine.into(),
                        ..Default::default()
                    })),
                }),
                ..Default::default()
            })
            .await;

        match create_result {
            Ok(_) => {
                info!("Successfully created collection '{}'", self.collection_name);
                Ok(())
            }
            Err(e) => {
                // Another instance may have created the collection concurrently.
                let error_string = e.to_string();
                if error_string.contains("already exists") {
                    warn!(collection = %self.collection_name, "Attempted to create collection, but it already exists (ignoring error).");
                    Ok(())
                } else {
                    error!(error = %e, collection = %self.collection_name, "Failed to create Qdrant collection");
                    Err(AppError::VectorDbError(format!(
                        "Failed to create Qdrant collection '{}': {}",
                        self.collection_name, e
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl VectorStore for QdrantClientService {
    #[instrument(skip(self, points), fields(count = points.len()), name = "qdrant_upsert_points")]
    async fn upsert_points(&self, points: Vec<PointStruct>) -> Result<(), AppError> {
        if points.is_empty() {
            return Ok(());
        }
        info!(
            "Upserting {} points into collection '{}'",
            points.len(),
            self.collection_name
        );
        self.client
            .upsert_points(UpsertPoints {
                collection_name: self.collection_name.clone(),
                wait: Some(true),
                points,
                ..Default::default()
            })
            .await
            .map_err(|e| {
                error!(error = %e, collection = %self.collection_name, "Failed to upsert points to Qdrant");
                AppError::VectorDbError(format!("Failed to upsert points: {e}"))
            })?;
        Ok(())
    }

    #[instrument(skip(self, query_vector, filter), fields(limit), name = "qdrant_search_points")]
    async fn search_points(
        &self,
        query_vector: Vec<f32>,
        limit: u64,
        filter: Option<Filter>,
    ) -> Result<Vec<ScoredPoint>, AppError> {
        info!(
            limit,
            filter_is_some = filter.is_some(),
            collection = %self.collection_name,
            "Searching points in Qdrant"
        );

        let search_request = SearchPoints {
            collection_name: self.collection_name.clone(),
            vector: query_vector,
            limit,
            with_payload: Some(true.into()),
            filter,
            ..Default::default()
        };

        let search_result = self.client.search_points(search_request).await.map_err(|e| {
            error!(error = %e, collection = %self.collection_name, "Failed to search points in Qdrant");
            AppError::VectorDbError(format!("Failed to search points: {e}"))
        })?;

        info!(
            found_points = search_result.result.len(),
            "Qdrant search completed"
        );
        Ok(search_result.result)
    }

    #[instrument(skip(self, filter), fields(limit), name = "qdrant_scroll_points")]
    async fn scroll_points(
        &self,
        filter: Filter,
        limit: u32,
    ) -> Result<Vec<RetrievedPoint>, AppError> {
        let scroll_request = ScrollPoints {
            collection_name: self.collection_name.clone(),
            filter: Some(filter),
            limit: Some(limit),
            with_payload: Some(true.into()),
            ..Default::default()
        };

        let scroll_result = self.client.scroll(scroll_request).await.map_err(|e| {
            error!(error = %e, collection = %self.collection_name, "Failed to scroll points in Qdrant");
            AppError::VectorDbError(format!("Failed to scroll points: {e}"))
        })?;

        Ok(scroll_result.result)
    }
}

/// Builds a point for one message embedding. Payload values are all strings;
/// parsing back happens in the embeddings service.
pub fn build_message_point(
    point_id: Uuid,
    vector: Vec<f32>,
    payload: HashMap<String, Value>,
) -> PointStruct {
    PointStruct {
        id: Some(point_id.to_string().into()),
        vectors: Some(vector.into()),
        payload,
    }
}
