use async_trait::async_trait;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use uuid::Uuid;

use crate::domain::{
    ports::VectorStore, ChunkMetadata, DocumentChunk, DomainError, Embedding, SearchResult,
};

/// Durable chunk index on a Qdrant collection with cosine distance.
pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl QdrantVectorStore {
    pub async fn new(url: &str, collection: &str, dimension: usize) -> Result<Self, DomainError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| DomainError::external(e.to_string()))?;

        let store = Self {
            client,
            collection: collection.to_string(),
            dimension,
        };

        store.ensure_collection().await?;

        Ok(store)
    }

    async fn ensure_collection(&self) -> Result<(), DomainError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        if !exists {
            tracing::info!(collection = %self.collection, dimension = self.dimension, "creating collection");
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection)
                        .vectors_config(VectorParamsBuilder::new(
                            self.dimension as u64,
                            Distance::Cosine,
                        )),
                )
                .await
                .map_err(|e| DomainError::external(e.to_string()))?;
        }

        Ok(())
    }

    fn to_point(chunk: &DocumentChunk, embedding: &Embedding) -> Result<PointStruct, DomainError> {
        let payload: Payload = serde_json::json!({
            "document_id": chunk.document_id.to_string(),
            "content": chunk.content,
            "chunk_index": chunk.chunk_index,
            "source": chunk.metadata.source,
            "page": chunk.metadata.page,
            "row": chunk.metadata.row,
        })
        .try_into()
        .map_err(|_| DomainError::internal("Failed to create payload"))?;

        Ok(PointStruct::new(
            chunk.id.to_string(),
            embedding.as_slice().to_vec(),
            payload,
        ))
    }

    async fn upsert_points(&self, points: Vec<PointStruct>) -> Result<(), DomainError> {
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn upsert(&self, chunk: &DocumentChunk, embedding: &Embedding) -> Result<(), DomainError> {
        self.upsert_points(vec![Self::to_point(chunk, embedding)?])
            .await
    }

    async fn upsert_batch(&self, items: &[(DocumentChunk, Embedding)]) -> Result<(), DomainError> {
        if items.is_empty() {
            return Ok(());
        }
        let points = items
            .iter()
            .map(|(chunk, embedding)| Self::to_point(chunk, embedding))
            .collect::<Result<Vec<_>, _>>()?;
        self.upsert_points(points).await
    }

    async fn search(&self, query: &Embedding, top_k: usize) -> Result<Vec<SearchResult>, DomainError> {
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query.as_slice().to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        let search_results: Vec<SearchResult> = results
            .result
            .into_iter()
            .filter_map(|point| {
                let id: Uuid = match point.id?.point_id_options? {
                    qdrant_client::qdrant::point_id::PointIdOptions::Uuid(s) => s.parse().ok()?,
                    qdrant_client::qdrant::point_id::PointIdOptions::Num(_) => return None,
                };
                let payload = point.payload;

                let document_id: Uuid = payload
                    .get("document_id")?
                    .as_str()?
                    .parse()
                    .ok()?;
                let content = payload.get("content")?.as_str()?.to_string();
                let chunk_index = payload.get("chunk_index")?.as_integer()? as usize;
                let optional_index = |key: &str| {
                    payload
                        .get(key)
                        .and_then(|v| v.as_integer())
                        .map(|n| n as usize)
                };

                let metadata = ChunkMetadata {
                    source: payload
                        .get("source")
                        .and_then(|v| v.as_str())
                        .cloned()
                        .unwrap_or_default(),
                    page: optional_index("page"),
                    row: optional_index("row"),
                };

                Some(SearchResult {
                    chunk: DocumentChunk {
                        id,
                        document_id,
                        content,
                        chunk_index,
                        metadata,
                    },
                    score: point.score,
                })
            })
            .collect();

        Ok(search_results)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }
}
