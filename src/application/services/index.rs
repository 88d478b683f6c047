use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    DocumentChunk, DomainError, SearchResult,
};

const EMBED_BATCH_SIZE: usize = 64;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Owned handle on the chunk index: embeds text and stores or searches vectors.
///
/// Constructed once at startup and shared by the ingestor and the retriever.
pub struct EmbeddingIndex {
    embedding: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
    timeout: Duration,
}

impl EmbeddingIndex {
    pub fn new(embedding: Arc<dyn EmbeddingService>, vector_store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedding,
            vector_store,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Embeds and stores chunks batch by batch. Batches stored before a
    /// failure stay in the index; the error says how many chunks made it.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn add(&self, chunks: &[DocumentChunk]) -> Result<usize, DomainError> {
        let mut added = 0;

        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            if let Err(e) = self.add_batch(batch).await {
                tracing::error!(added, total = chunks.len(), error = %e, "index add failed part-way");
                return Err(DomainError::ingest(format!(
                    "{} ({added} of {} chunks were indexed before the failure)",
                    e.message(),
                    chunks.len()
                )));
            }
            added += batch.len();
        }

        Ok(added)
    }

    async fn add_batch(&self, batch: &[DocumentChunk]) -> Result<(), DomainError> {
        let texts: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();

        let embeddings = tokio::time::timeout(self.timeout, self.embedding.embed_batch(&texts))
            .await
            .map_err(|_| DomainError::ingest("embedding request timed out"))?
            .map_err(DomainError::into_ingest)?;

        if embeddings.len() != batch.len() {
            return Err(DomainError::ingest(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                embeddings.len()
            )));
        }

        let items: Vec<_> = batch.iter().cloned().zip(embeddings).collect();
        self.vector_store
            .upsert_batch(&items)
            .await
            .map_err(DomainError::into_ingest)
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>, DomainError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let embedding = tokio::time::timeout(self.timeout, self.embedding.embed(query))
            .await
            .map_err(|_| DomainError::retrieval("query embedding timed out"))?
            .map_err(DomainError::into_retrieval)?;

        tokio::time::timeout(self.timeout, self.vector_store.search(&embedding, top_k))
            .await
            .map_err(|_| DomainError::retrieval("vector search timed out"))?
            .map_err(DomainError::into_retrieval)
    }

    /// Number of stored chunks.
    pub async fn len(&self) -> Result<usize, DomainError> {
        self.vector_store
            .count()
            .await
            .map_err(DomainError::into_retrieval)
    }

    pub async fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.len().await? == 0)
    }
}
