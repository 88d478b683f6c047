use crate::domain::{errors::DomainError, DocumentChunk, Embedding, SearchResult};
use async_trait::async_trait;

/// Durable home of chunk text and vectors.
///
/// A completed `upsert` must be visible to every `search` that starts after it.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert(&self, chunk: &DocumentChunk, embedding: &Embedding)
        -> Result<(), DomainError>;

    async fn upsert_batch(&self, items: &[(DocumentChunk, Embedding)]) -> Result<(), DomainError> {
        for (chunk, embedding) in items {
            self.upsert(chunk, embedding).await?;
        }
        Ok(())
    }

    /// Returns at most `top_k` results, best match first.
    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError>;

    async fn count(&self) -> Result<usize, DomainError>;
}
