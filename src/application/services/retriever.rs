use std::sync::Arc;
use tracing::instrument;

use crate::application::services::EmbeddingIndex;
use crate::domain::{DocumentChunk, DomainError, SearchResult};

pub const DEFAULT_TOP_K: usize = 3;

/// Fixed top-k view over the index. Read-only.
pub struct Retriever {
    index: Arc<EmbeddingIndex>,
    top_k: usize,
    min_score: Option<f32>,
}

impl Retriever {
    pub fn new(index: Arc<EmbeddingIndex>, top_k: usize) -> Self {
        Self {
            index,
            top_k,
            min_score: None,
        }
    }

    /// Drops hits scoring below `min_score`.
    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[instrument(skip(self), fields(top_k = self.top_k))]
    pub async fn retrieve(&self, question: &str) -> Result<Vec<DocumentChunk>, DomainError> {
        Ok(self
            .retrieve_scored(question)
            .await?
            .into_iter()
            .map(|r| r.chunk)
            .collect())
    }

    pub async fn retrieve_scored(&self, question: &str) -> Result<Vec<SearchResult>, DomainError> {
        self.search(question, self.top_k).await
    }

    /// Same ranking with a caller-chosen `limit`.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, DomainError> {
        let mut results = self.index.search(query, limit).await?;
        if let Some(min) = self.min_score {
            results.retain(|r| r.score >= min);
        }
        tracing::debug!(hits = results.len(), "retrieved");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{HashingEmbedding, InMemoryVectorStore};
    use uuid::Uuid;

    async fn retriever_over(texts: &[&str], top_k: usize) -> Retriever {
        let index = Arc::new(EmbeddingIndex::new(
            Arc::new(HashingEmbedding::new(128)),
            Arc::new(InMemoryVectorStore::new()),
        ));
        let doc = Uuid::new_v4();
        let chunks: Vec<_> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| DocumentChunk::new(doc, *t, i))
            .collect();
        index.add(&chunks).await.unwrap();
        Retriever::new(index, top_k)
    }

    #[tokio::test]
    async fn test_returns_at_most_top_k() {
        let retriever = retriever_over(&["a b", "b c", "c d", "d e", "e f"], 3).await;
        assert_eq!(retriever.retrieve("b c d").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_best_match_first() {
        let retriever = retriever_over(
            &[
                "shipping takes five business days",
                "the refund policy allows returns within 30 days",
                "contact support by email",
            ],
            3,
        )
        .await;

        let chunks = retriever.retrieve("What is the refund policy?").await.unwrap();
        assert!(chunks[0].content.contains("refund"));
    }

    #[tokio::test]
    async fn test_empty_index_is_not_an_error() {
        let retriever = retriever_over(&[], 3).await;
        assert!(retriever.retrieve("anything").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_min_score_filters_weak_hits() {
        let retriever = retriever_over(&["refund policy", "zebra giraffe"], 3)
            .await
            .with_min_score(Some(0.3));

        let chunks = retriever.retrieve("refund policy").await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "refund policy");
    }
}
