use async_trait::async_trait;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};

/// Bag-of-words feature hashing.
///
/// Lower-cased alphanumeric tokens are hashed (FNV-1a) into `dimension`
/// buckets and the vector is L2-normalised. Texts sharing words score high
/// under cosine similarity, which is enough for local runs and tests without
/// an embedding provider.
pub struct HashingEmbedding {
    dimension: usize,
}

impl HashingEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn embed_sync(&self, text: &str) -> Embedding {
        let mut vec = vec![0.0f32; self.dimension];
        for token in tokens(text) {
            let bucket = (fnv1a(token.as_bytes()) % self.dimension as u64) as usize;
            vec[bucket] += 1.0;
        }
        Embedding::new(vec).normalized()
    }
}

impl Default for HashingEmbedding {
    fn default() -> Self {
        Self::new(256)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf29ce484222325, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x100000001b3)
    })
}

#[async_trait]
impl EmbeddingService for HashingEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        Ok(texts.iter().map(|t| self.embed_sync(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
