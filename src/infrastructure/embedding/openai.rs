use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::{self as rig_embeddings, EmbeddingModel};
use rig::providers::openai;
use std::collections::{HashMap, VecDeque};

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

const DEFAULT_MODEL: &str = "text-embedding-3-small";
const DEFAULT_DIMENSION: usize = 1536;

/// OpenAI embeddings through rig, keyed by `OPENAI_API_KEY`.
///
/// Vectors come back in the order of the input texts.
pub struct OpenAiEmbedding {
    model: String,
    dimension: usize,
}

impl OpenAiEmbedding {
    pub fn new(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            model: model.into(),
            dimension,
        }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self::new(&config.model, config.dimension)
    }
}

impl Default for OpenAiEmbedding {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL, DEFAULT_DIMENSION)
    }
}

/// Puts provider results back into input order, matching on the echoed
/// document text. Repeated texts are filled in turn.
fn align(
    texts: &[&str],
    returned: Vec<rig_embeddings::Embedding>,
) -> Result<Vec<Embedding>, DomainError> {
    if returned.len() != texts.len() {
        return Err(DomainError::external(format!(
            "sent {} texts, provider returned {} embeddings",
            texts.len(),
            returned.len()
        )));
    }

    let mut slots_by_text: HashMap<&str, VecDeque<usize>> = HashMap::new();
    for (i, text) in texts.iter().enumerate() {
        slots_by_text.entry(*text).or_default().push_back(i);
    }

    let mut slots: Vec<Option<Embedding>> = vec![None; texts.len()];
    for emb in returned {
        let slot = slots_by_text
            .get_mut(emb.document.as_str())
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| DomainError::external("embedding returned for a text that was not sent"))?;
        slots[slot] = Some(Embedding::new(emb.vec.into_iter().map(|x| x as f32).collect()));
    }

    slots
        .into_iter()
        .map(|s| s.ok_or_else(|| DomainError::external("text left without an embedding")))
        .collect()
}

#[async_trait]
impl EmbeddingService for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| DomainError::external("provider returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = openai::Client::from_env().embedding_model(&self.model);
        let returned = model
            .embed_texts(texts.iter().map(|t| t.to_string()))
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        align(texts, returned)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
