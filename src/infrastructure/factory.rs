//! Builds the configured adapter for each port.

use std::sync::Arc;

use crate::domain::{
    ports::{ConversationStore, EmbeddingService, LlmService, VectorStore},
    DomainError,
};
use crate::infrastructure::config::{
    Config, ConversationBackend, EmbeddingProvider, LlmProvider, VectorBackend,
};
use crate::infrastructure::conversation::{InMemoryConversationStore, RedisConversationStore};
use crate::infrastructure::embedding::{HashingEmbedding, OpenAiEmbedding};
use crate::infrastructure::llm::{OpenAiCompatibleLlm, RigLlm};
use crate::infrastructure::vector_store::{InMemoryVectorStore, QdrantVectorStore};

pub fn build_embedding(config: &Config) -> Arc<dyn EmbeddingService> {
    match config.embedding.provider {
        EmbeddingProvider::Openai => Arc::new(OpenAiEmbedding::from_config(&config.embedding)),
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedding::new(config.embedding.dimension)),
    }
}

pub fn build_llm(config: &Config) -> Result<Arc<dyn LlmService>, DomainError> {
    Ok(match config.llm.provider {
        LlmProvider::OpenaiCompatible => Arc::new(OpenAiCompatibleLlm::from_config(&config.llm)?),
        LlmProvider::Openai | LlmProvider::Anthropic | LlmProvider::Gemini => {
            Arc::new(RigLlm::from_config(&config.llm))
        }
    })
}

pub async fn build_vector_store(
    config: &Config,
    dimension: usize,
) -> Result<Arc<dyn VectorStore>, DomainError> {
    Ok(match config.storage.vector_backend {
        VectorBackend::Qdrant => Arc::new(
            QdrantVectorStore::new(
                &config.storage.qdrant_url,
                &config.storage.collection,
                dimension,
            )
            .await?,
        ),
        VectorBackend::Memory => Arc::new(InMemoryVectorStore::new()),
    })
}

pub fn build_conversation_store(config: &Config) -> Result<Arc<dyn ConversationStore>, DomainError> {
    Ok(match config.storage.conversation_backend {
        ConversationBackend::Redis => {
            Arc::new(RedisConversationStore::from_url(&config.storage.redis_url)?)
        }
        ConversationBackend::Memory => Arc::new(InMemoryConversationStore::new()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backends_need_no_services() {
        let mut config = Config::default();
        config.embedding.provider = EmbeddingProvider::Hashing;
        config.embedding.dimension = 64;
        config.storage.vector_backend = VectorBackend::Memory;
        config.storage.conversation_backend = ConversationBackend::Memory;

        let embedding = build_embedding(&config);
        assert_eq!(embedding.dimension(), 64);

        let store = build_vector_store(&config, embedding.dimension()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        let conversations = build_conversation_store(&config).unwrap();
        assert!(conversations.ping().await.is_ok());
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let mut config = Config::default();
        config.llm.api_key_env = "DOCCHAT_TEST_UNSET_KEY".to_string();
        let err = build_llm(&config).err().unwrap();
        assert!(matches!(err, DomainError::Validation(ref m) if m.contains("DOCCHAT_TEST_UNSET_KEY")));
    }
}
