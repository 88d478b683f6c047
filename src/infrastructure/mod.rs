pub mod config;
pub mod conversation;
pub mod embedding;
pub mod factory;
pub mod llm;
pub mod loaders;
pub mod vector_store;

pub use config::{AppConfig, Config, PromptsConfig};
pub use conversation::{InMemoryConversationStore, RedisConversationStore};
pub use embedding::{HashingEmbedding, OpenAiEmbedding};
pub use llm::{OpenAiCompatibleLlm, RigLlm};
pub use loaders::FileLoader;
pub use vector_store::{InMemoryVectorStore, QdrantVectorStore};
