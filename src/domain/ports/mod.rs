mod conversation_store;
mod embedding;
mod llm;
mod loader;
mod vector_store;

pub use conversation_store::ConversationStore;
pub use embedding::EmbeddingService;
pub use llm::{CompletionRequest, LlmService, TextStream};
pub use loader::DocumentLoader;
pub use vector_store::VectorStore;
