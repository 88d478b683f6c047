mod document;
mod index;
mod rag;
mod retriever;

pub use document::{DocumentService, IngestReport};
pub use index::EmbeddingIndex;
pub use rag::{AnswerStream, ChatTurn, PipelineState, RagService, Stage};
pub use retriever::{Retriever, DEFAULT_TOP_K};
