//! Application layer - use cases over the domain ports.
//!
//! Services depend on port traits, never on concrete adapters.

pub mod services;

pub use services::{
    AnswerStream, ChatTurn, DocumentService, EmbeddingIndex, IngestReport, RagService, Retriever,
};
