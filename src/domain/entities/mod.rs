mod conversation;
mod document;
mod embedding;
mod splitter;

pub use conversation::{new_thread_id, Exchange, Message, MessageRole, Thread, DEFAULT_THREAD_ID};
pub use document::{ChunkMetadata, Document, DocumentChunk, FileType, SearchResult, Section};
pub use embedding::Embedding;
pub use splitter::{TextSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
