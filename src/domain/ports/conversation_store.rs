use async_trait::async_trait;

use crate::domain::{errors::DomainError, Exchange, Message};

/// Per-thread message log.
///
/// Appends to one thread are serialized and never interleave; appends to
/// different threads are independent. A thread exists once something has been
/// appended to it.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn append(&self, thread_id: &str, message: &Message) -> Result<(), DomainError>;

    /// Appends both messages of an exchange in one step, user first.
    ///
    /// Returns `false` without writing when an exchange with the same id was
    /// already stored on this thread.
    async fn append_exchange(&self, thread_id: &str, exchange: &Exchange)
        -> Result<bool, DomainError>;

    /// Full history in append order; empty for unknown threads.
    async fn load(&self, thread_id: &str) -> Result<Vec<Message>, DomainError>;

    /// Every thread that has had at least one append, sorted.
    async fn list_threads(&self) -> Result<Vec<String>, DomainError>;

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
