use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::domain::{errors::DomainError, Message};

/// Ordered text fragments of a streamed completion.
pub type TextStream = BoxStream<'static, Result<String, DomainError>>;

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub history: Vec<Message>,
    pub prompt: String,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            history: Vec::new(),
            prompt: prompt.into(),
        }
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }
}

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError>;

    /// Providers without native streaming deliver the whole completion as one fragment.
    async fn stream(&self, request: &CompletionRequest) -> Result<TextStream, DomainError> {
        let text = self.complete(request).await?;
        Ok(stream::once(async move { Ok(text) }).boxed())
    }
}
