use async_stream::try_stream;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

use crate::application::services::Retriever;
use crate::domain::{
    new_thread_id,
    ports::{CompletionRequest, ConversationStore, LlmService, TextStream},
    DocumentChunk, DomainError, Exchange, Message,
};

const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Where an invocation currently is. Moves strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Retrieve,
    Generate,
    Done,
}

/// Working record of one pipeline invocation. Never persisted; only the
/// resulting exchange is.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub question: String,
    pub context: String,
    /// Prior messages of the thread, oldest first.
    pub messages: Vec<Message>,
    pub stage: Stage,
}

impl PipelineState {
    pub fn new(question: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            question: question.into(),
            context: String::new(),
            messages,
            stage: Stage::Retrieve,
        }
    }

    /// Records retrieved chunks and moves on to generation, even when nothing
    /// was found.
    pub fn with_context(mut self, chunks: &[DocumentChunk]) -> Self {
        self.context = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        self.stage = Stage::Generate;
        self
    }

    pub fn prompt(&self) -> String {
        format!("Context:\n{}\n\nQuestion:\n{}", self.context, self.question)
    }

    pub fn request(&self, system: &str) -> CompletionRequest {
        CompletionRequest::new(system, self.prompt()).with_history(self.messages.clone())
    }
}

/// One chat request. `request_id` becomes the exchange id, so a retried
/// request with the same id is stored once.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub question: String,
    pub thread_id: String,
    pub request_id: Option<Uuid>,
}

impl ChatTurn {
    pub fn new(question: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            thread_id: thread_id.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: Option<Uuid>) -> Self {
        self.request_id = request_id;
        self
    }
}

/// Retrieve, generate, then append the exchange to the thread.
pub struct RagService {
    retriever: Arc<Retriever>,
    llm: Arc<dyn LlmService>,
    conversations: Arc<dyn ConversationStore>,
    system_prompt: String,
    timeout: Duration,
}

impl RagService {
    pub fn new(
        retriever: Arc<Retriever>,
        llm: Arc<dyn LlmService>,
        conversations: Arc<dyn ConversationStore>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            retriever,
            llm,
            conversations,
            system_prompt: system_prompt.into(),
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    /// Bounds the whole completion call, and the wait between two streamed
    /// fragments.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn answer(&self, question: &str, thread_id: &str) -> Result<Message, DomainError> {
        self.run(ChatTurn::new(question, thread_id)).await
    }

    #[instrument(skip(self, turn), fields(thread_id = %turn.thread_id))]
    pub async fn run(&self, turn: ChatTurn) -> Result<Message, DomainError> {
        let state = self.prepare(&turn).await?;
        let request = state.request(&self.system_prompt);

        let answer = tokio::time::timeout(self.timeout, self.llm.complete(&request))
            .await
            .map_err(|_| self.timed_out())?
            .map_err(DomainError::into_generation)?;

        persist(self.conversations.as_ref(), &turn, state, answer).await
    }

    pub async fn answer_stream(
        &self,
        question: &str,
        thread_id: &str,
    ) -> Result<AnswerStream, DomainError> {
        self.run_stream(ChatTurn::new(question, thread_id)).await
    }

    /// Retrieval and the start of generation happen before this returns, so
    /// setup failures surface as an `Err` rather than inside the stream.
    ///
    /// The exchange is appended once the last fragment has been produced.
    /// Dropping the stream before that appends nothing.
    #[instrument(skip(self, turn), fields(thread_id = %turn.thread_id))]
    pub async fn run_stream(&self, turn: ChatTurn) -> Result<AnswerStream, DomainError> {
        let state = self.prepare(&turn).await?;
        let request = state.request(&self.system_prompt);

        let mut fragments = tokio::time::timeout(self.timeout, self.llm.stream(&request))
            .await
            .map_err(|_| self.timed_out())?
            .map_err(DomainError::into_generation)?;

        let conversations = self.conversations.clone();
        let idle = self.timeout;
        let thread_id = turn.thread_id.clone();

        let inner: TextStream = Box::pin(try_stream! {
            let mut answer = String::new();
            loop {
                let next = tokio::time::timeout(idle, fragments.next())
                    .await
                    .map_err(|_| DomainError::timeout(format!("no fragment within {idle:?}")))?;
                let fragment = match next {
                    Some(fragment) => fragment.map_err(DomainError::into_generation)?,
                    None => break,
                };
                if fragment.is_empty() {
                    continue;
                }
                answer.push_str(&fragment);
                yield fragment;
            }
            persist(conversations.as_ref(), &turn, state, answer).await?;
        });

        Ok(AnswerStream { thread_id, inner })
    }

    pub async fn history(&self, thread_id: &str) -> Result<Vec<Message>, DomainError> {
        self.conversations
            .load(thread_id)
            .await
            .map_err(DomainError::into_store)
    }

    pub async fn threads(&self) -> Result<Vec<String>, DomainError> {
        self.conversations
            .list_threads()
            .await
            .map_err(DomainError::into_store)
    }

    /// Mints a fresh thread id. Nothing is stored until the first answer.
    pub fn new_thread(&self) -> String {
        new_thread_id()
    }

    /// Reachability of the conversation store.
    pub async fn ping(&self) -> Result<(), DomainError> {
        self.conversations
            .ping()
            .await
            .map_err(DomainError::into_store)
    }

    async fn prepare(&self, turn: &ChatTurn) -> Result<PipelineState, DomainError> {
        let question = turn.question.trim();
        if question.is_empty() {
            return Err(DomainError::validation("question must not be empty"));
        }

        let history = self.history(&turn.thread_id).await?;
        let state = PipelineState::new(question, history);
        tracing::debug!(stage = ?state.stage, prior_messages = state.messages.len());

        let chunks = self
            .retriever
            .retrieve(question)
            .await
            .map_err(DomainError::into_retrieval)?;
        let state = state.with_context(&chunks);
        tracing::debug!(stage = ?state.stage, chunks = chunks.len(), context_len = state.context.len());

        Ok(state)
    }

    fn timed_out(&self) -> DomainError {
        DomainError::timeout(format!("no completion within {:?}", self.timeout))
    }
}

async fn persist(
    conversations: &dyn ConversationStore,
    turn: &ChatTurn,
    mut state: PipelineState,
    answer: String,
) -> Result<Message, DomainError> {
    if answer.trim().is_empty() {
        return Err(DomainError::generation("model returned an empty answer"));
    }

    let exchange = Exchange::new(
        turn.request_id.unwrap_or_else(Uuid::new_v4),
        Message::user(state.question.as_str()),
        Message::assistant(answer),
    );

    let appended = conversations
        .append_exchange(&turn.thread_id, &exchange)
        .await
        .map_err(DomainError::into_store)?;
    if !appended {
        tracing::info!(exchange_id = %exchange.id, "exchange already stored, skipping");
    }

    state.stage = Stage::Done;
    tracing::debug!(stage = ?state.stage, exchange_id = %exchange.id);
    Ok(exchange.assistant)
}

/// Answer fragments in order. Concatenated, they form the stored answer.
pub struct AnswerStream {
    thread_id: String,
    inner: TextStream,
}

impl AnswerStream {
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Drains the stream into the full answer.
    pub async fn collect_text(mut self) -> Result<String, DomainError> {
        let mut text = String::new();
        while let Some(fragment) = self.inner.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

impl Stream for AnswerStream {
    type Item = Result<String, DomainError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.poll_next_unpin(cx)
    }
}
