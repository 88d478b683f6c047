#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use docchat::api::AppState;
use docchat::application::{DocumentService, EmbeddingIndex, RagService, Retriever};
use docchat::domain::ports::{CompletionRequest, ConversationStore, LlmService, TextStream};
use docchat::domain::{DomainError, Exchange, Message};
use docchat::infrastructure::{
    AppConfig, FileLoader, HashingEmbedding, InMemoryConversationStore, InMemoryVectorStore,
};

pub const SYSTEM_PROMPT: &str = "Answer using only the context.";

pub const FAQ_CSV: &str = "\
topic,answer
refund policy,Refunds are issued within 30 days of purchase with a receipt
shipping,Orders ship in five business days
support,Email support@example.com for help
warranty,Hardware carries a one year warranty
";

/// Deterministic model: always returns the same answer and records every request.
pub struct ScriptedLlm {
    answer: String,
    failing: AtomicBool,
    fail_mid_stream: AtomicBool,
    delay: Mutex<Duration>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            failing: AtomicBool::new(false),
            fail_mid_stream: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Streams end with a provider error after the first fragment.
    pub fn set_fail_mid_stream(&self, fail: bool) {
        self.fail_mid_stream.store(fail, Ordering::SeqCst);
    }

    /// Every completion waits this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for ScriptedLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        self.requests.lock().unwrap().push(request.clone());
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::external("scripted upstream failure"));
        }
        Ok(self.answer.clone())
    }

    /// Emits the answer word by word.
    async fn stream(&self, request: &CompletionRequest) -> Result<TextStream, DomainError> {
        let answer = self.complete(request).await?;
        let mut words: Vec<Result<String, DomainError>> = answer
            .split_inclusive(' ')
            .map(|w| Ok(w.to_string()))
            .collect();
        if self.fail_mid_stream.load(Ordering::SeqCst) {
            words.truncate(1);
            words.push(Err(DomainError::external("connection reset")));
        }
        Ok(stream::iter(words).boxed())
    }
}

/// Reads succeed with nothing stored; every write and ping fails.
pub struct UnreachableStore;

#[async_trait]
impl ConversationStore for UnreachableStore {
    async fn append(&self, _thread_id: &str, _message: &Message) -> Result<(), DomainError> {
        Err(DomainError::external("redis connection refused"))
    }

    async fn append_exchange(
        &self,
        _thread_id: &str,
        _exchange: &Exchange,
    ) -> Result<bool, DomainError> {
        Err(DomainError::external("redis connection refused"))
    }

    async fn load(&self, _thread_id: &str) -> Result<Vec<Message>, DomainError> {
        Ok(Vec::new())
    }

    async fn list_threads(&self) -> Result<Vec<String>, DomainError> {
        Err(DomainError::external("redis connection refused"))
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Err(DomainError::external("redis connection refused"))
    }
}

pub struct Harness {
    pub state: AppState,
    pub llm: Arc<ScriptedLlm>,
    pub conversations: Arc<dyn ConversationStore>,
    pub dir: TempDir,
}

/// Fully in-memory service graph with a scripted model.
pub fn harness(answer: &str) -> Harness {
    harness_with(
        answer,
        Arc::new(InMemoryConversationStore::new()),
        Duration::from_secs(60),
    )
}

pub fn harness_with(
    answer: &str,
    conversations: Arc<dyn ConversationStore>,
    generation_timeout: Duration,
) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.config.storage.upload_dir = dir.path().join("uploads");

    let index = Arc::new(EmbeddingIndex::new(
        Arc::new(HashingEmbedding::new(256)),
        Arc::new(InMemoryVectorStore::new()),
    ));
    let documents = Arc::new(
        DocumentService::new(index.clone(), Arc::new(FileLoader))
            .with_upload_dir(config.config.storage.upload_dir.clone()),
    );
    let retriever = Arc::new(Retriever::new(index.clone(), config.config.rag.top_k));
    let llm = Arc::new(ScriptedLlm::new(answer));
    let rag = Arc::new(
        RagService::new(
            retriever.clone(),
            llm.clone(),
            conversations.clone(),
            SYSTEM_PROMPT,
        )
        .with_timeout(generation_timeout),
    );

    Harness {
        state: AppState::new(config, index, documents, retriever, rag),
        llm,
        conversations,
        dir,
    }
}

impl Harness {
    pub async fn ingest_faq(&self) -> usize {
        self.state
            .documents
            .ingest_upload("faq.csv", FAQ_CSV.as_bytes())
            .await
            .unwrap()
            .chunks_added
    }
}
