use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::domain::{ports::ConversationStore, DomainError, Exchange, Message, Thread};

#[derive(Default)]
struct ThreadLog {
    thread: Option<Thread>,
    exchanges: HashSet<Uuid>,
}

/// Threads kept in process memory.
///
/// Each thread has its own lock, so appends to one thread are serialized
/// while different threads proceed independently.
#[derive(Default)]
pub struct InMemoryConversationStore {
    threads: RwLock<HashMap<String, Arc<Mutex<ThreadLog>>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn log(&self, thread_id: &str) -> Arc<Mutex<ThreadLog>> {
        if let Some(log) = self.threads.read().await.get(thread_id) {
            return log.clone();
        }
        self.threads
            .write()
            .await
            .entry(thread_id.to_string())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn append(&self, thread_id: &str, message: &Message) -> Result<(), DomainError> {
        let log = self.log(thread_id).await;
        let mut log = log.lock().await;
        log.thread
            .get_or_insert_with(|| Thread::new(thread_id))
            .push(message.clone());
        Ok(())
    }

    async fn append_exchange(
        &self,
        thread_id: &str,
        exchange: &Exchange,
    ) -> Result<bool, DomainError> {
        let log = self.log(thread_id).await;
        let mut log = log.lock().await;

        if !log.exchanges.insert(exchange.id) {
            return Ok(false);
        }

        let thread = log.thread.get_or_insert_with(|| Thread::new(thread_id));
        for message in exchange.messages() {
            thread.push(message.clone());
        }
        Ok(true)
    }

    async fn load(&self, thread_id: &str) -> Result<Vec<Message>, DomainError> {
        let Some(log) = self.threads.read().await.get(thread_id).cloned() else {
            return Ok(Vec::new());
        };
        let log = log.lock().await;
        Ok(log
            .thread
            .as_ref()
            .map(|t| t.messages.clone())
            .unwrap_or_default())
    }

    async fn list_threads(&self) -> Result<Vec<String>, DomainError> {
        let logs: Vec<(String, Arc<Mutex<ThreadLog>>)> = self
            .threads
            .read()
            .await
            .iter()
            .map(|(id, log)| (id.clone(), log.clone()))
            .collect();

        let mut ids = Vec::with_capacity(logs.len());
        for (id, log) in logs {
            if log.lock().await.thread.is_some() {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
