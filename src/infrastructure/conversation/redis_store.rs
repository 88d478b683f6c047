use async_trait::async_trait;
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config, Connection, Pool, Runtime};

use crate::domain::{ports::ConversationStore, DomainError, Exchange, Message};

pub type RedisPool = Pool;

pub mod keys {
    pub const THREADS: &str = "threads";

    pub fn thread_messages(thread_id: &str) -> String {
        format!("thread:{}:messages", thread_id)
    }

    pub fn thread_exchanges(thread_id: &str) -> String {
        format!("thread:{}:exchanges", thread_id)
    }
}

/// KEYS: messages list, exchange-id set, thread registry.
/// ARGV: exchange id, thread id, user message, assistant message.
const APPEND_EXCHANGE: &str = r#"
if redis.call('SADD', KEYS[2], ARGV[1]) == 0 then
  return 0
end
redis.call('RPUSH', KEYS[1], ARGV[3], ARGV[4])
redis.call('SADD', KEYS[3], ARGV[2])
return 1
"#;

pub fn create_pool(redis_url: &str) -> Result<RedisPool, DomainError> {
    let cfg = Config::from_url(redis_url);
    cfg.create_pool(Some(Runtime::Tokio1))
        .map_err(|e| DomainError::store(e.to_string()))
}

/// Threads as Redis lists of JSON messages plus a set of known thread ids.
///
/// Single appends run in a MULTI block and exchanges in a Lua script, so a
/// thread's log is only ever extended atomically.
#[derive(Clone)]
pub struct RedisConversationStore {
    pool: RedisPool,
}

impl RedisConversationStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    pub fn from_url(redis_url: &str) -> Result<Self, DomainError> {
        Ok(Self::new(create_pool(redis_url)?))
    }

    async fn conn(&self) -> Result<Connection, DomainError> {
        self.pool
            .get()
            .await
            .map_err(|e| DomainError::store(e.to_string()))
    }
}

fn encode(message: &Message) -> Result<String, DomainError> {
    serde_json::to_string(message).map_err(|e| DomainError::store(e.to_string()))
}

fn redis_err(e: redis::RedisError) -> DomainError {
    DomainError::store(e.to_string())
}

#[async_trait]
impl ConversationStore for RedisConversationStore {
    async fn append(&self, thread_id: &str, message: &Message) -> Result<(), DomainError> {
        let mut conn = self.conn().await?;
        let json = encode(message)?;

        let _: () = redis::pipe()
            .atomic()
            .rpush(keys::thread_messages(thread_id), json)
            .ignore()
            .sadd(keys::THREADS, thread_id)
            .ignore()
            .query_async(&mut *conn)
            .await
            .map_err(redis_err)?;

        Ok(())
    }

    async fn append_exchange(
        &self,
        thread_id: &str,
        exchange: &Exchange,
    ) -> Result<bool, DomainError> {
        let mut conn = self.conn().await?;

        let appended: i64 = redis::cmd("EVAL")
            .arg(APPEND_EXCHANGE)
            .arg(3)
            .arg(keys::thread_messages(thread_id))
            .arg(keys::thread_exchanges(thread_id))
            .arg(keys::THREADS)
            .arg(exchange.id.to_string())
            .arg(thread_id)
            .arg(encode(&exchange.user)?)
            .arg(encode(&exchange.assistant)?)
            .query_async(&mut *conn)
            .await
            .map_err(redis_err)?;

        if appended == 0 {
            tracing::warn!(thread_id, exchange_id = %exchange.id, "duplicate exchange skipped");
        }
        Ok(appended == 1)
    }

    async fn load(&self, thread_id: &str) -> Result<Vec<Message>, DomainError> {
        let mut conn = self.conn().await?;
        let raw: Vec<String> = conn
            .lrange(keys::thread_messages(thread_id), 0, -1)
            .await
            .map_err(redis_err)?;

        raw.iter()
            .map(|json| serde_json::from_str(json).map_err(|e| DomainError::store(e.to_string())))
            .collect()
    }

    async fn list_threads(&self) -> Result<Vec<String>, DomainError> {
        let mut conn = self.conn().await?;
        let mut ids: Vec<String> = conn.smembers(keys::THREADS).await.map_err(redis_err)?;
        ids.sort();
        Ok(ids)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(redis_err)?;
        Ok(())
    }
}
