mod in_memory;
mod redis_store;

pub use in_memory::InMemoryConversationStore;
pub use redis_store::{create_pool, keys, RedisConversationStore, RedisPool};
