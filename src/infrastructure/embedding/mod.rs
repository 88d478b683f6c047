mod hashing;
mod openai;

pub use hashing::HashingEmbedding;
pub use openai::OpenAiEmbedding;
