use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::{anthropic, gemini, openai};

use crate::domain::{
    ports::{CompletionRequest, LlmService},
    DomainError,
};
use crate::infrastructure::config::{LlmConfig, LlmProvider};
use crate::infrastructure::llm::flatten_history;

const MAX_TOKENS: u64 = 1024;

/// Completion through rig's hosted providers. Credentials come from the
/// provider's usual environment variable (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`,
/// `GEMINI_API_KEY`). Streaming falls back to a single fragment.
pub struct RigLlm {
    provider: LlmProvider,
    model: String,
    temperature: f64,
}

impl RigLlm {
    pub fn new(provider: LlmProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.provider, &config.model).with_temperature(config.temperature)
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl LlmService for RigLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        let prompt = flatten_history(request);

        let result = match self.provider {
            LlmProvider::Anthropic => {
                let client = anthropic::Client::from_env();
                let agent = client
                    .agent(&self.model)
                    .preamble(&request.system)
                    .temperature(self.temperature)
                    .max_tokens(MAX_TOKENS)
                    .build();
                agent.prompt(prompt.as_str()).await
            }
            LlmProvider::Gemini => {
                let client = gemini::Client::from_env();
                let agent = client
                    .agent(&self.model)
                    .preamble(&request.system)
                    .temperature(self.temperature)
                    .build();
                agent.prompt(prompt.as_str()).await
            }
            LlmProvider::Openai => {
                let client = openai::Client::from_env();
                let agent = client
                    .agent(&self.model)
                    .preamble(&request.system)
                    .temperature(self.temperature)
                    .build();
                agent.prompt(prompt.as_str()).await
            }
            LlmProvider::OpenaiCompatible => {
                return Err(DomainError::internal(
                    "openai_compatible is served by OpenAiCompatibleLlm",
                ))
            }
        };

        result.map_err(|e| DomainError::generation(e.to_string()))
    }
}
