use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use std::time::Duration;

use crate::domain::{
    ports::{CompletionRequest, LlmService, TextStream},
    DomainError, MessageRole,
};
use crate::infrastructure::config::LlmConfig;
use crate::infrastructure::llm::sse::{parse_sse_line, SseEvent};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Chat completions over plain HTTP against any OpenAI-compatible endpoint
/// (Groq, OpenAI, vLLM, Ollama). Streams with server-sent events.
pub struct OpenAiCompatibleLlm {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl OpenAiCompatibleLlm {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.2,
        })
    }

    /// Reads the API key from the environment variable named in the config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, DomainError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            DomainError::validation(format!("{} is not set", config.api_key_env))
        })?;

        Ok(Self::new(&config.api_base, api_key, &config.model)?.with_temperature(config.temperature))
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    fn body(&self, request: &CompletionRequest, stream: bool) -> serde_json::Value {
        let mut messages = vec![json!({ "role": "system", "content": request.system })];
        messages.extend(request.history.iter().map(|m| {
            let role = match m.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            json!({ "role": role, "content": m.content })
        }));
        messages.push(json!({ "role": "user", "content": request.prompt }));

        json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "stream": stream,
        })
    }

    async fn send(&self, body: &serde_json::Value) -> Result<reqwest::Response, DomainError> {
        tracing::debug!(model = %self.model, endpoint = %self.endpoint(), "sending completion request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DomainError::generation(format!("{status}: {detail}")));
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmService for OpenAiCompatibleLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        let response = self.send(&self.body(request, false)).await?;
        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DomainError::generation(e.to_string()))?;

        json["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .map(str::to_string)
            .ok_or_else(|| DomainError::generation("completion has no message content"))
    }

    async fn stream(&self, request: &CompletionRequest) -> Result<TextStream, DomainError> {
        let response = self.send(&self.body(request, true)).await?;
        let mut bytes = response.bytes_stream().boxed();

        let fragments = try_stream! {
            let mut buffer: Vec<u8> = Vec::new();

            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk
                    .map_err(|e| DomainError::generation(format!("stream interrupted: {e}")))?;
                buffer.extend_from_slice(&chunk);

                while let Some(end) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=end).collect();
                    let line = String::from_utf8_lossy(&line);

                    match parse_sse_line(line.trim())? {
                        Some(SseEvent::Delta(text)) => yield text,
                        Some(SseEvent::Done) => break 'read,
                        None => {}
                    }
                }
            }
        };

        Ok(fragments.boxed())
    }
}
