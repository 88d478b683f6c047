use async_stream::stream;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::application::ChatTurn;
use crate::domain::{DomainError, DEFAULT_THREAD_ID};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    pub thread_id: Option<String>,
    /// Client-chosen id; a retried request with the same id is stored once.
    pub request_id: Option<Uuid>,
}

impl ChatRequest {
    fn into_turn(self) -> ChatTurn {
        let thread_id = self
            .thread_id
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_THREAD_ID.to_string());
        ChatTurn::new(self.question, thread_id).with_request_id(self.request_id)
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub thread_id: String,
}

pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let turn = request.into_turn();
    let thread_id = turn.thread_id.clone();
    let message = state.rag.run(turn).await?;

    Ok(Json(ChatResponse {
        answer: message.content,
        thread_id,
    }))
}

/// Streams the answer as SSE: `token` events, then `done` or `error`.
///
/// A client that disconnects drops the stream, so nothing is stored.
pub async fn chat_stream_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let mut answer = state.rag.run_stream(request.into_turn()).await?;
    let thread_id = answer.thread_id().to_string();

    let events = stream! {
        let mut failed = false;
        while let Some(fragment) = answer.next().await {
            match fragment {
                Ok(content) => yield Ok::<_, Infallible>(json_event("token", json!({ "content": content }))),
                Err(e) => {
                    tracing::error!(thread_id = %thread_id, error = %e, "stream aborted");
                    yield Ok(error_event(&e));
                    failed = true;
                    break;
                }
            }
        }
        if !failed {
            yield Ok(json_event("done", json!({ "thread_id": thread_id })));
        }
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn error_event(e: &DomainError) -> Event {
    json_event("error", json!({ "error": e.kind(), "message": e.message() }))
}

fn json_event(name: &str, data: serde_json::Value) -> Event {
    Event::default().event(name).data(data.to_string())
}
