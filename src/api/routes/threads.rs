use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::domain::Message;

#[derive(Debug, Serialize)]
pub struct NewThreadResponse {
    pub thread_id: String,
}

#[derive(Debug, Serialize)]
pub struct ThreadListResponse {
    pub threads: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ThreadMessagesResponse {
    pub thread_id: String,
    pub messages: Vec<Message>,
}

/// Mints an id only; the thread is stored with its first exchange.
pub async fn create_thread(State(state): State<AppState>) -> (StatusCode, Json<NewThreadResponse>) {
    (
        StatusCode::CREATED,
        Json(NewThreadResponse {
            thread_id: state.rag.new_thread(),
        }),
    )
}

pub async fn list_threads(State(state): State<AppState>) -> ApiResult<Json<ThreadListResponse>> {
    Ok(Json(ThreadListResponse {
        threads: state.rag.threads().await?,
    }))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadMessagesResponse>> {
    let messages = state.rag.history(&thread_id).await?;
    Ok(Json(ThreadMessagesResponse {
        thread_id,
        messages,
    }))
}
