use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub conversation_store: String,
    pub vector_store: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let conversation_store = match state.rag.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "conversation store not reachable");
            "disconnected"
        }
    };
    let vector_store = match state.index.len().await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "vector store not reachable");
            "disconnected"
        }
    };

    let ready = conversation_store == "connected" && vector_store == "connected";
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            status: if ready { "ready" } else { "not_ready" }.into(),
            conversation_store: conversation_store.into(),
            vector_store: vector_store.into(),
        }),
    )
}
