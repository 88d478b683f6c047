use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

const MAX_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: String,
    pub document_id: Uuid,
    pub document_name: String,
    pub chunks_added: usize,
}

#[derive(Debug, Deserialize)]
pub struct SearchDocumentsRequest {
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResultResponse {
    pub chunk_id: Uuid,
    pub document_id: Uuid,
    pub source: String,
    pub content: String,
    pub score: f32,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultResponse>,
}

/// Accepts a multipart form with a `file` field.
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("file field has no file name"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        let report = state.documents.ingest_upload(&filename, &bytes).await?;

        return Ok(Json(UploadResponse {
            status: "ingested".to_string(),
            document_id: report.document.id,
            document_name: report.document.name,
            chunks_added: report.chunks_added,
        }));
    }

    Err(ApiError::bad_request("multipart field `file` is required"))
}

pub async fn search_documents(
    State(state): State<AppState>,
    Json(request): Json<SearchDocumentsRequest>,
) -> ApiResult<Json<SearchResponse>> {
    if request.query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty"));
    }

    let limit = request
        .limit
        .unwrap_or_else(|| state.retriever.top_k())
        .min(MAX_SEARCH_LIMIT);
    let results = state.retriever.search(&request.query, limit).await?;

    Ok(Json(SearchResponse {
        results: results
            .into_iter()
            .map(|r| SearchResultResponse {
                chunk_id: r.chunk.id,
                document_id: r.chunk.document_id,
                source: r.chunk.metadata.source,
                content: r.chunk.content,
                score: r.score,
            })
            .collect(),
    }))
}
