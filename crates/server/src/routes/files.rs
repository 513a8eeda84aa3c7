use axum::extract::State;
use axum::Json;
use pdfsearch_core::cache::make_key;
use pdfsearch_core::FileRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::extract::{Path, Query};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListFilesParams {
    #[serde(default = "default_page")]
    page: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    name: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    25
}

#[derive(Debug, Serialize, Deserialize)]
struct ListFilesResponse {
    files: Vec<FileRecord>,
    total: i64,
    page: i64,
    limit: i64,
}

/// `GET /api/list-files?page=&limit=&name=`
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListFilesParams>,
) -> Result<Json<ListFilesResponse>, ApiError> {
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let name_filter = params.name.as_deref().unwrap_or("");

    let cache_key = format!("list-files:{page}:{limit}:{name_filter}");
    if let Some(cached) = state.cache.get(cache_key.as_bytes()) {
        let value: ListFilesResponse =
            serde_json::from_slice(&cached).map_err(|e| ApiError::Internal(e.to_string()))?;
        return Ok(Json(value));
    }

    let (files, total) = {
        let mut store = state.store.lock().await;
        store
            .list_files(page, limit, params.name.as_deref())
            .await?
    };

    let response = ListFilesResponse {
        files,
        total,
        page,
        limit,
    };
    let bytes = serde_json::to_vec(&response).map_err(|e| ApiError::Internal(e.to_string()))?;
    state
        .cache
        .set(cache_key.as_bytes(), bytes, Some(state.cache_ttl));

    Ok(Json(response))
}

/// `GET /api/list-files/{file_id}`
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i64>,
) -> Result<Json<FileRecord>, ApiError> {
    let cache_key = make_key(file_id, -1);
    if let Some(cached) = state.cache.get(cache_key.as_bytes()) {
        let value: FileRecord =
            serde_json::from_slice(&cached).map_err(|e| ApiError::Internal(e.to_string()))?;
        return Ok(Json(value));
    }

    let file = {
        let mut store = state.store.lock().await;
        store.fetch_file_by_id(file_id).await?
    }
    .ok_or_else(|| ApiError::NotFound(format!("file {file_id} not found")))?;

    let bytes = serde_json::to_vec(&file).map_err(|e| ApiError::Internal(e.to_string()))?;
    state
        .cache
        .set(cache_key.as_bytes(), bytes, Some(state.cache_ttl));

    Ok(Json(file))
}
