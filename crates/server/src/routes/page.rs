use axum::extract::State;
use axum::Json;
use pdfsearch_core::cache::make_key;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::extract::Path;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
struct PageResponse {
    file_id: i64,
    page_num: i32,
    text: String,
}

/// `GET /api/file/{file_id}/page/{page_num}`
pub async fn get_page(
    State(state): State<Arc<AppState>>,
    Path((file_id, page_num)): Path<(i64, i32)>,
) -> Result<Json<PageResponse>, ApiError> {
    let cache_key = make_key(file_id, page_num as i64);
    if let Some(cached) = state.cache.get(cache_key.as_bytes()) {
        let value: PageResponse =
            serde_json::from_slice(&cached).map_err(|e| ApiError::Internal(e.to_string()))?;
        return Ok(Json(value));
    }

    let text = {
        let mut store = state.store.lock().await;
        store.fetch_page_text(file_id, page_num).await?
    }
    .ok_or_else(|| ApiError::NotFound(format!("page {page_num} of file {file_id} not found")))?;

    let response = PageResponse {
        file_id,
        page_num,
        text,
    };
    let bytes = serde_json::to_vec(&response).map_err(|e| ApiError::Internal(e.to_string()))?;
    state
        .cache
        .set(cache_key.as_bytes(), bytes, Some(state.cache_ttl));

    Ok(Json(response))
}
