use axum::extract::State;
use axum::Json;
use pdfsearch_core::context::build_answer_context;
use pdfsearch_core::query::{search_cache_key, SearchResponse};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::extract::Query;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: String,
    file_id: Option<i64>,
    #[serde(default = "default_ai_enabled")]
    ai_enabled: bool,
}

fn default_ai_enabled() -> bool {
    true
}

/// `GET /api/search?q=&file_id=&ai_enabled=`
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if params.q.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "missing required query parameter `q`".to_string(),
        ));
    }

    let cache_key = search_cache_key(&params.q, params.file_id);
    if let Some(cached) = state.cache.get(cache_key.as_bytes()) {
        let value: serde_json::Value =
            serde_json::from_slice(&cached).map_err(|e| ApiError::Internal(e.to_string()))?;
        return Ok(Json(value));
    }

    let rows = {
        let mut store = state.store.lock().await;
        store.search(&params.q, params.file_id).await?
    };

    let ai_summary = maybe_summarize(&state, &params, &rows).await;

    let response = SearchResponse::new(params.q.clone(), &rows, ai_summary);
    let value = serde_json::to_value(&response).map_err(|e| ApiError::Internal(e.to_string()))?;
    let bytes = serde_json::to_vec(&value).map_err(|e| ApiError::Internal(e.to_string()))?;
    state
        .cache
        .set(cache_key.as_bytes(), bytes, Some(state.cache_ttl));

    Ok(Json(value))
}

async fn maybe_summarize(
    state: &AppState,
    params: &SearchParams,
    rows: &[pdfsearch_core::SearchRow],
) -> Option<String> {
    if !params.ai_enabled || params.file_id.is_some() || rows.is_empty() {
        return None;
    }
    let llm = state.llm.as_ref()?;
    let context = build_answer_context(rows);
    let bytes = llm
        .ask_cached(&state.cache, &params.q, &context, state.cache_ttl)
        .await?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}
