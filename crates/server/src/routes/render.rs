use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use pdfsearch_core::PdfEngine;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ApiError;
use crate::extract::{Path, Query};
use crate::state::AppState;

const RENDER_CACHE_CONTROL_SECS: u64 = 3600;
const RESPONSE_CACHE_TTL: Duration = Duration::from_secs(60);
const RENDER_DPI: u32 = 150;

#[derive(Debug, Deserialize)]
pub struct RenderParams {
    #[serde(rename = "type", default = "default_render_type")]
    kind: String,
}

fn default_render_type() -> String {
    "png".to_string()
}

/// `GET /api/file/{file_id}/render-page/{page_num}?type=png|pdf`
pub async fn render_page(
    State(state): State<Arc<AppState>>,
    Path((file_id, page_num)): Path<(i64, i32)>,
    Query(params): Query<RenderParams>,
) -> Result<Response, ApiError> {
    if params.kind != "png" && params.kind != "pdf" {
        return Err(ApiError::BadRequest(format!(
            "unsupported render type `{}`",
            params.kind
        )));
    }

    let cache_key = format!("render:{file_id}:{page_num}:{}", params.kind);
    if let Some(bytes) = state.cache.get(cache_key.as_bytes()) {
        return Ok(binary_response(bytes.to_vec(), &params.kind));
    }

    let path = {
        let mut store = state.store.lock().await;
        store.fetch_file_by_id(file_id).await?
    }
    .ok_or_else(|| ApiError::NotFound(format!("file {file_id} not found")))?
    .path;

    let bytes = render_bytes(&state, &path, page_num, &params.kind).await?;
    state
        .cache
        .set(cache_key.as_bytes(), bytes.clone(), Some(RESPONSE_CACHE_TTL));

    Ok(binary_response(bytes, &params.kind))
}

async fn render_bytes(
    state: &AppState,
    path: &str,
    page_num: i32,
    kind: &str,
) -> Result<Vec<u8>, ApiError> {
    if kind == "pdf" {
        return tokio::fs::read(path).await.map_err(ApiError::from);
    }

    let renderer = state.renderer.clone();
    let path = path.to_string();

    tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ApiError> {
        let engine = renderer.lock().expect("renderer mutex poisoned");
        let doc = engine
            .open_document(std::path::Path::new(&path))
            .map_err(ApiError::from)?;
        let page = doc
            .pages()
            .get((page_num - 1) as u16)
            .map_err(|_| ApiError::NotFound(format!("page {page_num} not found")))?;
        let (_, bytes) =
            PdfEngine::render_page_as_image(&page, RENDER_DPI).map_err(ApiError::from)?;
        Ok(bytes)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("render task join error: {e}")))?
}

fn binary_response(bytes: Vec<u8>, kind: &str) -> Response {
    let content_type = if kind == "pdf" {
        "application/pdf"
    } else {
        "image/png"
    };
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CACHE_CONTROL,
                format!("public, max-age={RENDER_CACHE_CONTROL_SECS}"),
            ),
        ],
        bytes,
    )
        .into_response()
}
