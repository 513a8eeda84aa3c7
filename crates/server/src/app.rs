use axum::routing::get;
use axum::http::{header, Method};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::routes;
use crate::state::AppState;

/// Build the Axum application router: the five search/browse/render
/// endpoints, plus permissive CORS for the browser UI.
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/api/search", get(routes::search::search))
        .route("/api/list-files", get(routes::files::list_files))
        .route("/api/list-files/{file_id}", get(routes::files::get_file))
        .route(
            "/api/file/{file_id}/page/{page_num}",
            get(routes::page::get_page),
        )
        .route(
            "/api/file/{file_id}/render-page/{page_num}",
            get(routes::render::render_page),
        )
        .layer(cors)
        .with_state(state)
}
