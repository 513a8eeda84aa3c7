use pdfsearch_core::{GeminiClient, PdfEngine, PgStore, ResponseCache};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;

/// Per-worker application state.
///
/// `store` is the one `PgConnection` this worker thread owns (see
/// `conn::serve_thread_per_core`); it is wrapped in a Tokio mutex only to
/// satisfy `Send` bounds on the handler future, never to arbitrate between
/// threads, since only this worker's own requests ever touch it. `cache`,
/// `renderer` and `llm` are the state genuinely shared across every worker.
pub struct AppState {
    pub store: AsyncMutex<PgStore>,
    pub cache: Arc<ResponseCache>,
    pub renderer: Arc<Mutex<PdfEngine>>,
    pub llm: Option<Arc<GeminiClient>>,
    pub cache_ttl: Duration,
}

impl AppState {
    pub fn new(
        store: PgStore,
        cache: Arc<ResponseCache>,
        renderer: Arc<Mutex<PdfEngine>>,
        llm: Option<Arc<GeminiClient>>,
        cache_ttl: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            store: AsyncMutex::new(store),
            cache,
            renderer,
            llm,
            cache_ttl,
        })
    }
}
