//! The connection allocator: one OS thread per
//! server worker, each running its own single-threaded Tokio runtime and
//! its own `axum::serve` instance bound to a shared `SO_REUSEPORT` listener,
//! so the kernel — not userspace — load-balances accepted connections.
//! Each worker owns exactly one un-pooled Postgres connection; the cache,
//! renderer and LLM client are the only state shared across workers.

use crate::app::create_app;
use crate::state::AppState;
use pdfsearch_core::{GeminiClient, PdfEngine, PgStore, ResponseCache};
use socket2::{Domain, Socket, Type};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Bring up `worker_count` worker threads and block until all of them exit.
pub fn serve_thread_per_core(
    addr: SocketAddr,
    pgconn: String,
    worker_count: usize,
    cache_capacity: usize,
    cache_ttl: Duration,
    gemini_api_key: Option<String>,
    gemini_model: String,
) -> anyhow::Result<()> {
    let cache = Arc::new(ResponseCache::new(cache_capacity, cache_ttl));
    let renderer = Arc::new(Mutex::new(PdfEngine::new()?));
    let llm = gemini_api_key.map(|key| Arc::new(GeminiClient::new(key, gemini_model.clone())));

    let mut threads = Vec::with_capacity(worker_count);
    for worker_id in 0..worker_count {
        let cache = cache.clone();
        let renderer = renderer.clone();
        let llm = llm.clone();
        let pgconn = pgconn.clone();

        let handle = std::thread::Builder::new()
            .name(format!("pdfsearch-worker-{worker_id}"))
            .spawn(move || run_worker(worker_id, addr, pgconn, cache, renderer, llm, cache_ttl))
            .expect("failed to spawn worker thread");

        threads.push(handle);
    }

    for handle in threads {
        let _ = handle.join();
    }

    Ok(())
}

fn run_worker(
    worker_id: usize,
    addr: SocketAddr,
    pgconn: String,
    cache: Arc<ResponseCache>,
    renderer: Arc<Mutex<PdfEngine>>,
    llm: Option<Arc<GeminiClient>>,
    cache_ttl: Duration,
) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build per-worker tokio runtime");

    rt.block_on(async move {
        let listener = match bind_reuseport(addr) {
            Ok(l) => l,
            Err(e) => {
                tracing::error!("worker {worker_id} failed to bind {addr}: {e}");
                return;
            }
        };

        let store = match PgStore::connect(&pgconn).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("worker {worker_id} failed to connect to store: {e}");
                return;
            }
        };

        let state = AppState::new(store, cache, renderer, llm, cache_ttl);
        let app = create_app(state);

        tracing::info!("worker {worker_id} listening on {addr}");
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("worker {worker_id} server error: {e}");
        }
    });
}

fn bind_reuseport(addr: SocketAddr) -> std::io::Result<tokio::net::TcpListener> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };
    let socket = Socket::new(domain, Type::STREAM, None)?;
    socket.set_reuse_address(true)?;
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;
    tokio::net::TcpListener::from_std(socket.into())
}
