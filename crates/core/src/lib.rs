pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod pdf;
pub mod query;
pub mod sanitize;
pub mod store;

pub use cache::ResponseCache;
pub use config::{IngestConfig, ServerConfig};
pub use error::{CoreError, CoreResult};
pub use ingest::{run_ingest, IngestSummary};
pub use llm::GeminiClient;
pub use pdf::PdfEngine;
pub use query::{SearchResponse, SearchRow};
pub use store::postgres::PgStore;
pub use store::FileRecord;
