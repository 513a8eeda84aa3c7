use serde::{Deserialize, Serialize};

/// Configuration for a directory-tree ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Root directory to walk for PDFs.
    pub root: std::path::PathBuf,

    /// Skip PDFs with fewer than this many pages (default: 4).
    #[serde(default = "default_min_pages")]
    pub min_pages: u32,

    /// Number of PDFs processed concurrently (default: 4).
    #[serde(default = "default_concurrent_files")]
    pub max_concurrent_files: usize,

    /// Log what would be ingested without writing to the store.
    #[serde(default)]
    pub dry_run: bool,

    /// Tokeniser byte limit applied before sanitisation (default: 2046).
    #[serde(default = "default_tokenizer_limit")]
    pub tokenizer_limit: usize,
}

fn default_min_pages() -> u32 {
    4
}

fn default_concurrent_files() -> usize {
    4
}

fn default_tokenizer_limit() -> usize {
    2046
}

impl IngestConfig {
    pub fn new(root: std::path::PathBuf) -> Self {
        Self {
            root,
            min_pages: default_min_pages(),
            max_concurrent_files: default_concurrent_files(),
            dry_run: false,
            tokenizer_limit: default_tokenizer_limit(),
        }
    }
}

/// Configuration for the HTTP search server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: 0.0.0.0).
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Bind port (default: 8080).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Postgres connection string.
    pub pgconn: String,

    /// Gemini API key; when absent, AI summaries are disabled.
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name (default: gemini-2.0-flash).
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Cache capacity in entries (default: 1024).
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Default cache entry time-to-live in seconds (default: 60).
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_cache_capacity() -> usize {
    1024
}

fn default_cache_ttl_secs() -> u64 {
    60
}

impl ServerConfig {
    pub fn new(pgconn: String) -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
            pgconn,
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}
