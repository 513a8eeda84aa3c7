//! The relational-store seam. The ingestion and search
//! paths never hold a `sqlx` connection directly; they go through
//! [`postgres::PgStore`], which is the only module aware of the SQL shape.

pub mod postgres;

use serde::{Deserialize, Serialize};

/// A persisted PDF file.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FileRecord {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub num_pages: i32,
}
