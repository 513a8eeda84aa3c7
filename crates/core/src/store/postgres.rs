//! PostgreSQL adapter. One `PgStore` wraps exactly one un-pooled
//! `PgConnection`, per the connection-allocator contract: every server
//! worker and every ingestion task owns its own.
//!
//! PostgreSQL is required because search depends on generated `tsvector`
//! columns, `websearch_to_tsquery`, `ts_rank_cd` and `ts_headline`, none of
//! which SQLite has.

use crate::error::CoreResult;
use crate::query::{compose_search_sql, SearchRow};
use crate::store::FileRecord;
use sqlx::postgres::PgConnection;
use sqlx::Connection;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    path TEXT NOT NULL,
    num_pages INT NOT NULL,
    UNIQUE(name, path)
);

CREATE TABLE IF NOT EXISTS pages (
    id BIGSERIAL PRIMARY KEY,
    file_id BIGINT NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    page_num INT NOT NULL,
    text TEXT NOT NULL,
    text_vector tsvector GENERATED ALWAYS AS (to_tsvector('english', text)) STORED,
    UNIQUE(file_id, page_num)
);

CREATE INDEX IF NOT EXISTS pages_text_vector_idx ON pages USING GIN (text_vector);
"#;

pub struct PgStore {
    conn: PgConnection,
}

impl PgStore {
    pub async fn connect(pgconn: &str) -> CoreResult<Self> {
        let conn = PgConnection::connect(pgconn).await?;
        Ok(Self { conn })
    }

    /// Apply the schema migration idempotently. Called once at server/CLI
    /// startup on whichever connection opens first.
    pub async fn ensure_schema(&mut self) -> CoreResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&mut self.conn).await?;
        Ok(())
    }

    /// Insert or update a file row, returning its id. Falls back to a plain
    /// `SELECT` when the `ON CONFLICT ... RETURNING` clause yields no row
    /// (legacy-conflict path).
    pub async fn upsert_file(&mut self, name: &str, path: &str, num_pages: i32) -> CoreResult<i64> {
        let row: Option<(i64,)> = sqlx::query_as(
            "INSERT INTO files (name, path, num_pages) VALUES ($1, $2, $3)
             ON CONFLICT (name, path) DO UPDATE SET num_pages = EXCLUDED.num_pages
             RETURNING id",
        )
        .bind(name)
        .bind(path)
        .bind(num_pages)
        .fetch_optional(&mut self.conn)
        .await?;

        if let Some((id,)) = row {
            return Ok(id);
        }

        let (id,): (i64,) = sqlx::query_as("SELECT id FROM files WHERE path = $1")
            .bind(path)
            .fetch_one(&mut self.conn)
            .await?;
        Ok(id)
    }

    /// Insert every page of one file inside a single transaction, committing
    /// only if every page insert succeeded; otherwise rolls back and
    /// reports `false`.
    pub async fn insert_pages_transactional(
        &mut self,
        file_id: i64,
        pages: &[(i32, String)],
    ) -> CoreResult<bool> {
        let mut tx = self.conn.begin().await?;
        let mut all_ok = true;

        for (page_num, text) in pages {
            let result = sqlx::query(
                "INSERT INTO pages (file_id, page_num, text) VALUES ($1, $2, $3)
                 ON CONFLICT (file_id, page_num) DO NOTHING",
            )
            .bind(file_id)
            .bind(page_num)
            .bind(text)
            .execute(&mut *tx)
            .await;

            if result.is_err() {
                all_ok = false;
            }
        }

        if all_ok {
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }
        Ok(all_ok)
    }

    pub async fn search(&mut self, query: &str, file_id: Option<i64>) -> CoreResult<Vec<SearchRow>> {
        let sql = compose_search_sql(file_id.is_some());
        let rows = match file_id {
            Some(id) => {
                sqlx::query_as::<_, SearchRow>(sql)
                    .bind(query)
                    .bind(id)
                    .fetch_all(&mut self.conn)
                    .await?
            }
            None => {
                sqlx::query_as::<_, SearchRow>(sql)
                    .bind(query)
                    .fetch_all(&mut self.conn)
                    .await?
            }
        };
        Ok(rows)
    }

    pub async fn fetch_page_text(&mut self, file_id: i64, page_num: i32) -> CoreResult<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT text FROM pages WHERE file_id = $1 AND page_num = $2")
                .bind(file_id)
                .bind(page_num)
                .fetch_optional(&mut self.conn)
                .await?;
        Ok(row.map(|(text,)| text))
    }

    pub async fn fetch_file_by_id(&mut self, file_id: i64) -> CoreResult<Option<FileRecord>> {
        let row = sqlx::query_as::<_, FileRecord>(
            "SELECT id, name, path, num_pages FROM files WHERE id = $1",
        )
        .bind(file_id)
        .fetch_optional(&mut self.conn)
        .await?;
        Ok(row)
    }

    /// Paginated file listing, optionally filtered by a case-insensitive
    /// name substring. `page` is 1-based and clamped by the caller.
    pub async fn list_files(
        &mut self,
        page: i64,
        limit: i64,
        name: Option<&str>,
    ) -> CoreResult<(Vec<FileRecord>, i64)> {
        let offset = (page - 1) * limit;

        if let Some(name) = name {
            let pattern = format!("%{name}%");
            let rows = sqlx::query_as::<_, FileRecord>(
                "SELECT id, name, path, num_pages FROM files
                 WHERE name ILIKE $1 ORDER BY name LIMIT $2 OFFSET $3",
            )
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut self.conn)
            .await?;

            let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files WHERE name ILIKE $1")
                .bind(&pattern)
                .fetch_one(&mut self.conn)
                .await?;

            Ok((rows, total))
        } else {
            let rows = sqlx::query_as::<_, FileRecord>(
                "SELECT id, name, path, num_pages FROM files ORDER BY name LIMIT $1 OFFSET $2",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut self.conn)
            .await?;

            let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files")
                .fetch_one(&mut self.conn)
                .await?;

            Ok((rows, total))
        }
    }
}
