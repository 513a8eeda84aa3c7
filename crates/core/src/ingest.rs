//! Directory-tree ingestion: discover PDFs, extract and sanitise each page,
//! and commit per-file transactions.
//!
//! The worker-pool shape (bounded semaphore + `JoinSet`, one task per unit
//! of work, permit held for the task's lifetime) mirrors the per-page
//! pipeline elsewhere in this crate; the unit of work here is one whole
//! file rather than one page.

use crate::config::IngestConfig;
use crate::error::{CoreError, CoreResult};
use crate::pdf::PdfEngine;
use crate::sanitize::{sanitize_page_text, truncate_to_limit, SanitizeOptions};
use crate::store::postgres::PgStore;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const SKIP_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "target",
    "node_modules",
    "__pycache__",
    ".venv",
    "venv",
    "dist",
    "build",
];

/// Tally of what an ingestion run did.
#[derive(Debug, Default, Clone, Copy)]
pub struct IngestSummary {
    pub files_seen: usize,
    pub files_ingested: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
}

/// Walk `config.root`, ingest every PDF with at least `config.min_pages`
/// pages, and return a summary. In dry-run mode nothing is written.
pub async fn run_ingest(config: &IngestConfig, pgconn: &str) -> CoreResult<IngestSummary> {
    let mut main_store = PgStore::connect(pgconn).await?;
    main_store.ensure_schema().await?;

    let renderer = PdfEngine::new()?;
    let candidates = walk_pdfs(&config.root);
    let mut summary = IngestSummary {
        files_seen: candidates.len(),
        ..Default::default()
    };

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_files));
    let success = Arc::new(AtomicBool::new(true));
    let mut tasks: JoinSet<bool> = JoinSet::new();

    for path in candidates {
        let npages = match renderer.open_document(&path) {
            Ok(doc) => PdfEngine::page_count(&doc),
            Err(e) => {
                tracing::warn!("failed to open {}: {e}", path.display());
                summary.files_skipped += 1;
                continue;
            }
        };

        if npages == 0 || npages < config.min_pages {
            tracing::info!(
                "skipping {} ({npages} pages, need {})",
                path.display(),
                config.min_pages
            );
            summary.files_skipped += 1;
            continue;
        }

        if config.dry_run {
            tracing::info!("[dry-run] would ingest {} ({npages} pages)", path.display());
            continue;
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let path_str = path.to_string_lossy().to_string();
        let file_id = main_store.upsert_file(&name, &path_str, npages as i32).await?;

        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("ingestion semaphore closed unexpectedly");
        let pgconn = pgconn.to_string();
        let tokenizer_limit = config.tokenizer_limit;
        let success = success.clone();
        let task_path = path.clone();

        tasks.spawn(async move {
            let _permit = permit;
            match ingest_one_file(&pgconn, file_id, &task_path, npages, tokenizer_limit).await {
                Ok(true) => true,
                Ok(false) => {
                    success.store(false, Ordering::SeqCst);
                    false
                }
                Err(e) => {
                    tracing::warn!("ingestion failed for {}: {e}", task_path.display());
                    success.store(false, Ordering::SeqCst);
                    false
                }
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(true) => summary.files_ingested += 1,
            Ok(false) => summary.files_failed += 1,
            Err(e) => {
                tracing::warn!("ingestion task panicked: {e}");
                summary.files_failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Process one file end to end on its own connection: re-open the PDF,
/// verify the page count still matches what the walker saw, extract and
/// sanitise every page, and commit in one transaction.
///
/// The PDF is deliberately re-opened here rather than threaded through from
/// the walker's open: the walker's handle exists only to learn the page
/// count and is closed before dispatch.
async fn ingest_one_file(
    pgconn: &str,
    file_id: i64,
    path: &Path,
    expected_pages: u32,
    tokenizer_limit: usize,
) -> CoreResult<bool> {
    let path_owned = path.to_path_buf();
    let pages = tokio::task::spawn_blocking(move || -> CoreResult<Vec<(i32, String)>> {
        let renderer = PdfEngine::new()?;
        let doc = renderer.open_document(&path_owned)?;
        let actual_pages = PdfEngine::page_count(&doc);
        if actual_pages != expected_pages {
            return Err(CoreError::Pdf(format!(
                "page count changed for {}: expected {expected_pages}, found {actual_pages}",
                path_owned.display()
            )));
        }

        let mut out = Vec::with_capacity(actual_pages as usize);
        for (idx, page) in doc.pages().iter().enumerate() {
            let raw = PdfEngine::extract_page_text(&page);
            if raw.is_empty() {
                continue;
            }
            let truncated = truncate_to_limit(&raw, tokenizer_limit);
            let clean = sanitize_page_text(truncated.as_bytes(), &SanitizeOptions::default());
            if clean.is_empty() {
                continue;
            }
            out.push(((idx + 1) as i32, clean));
        }
        Ok(out)
    })
    .await
    .map_err(|e| CoreError::Pdf(format!("ingestion worker task join error: {e}")))??;

    let mut store = PgStore::connect(pgconn).await?;
    store.insert_pages_transactional(file_id, &pages).await
}

fn walk_pdfs(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    walk_dir(root, &mut out);
    out
}

fn walk_dir(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!("failed to read directory {}: {e}", dir.display());
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let is_skipped = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| SKIP_DIRS.contains(&n))
                .unwrap_or(false);
            if is_skipped {
                continue;
            }
            walk_dir(&path, out);
        } else if is_pdf(&path) {
            out.push(path);
        }
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_dirs_are_excluded() {
        let dir = tempfile_dir();
        std::fs::create_dir_all(dir.join("target")).unwrap();
        std::fs::write(dir.join("target/ignored.pdf"), b"x").unwrap();
        std::fs::write(dir.join("kept.pdf"), b"x").unwrap();

        let found = walk_pdfs(&dir);
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("kept.pdf"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn pdf_match_is_case_insensitive() {
        let dir = tempfile_dir();
        std::fs::write(dir.join("a.PDF"), b"x").unwrap();
        std::fs::write(dir.join("b.txt"), b"x").unwrap();

        let found = walk_pdfs(&dir);
        assert_eq!(found.len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    fn tempfile_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pdfsearch-ingest-test-{:?}",
            std::thread::current().id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
