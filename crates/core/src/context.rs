//! Answer-context builder: packs the top ranked search rows into a single
//! bounded text blob to hand to the LLM client.

use crate::query::SearchRow;

/// Hard cap on the assembled context.
pub const MAX_CONTEXT_SIZE: usize = 30 * 1024;
const INITIAL_CAPACITY: usize = 32 * 1024;
const MAX_EXCERPTS: usize = 15;

/// Build the excerpt blob handed to the LLM prompt. `rows` should already be
/// ranked (as returned by `Store::search`); only the first 15 are used.
///
/// `String`'s own growth strategy already doubles its backing buffer as
/// needed, so no manual capacity-doubling logic is required here; we only
/// seed the initial capacity and enforce the hard cap.
pub fn build_answer_context(rows: &[SearchRow]) -> String {
    let mut buf = String::with_capacity(INITIAL_CAPACITY.min(MAX_CONTEXT_SIZE));
    for (i, row) in rows.iter().take(MAX_EXCERPTS).enumerate() {
        let excerpt = format!(
            "\n=== EXCERPT {}: [{}, Page {} of {}] ===\n{}\n\n",
            i + 1,
            row.file_name,
            row.page_num,
            row.num_pages,
            row.extended_snippet
        );
        if buf.len() + excerpt.len() > MAX_CONTEXT_SIZE {
            break;
        }
        buf.push_str(&excerpt);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, page: i32, snippet: &str) -> SearchRow {
        SearchRow {
            file_id: 1,
            file_name: name.to_string(),
            num_pages: 10,
            page_num: page,
            snippet: snippet.to_string(),
            extended_snippet: snippet.to_string(),
            rank: 1.0,
        }
    }

    #[test]
    fn formats_one_excerpt() {
        let rows = vec![row("a.pdf", 2, "hello there")];
        let ctx = build_answer_context(&rows);
        assert!(ctx.contains("=== EXCERPT 1: [a.pdf, Page 2 of 10] ==="));
        assert!(ctx.contains("hello there"));
    }

    #[test]
    fn stops_at_fifteen_excerpts() {
        let rows: Vec<SearchRow> = (0..30).map(|i| row("a.pdf", i, "x")).collect();
        let ctx = build_answer_context(&rows);
        assert_eq!(ctx.matches("=== EXCERPT").count(), 15);
    }

    #[test]
    fn never_exceeds_hard_cap() {
        let huge = "x".repeat(20 * 1024);
        let rows: Vec<SearchRow> = (0..15).map(|i| row("a.pdf", i, &huge)).collect();
        let ctx = build_answer_context(&rows);
        assert!(ctx.len() <= MAX_CONTEXT_SIZE);
    }

    #[test]
    fn empty_rows_yield_empty_context() {
        assert_eq!(build_answer_context(&[]), "");
    }
}
