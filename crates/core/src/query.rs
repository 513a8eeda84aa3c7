//! Search query composition: the two SQL variants (global and per-file) and
//! the JSON shape returned to callers.

use serde::Serialize;

/// One ranked row returned by [`crate::store::Store::search`].
///
/// `extended_snippet` is never serialised to callers directly; it feeds the
/// answer-context builder (`crate::context`) instead.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchRow {
    pub file_id: i64,
    pub file_name: String,
    pub num_pages: i32,
    pub page_num: i32,
    pub snippet: String,
    pub extended_snippet: String,
    pub rank: f64,
}

/// Maximum rows returned by a search (matches the query's own `LIMIT 100`).
pub const MAX_RESULTS: usize = 100;

/// Return the SQL text for a search, scoped to one file when `file_scoped`
/// is true. Parameter `$1` is always the raw query string; `$2`, present
/// only in the file-scoped variant, is the file id.
pub fn compose_search_sql(file_scoped: bool) -> &'static str {
    if file_scoped {
        SEARCH_SQL_BY_FILE
    } else {
        SEARCH_SQL_GLOBAL
    }
}

const SEARCH_SQL_GLOBAL: &str = r#"
WITH input_queries AS (
    SELECT websearch_to_tsquery('english', $1) AS broad_query,
           phraseto_tsquery('english', $1) AS phrase_query
),
RankedPages AS (
    SELECT p.file_id, p.page_num,
           ts_rank_cd(p.text_vector, inputs.broad_query)
             + CASE WHEN p.text_vector @@ inputs.phrase_query THEN 10.0 ELSE 0.0 END
           AS rank
    FROM pages p CROSS JOIN input_queries inputs
    WHERE p.text_vector @@ inputs.broad_query
    ORDER BY rank DESC LIMIT 100
),
UniquePages AS (
    SELECT DISTINCT ON (file_id, page_num) file_id, page_num, rank
    FROM RankedPages ORDER BY file_id, page_num, rank DESC
)
SELECT u.file_id, f.name AS file_name, f.num_pages, u.page_num,
       ts_headline('english', p.text, inputs.broad_query,
                   'StartSel=<b>, StopSel=</b>, MaxWords=200, MinWords=20') AS snippet,
       LEFT(p.text, 2000) AS extended_snippet,
       u.rank
FROM UniquePages u CROSS JOIN input_queries inputs
JOIN files f ON u.file_id = f.id
JOIN pages p ON u.file_id = p.file_id AND u.page_num = p.page_num
ORDER BY u.rank DESC, f.name, u.page_num LIMIT 100;
"#;

const SEARCH_SQL_BY_FILE: &str = r#"
WITH input_queries AS (
    SELECT websearch_to_tsquery('english', $1) AS broad_query,
           phraseto_tsquery('english', $1) AS phrase_query
),
RankedPages AS (
    SELECT p.file_id, p.page_num,
           ts_rank_cd(p.text_vector, inputs.broad_query)
             + CASE WHEN p.text_vector @@ inputs.phrase_query THEN 10.0 ELSE 0.0 END
           AS rank
    FROM pages p CROSS JOIN input_queries inputs
    WHERE p.text_vector @@ inputs.broad_query
    AND p.file_id = $2
    ORDER BY rank DESC LIMIT 100
),
UniquePages AS (
    SELECT DISTINCT ON (file_id, page_num) file_id, page_num, rank
    FROM RankedPages ORDER BY file_id, page_num, rank DESC
)
SELECT u.file_id, f.name AS file_name, f.num_pages, u.page_num,
       ts_headline('english', p.text, inputs.broad_query,
                   'StartSel=<b>, StopSel=</b>, MaxWords=200, MinWords=20') AS snippet,
       LEFT(p.text, 2000) AS extended_snippet,
       u.rank
FROM UniquePages u CROSS JOIN input_queries inputs
JOIN files f ON u.file_id = f.id
JOIN pages p ON u.file_id = p.file_id AND u.page_num = p.page_num
ORDER BY u.rank DESC, f.name, u.page_num LIMIT 100;
"#;

/// One result item as returned to callers over HTTP.
#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub file_id: i64,
    pub file_name: String,
    pub page_num: i32,
    pub num_pages: i32,
    pub snippet: String,
}

/// The `/api/search` response body.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    pub count: usize,
    pub query: String,
    pub ai_summary: Option<String>,
}

impl SearchResponse {
    pub fn new(query: String, rows: &[SearchRow], ai_summary: Option<String>) -> Self {
        let results: Vec<SearchResultItem> = rows
            .iter()
            .map(|r| SearchResultItem {
                file_id: r.file_id,
                file_name: r.file_name.clone(),
                page_num: r.page_num,
                num_pages: r.num_pages,
                snippet: r.snippet.clone(),
            })
            .collect();
        let count = results.len();
        Self {
            results,
            count,
            query,
            ai_summary,
        }
    }
}

/// Cache key for a search response: note this deliberately omits whether AI
/// summarisation was requested, so a cached response generated with AI
/// enabled can be served to an `ai_enabled=false` caller within the TTL.
/// This mirrors the reference behaviour.
pub fn search_cache_key(query: &str, file_id: Option<i64>) -> String {
    match file_id {
        Some(id) => format!("search:{query}:{id}"),
        None => format!("search:{query}:all"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_variant_has_no_file_filter() {
        assert!(!compose_search_sql(false).contains("p.file_id = $2"));
    }

    #[test]
    fn file_scoped_variant_adds_file_filter() {
        assert!(compose_search_sql(true).contains("AND p.file_id = $2"));
    }

    #[test]
    fn both_variants_cap_at_100_rows() {
        assert!(compose_search_sql(false).trim_end().ends_with("LIMIT 100;"));
        assert!(compose_search_sql(true).trim_end().ends_with("LIMIT 100;"));
    }

    #[test]
    fn cache_key_omits_ai_enabled() {
        assert_eq!(search_cache_key("foo", None), "search:foo:all");
        assert_eq!(search_cache_key("foo", Some(9)), "search:foo:9");
    }

    #[test]
    fn search_response_counts_match_results_len() {
        let rows = vec![SearchRow {
            file_id: 1,
            file_name: "a.pdf".into(),
            num_pages: 3,
            page_num: 1,
            snippet: "hi".into(),
            extended_snippet: "hi there".into(),
            rank: 1.0,
        }];
        let resp = SearchResponse::new("hi".into(), &rows, None);
        assert_eq!(resp.count, 1);
        assert_eq!(resp.results.len(), 1);
    }
}
