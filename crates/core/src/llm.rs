//! Cached client for the external Gemini-style answer endpoint.
//!
//! Grounded on the retry/timeout/truncated-error-body shape of the
//! teacher's `provider/anthropic.rs`, but rewritten as a single direct
//! `reqwest` POST rather than a multi-provider abstraction, since this
//! service only ever calls one fixed endpoint.

use crate::cache::ResponseCache;
use crate::sanitize::truncate_to_limit;
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const ERROR_BODY_TRUNCATE: usize = 500;

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            api_key,
            model,
        }
    }

    /// Answer `query` given `context`, consulting and populating `cache`
    /// first. The cache key is the exact query string — `context` does not
    /// participate in the key, so repeated queries over a changed result set
    /// can return a stale answer until the entry's TTL expires.
    pub async fn ask_cached(
        &self,
        cache: &ResponseCache,
        query: &str,
        context: &str,
        ttl: Duration,
    ) -> Option<Arc<[u8]>> {
        let key = format!("llm:{query}");
        if let Some(cached) = cache.get(key.as_bytes()) {
            return Some(cached);
        }

        let text = self.call_endpoint(query, context).await?;
        let bytes = text.into_bytes();
        cache.set(key.as_bytes(), bytes.clone(), Some(ttl));
        Some(Arc::from(bytes.into_boxed_slice()))
    }

    async fn call_endpoint(&self, query: &str, context: &str) -> Option<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": build_prompt(query, context) }] }]
        });

        let response = match self.http.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("gemini request failed: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let truncated = truncate_to_limit(&body, ERROR_BODY_TRUNCATE);
            tracing::warn!("gemini returned {status}: {truncated}");
            return None;
        }

        let parsed: serde_json::Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("failed to parse gemini response: {e}");
                return None;
            }
        };

        parsed["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
    }
}

fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "You are answering a question using only the excerpts below. \
         Respond with HTML only, no markdown.\n\nQuestion: {query}\n\nExcerpts:\n{context}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_query_and_context() {
        let prompt = build_prompt("what is x", "=== EXCERPT 1 ===\nsome text\n");
        assert!(prompt.contains("what is x"));
        assert!(prompt.contains("some text"));
    }
}
