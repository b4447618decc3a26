//! External search capability: a thin Google Custom Search JSON API
//! client plus deterministic candidate ranking.
//!
//! The client fails open — any transport, HTTP, or decoding failure on a
//! search call logs a warning and yields an empty result list, so one bad
//! call never aborts an audit run. Missing credentials are surfaced once
//! at construction; the orchestrator then skips search for the whole run.

mod score;

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use linkaudit_shared::{Candidate, LinkAuditError, Result, SearchHints, SearchProviderConfig};

pub use score::{rank_candidates, score_candidate};

/// Google Custom Search JSON API endpoint.
const BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("linkaudit/", env!("CARGO_PKG_VERSION"));

/// The provider returns at most 10 results per call and at most ~100
/// overall; `start` beyond 91 is rejected.
const MAX_START_INDEX: u32 = 91;
const MAX_PAGE_SIZE: u32 = 10;

// ---------------------------------------------------------------------------
// Response shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: Option<String>,
}

// ---------------------------------------------------------------------------
// SearchClient
// ---------------------------------------------------------------------------

/// Paginated, rate-limited search capability.
pub struct SearchClient {
    client: Client,
    api_key: String,
    engine_id: String,
    endpoint: String,
    courtesy_delay: Duration,
}

impl SearchClient {
    /// Build a client from the env vars named in the config.
    ///
    /// Missing or empty credentials are a [`LinkAuditError::Search`];
    /// the caller decides whether that disables search or aborts.
    pub fn from_env(
        config: &SearchProviderConfig,
        timeout: Duration,
        courtesy_delay: Duration,
    ) -> Result<Self> {
        let api_key = read_env(&config.api_key_env)?;
        let engine_id = read_env(&config.engine_id_env)?;
        Self::new(api_key, engine_id, BASE_URL.to_string(), timeout, courtesy_delay)
    }

    fn new(
        api_key: String,
        engine_id: String,
        endpoint: String,
        timeout: Duration,
        courtesy_delay: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| LinkAuditError::Search(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            engine_id,
            endpoint,
            courtesy_delay,
        })
    }

    /// Fetch up to `num` result URLs (max 10 per call) for a query.
    ///
    /// `start_index` is 1-based and clamped to the provider's window.
    /// Fails open to an empty list, and always sleeps the courtesy delay
    /// before returning — rate limiting is policy, not optimization.
    pub async fn fetch_urls(&self, query: &str, start_index: u32, num: u32) -> Vec<String> {
        let start_index = start_index.clamp(1, MAX_START_INDEX);
        let num = num.clamp(1, MAX_PAGE_SIZE);

        let urls = match self.try_fetch(query, start_index, num).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!(query, start_index, error = %e, "search call failed, continuing with empty results");
                Vec::new()
            }
        };

        tokio::time::sleep(self.courtesy_delay).await;
        urls
    }

    async fn try_fetch(&self, query: &str, start_index: u32, num: u32) -> Result<Vec<String>> {
        let start = start_index.to_string();
        let num = num.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("start", start.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| LinkAuditError::Search(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LinkAuditError::Search(format!("HTTP {status}")));
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| LinkAuditError::Search(format!("bad response body: {e}")))?;

        Ok(data.items.into_iter().filter_map(|item| item.link).collect())
    }

    /// Search for a replacement link for a stale or broken category URL.
    ///
    /// Runs one query per site filter (or a single unscoped query when no
    /// filters are configured), paginates `pages` pages of 10, pools the
    /// results into a set, and returns the top-ranked candidate.
    #[instrument(skip(self, hints))]
    pub async fn find_replacement(
        &self,
        category: &str,
        hints: &SearchHints,
        pages: u32,
    ) -> Option<Candidate> {
        let base_query = build_query(category, hints);
        let mut pool: BTreeSet<String> = BTreeSet::new();

        let sites: Vec<&str> = if hints.site_filters.is_empty() {
            vec![""]
        } else {
            hints.site_filters.iter().map(String::as_str).collect()
        };

        for site in sites {
            let query = if site.is_empty() {
                base_query.clone()
            } else {
                format!("{base_query} site:{site}")
            };

            for page in 0..pages {
                let start_index = page * 10 + 1;
                let urls = self.fetch_urls(&query, start_index, MAX_PAGE_SIZE).await;
                debug!(query, start_index, count = urls.len(), "search page fetched");
                pool.extend(urls);
            }
        }

        if pool.is_empty() {
            return None;
        }

        let ranked = rank_candidates(
            &pool,
            hints.primary_domain(),
            &hints.expected_phrases,
            hints.expected_ext.as_deref(),
        );
        let best = ranked.into_iter().next();
        if let Some(candidate) = &best {
            info!(url = %candidate.url, score = candidate.score, "top replacement candidate");
        }
        best
    }
}

fn read_env(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(LinkAuditError::Search(format!(
            "search credentials not found: set the {var_name} environment variable"
        ))),
    }
}

/// Build the provider query: quoted phrases (category name first), then
/// an optional filetype restriction. Site scoping is appended per call.
fn build_query(category: &str, hints: &SearchHints) -> String {
    let quoted: Vec<String> = std::iter::once(category)
        .chain(hints.expected_phrases.iter().map(String::as_str))
        .filter(|p| !p.is_empty())
        .map(|p| format!("\"{p}\""))
        .collect();

    let mut query = quoted.join(" ");
    if let Some(ext) = hints.expected_ext.as_deref() {
        query.push_str(&format!(" filetype:{}", ext.trim_start_matches('.')));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(endpoint: String) -> SearchClient {
        SearchClient::new(
            "test-key".into(),
            "test-engine".into(),
            endpoint,
            Duration::from_secs(2),
            Duration::from_millis(5),
        )
        .expect("build search client")
    }

    fn hints(filters: &[&str], phrases: &[&str], ext: Option<&str>) -> SearchHints {
        SearchHints {
            site_filters: filters.iter().map(|s| s.to_string()).collect(),
            expected_phrases: phrases.iter().map(|s| s.to_string()).collect(),
            expected_ext: ext.map(String::from),
            primary_domain: None,
        }
    }

    #[test]
    fn query_construction() {
        let h = hints(&[], &["CRT", "Spending Policy"], Some("pdf"));
        assert_eq!(
            build_query("Conference Travel", &h),
            "\"Conference Travel\" \"CRT\" \"Spending Policy\" filetype:pdf"
        );

        let bare = hints(&[], &[], None);
        assert_eq!(build_query("Dental", &bare), "\"Dental\"");
    }

    #[test]
    fn missing_credentials_error() {
        let err = read_env("LINKAUDIT_TEST_NONEXISTENT_VAR_93471").unwrap_err();
        assert!(err.to_string().contains("LINKAUDIT_TEST_NONEXISTENT_VAR_93471"));
    }

    #[tokio::test]
    async fn fetch_urls_parses_items() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "items": [
                {"link": "https://example.edu/a.pdf"},
                {"link": "https://example.edu/b.pdf"},
                {"title": "no link field"}
            ]
        });

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "test query"))
            .and(query_param("start", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = test_client(format!("{}/search", server.uri()));
        let urls = client.fetch_urls("test query", 1, 10).await;

        assert_eq!(
            urls,
            vec![
                "https://example.edu/a.pdf".to_string(),
                "https://example.edu/b.pdf".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn fetch_urls_fails_open_on_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = test_client(format!("{}/search", server.uri()));
        let urls = client.fetch_urls("anything", 1, 10).await;
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn fetch_urls_clamps_provider_window() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("start", "91"))
            .and(query_param("num", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(format!("{}/search", server.uri()));
        // Out-of-window values must be clamped, not rejected
        let urls = client.fetch_urls("q", 500, 99).await;
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn find_replacement_ranks_pooled_results() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "items": [
                {"link": "https://elsewhere.example.com/notes.html"},
                {"link": "https://studentgov.example.edu/CRT-Spending-Policy-2025.pdf"},
                {"link": "https://studentgov.example.edu/CRT-Spending-Policy-2025.pdf"}
            ]
        });

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = test_client(format!("{}/search", server.uri()));
        let h = hints(&["studentgov.example.edu"], &["CRT"], Some("pdf"));

        let best = client
            .find_replacement("Conference Travel", &h, 1)
            .await
            .expect("candidate");

        assert_eq!(
            best.url,
            "https://studentgov.example.edu/CRT-Spending-Policy-2025.pdf"
        );
        // +20 domain (primary = first site filter) +10 ext +10 phrase +5 year
        assert_eq!(best.score, 45);
    }

    #[tokio::test]
    async fn find_replacement_empty_pool_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = test_client(format!("{}/search", server.uri()));
        let h = hints(&["a.example.edu"], &[], None);
        assert!(client.find_replacement("X", &h, 2).await.is_none());
    }
}
