//! Link reachability probing: HEAD with GET fallback, auth-wall and
//! title detection.
//!
//! The prober never returns an error for expected network conditions —
//! timeouts, DNS failures, 4xx/5xx, and auth walls are recorded outcomes
//! in the [`ProbeResult`], not faults. The run continues regardless of
//! what any single URL does.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, LAST_MODIFIED};
use reqwest::{Client, Response};
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use linkaudit_shared::{LinkAuditError, ProbeResult, ProbeStatus, Result};

/// User-Agent string for probe requests.
const USER_AGENT: &str = concat!("linkaudit/", env!("CARGO_PKG_VERSION"));

/// How many characters of an HTML body are scanned for auth-wall markers
/// and handed to year extraction.
const MAX_SCAN_CHARS: usize = 10_000;

/// Marker phrases indicating a page wants authentication before showing
/// real content (campus SSO, survey platforms, etc.). Matched
/// case-insensitively.
const AUTH_WALL_MARKERS: [&str; 5] = [
    "sign in",
    "single sign-on",
    "access denied",
    "please authenticate",
    "shibboleth",
];

// ---------------------------------------------------------------------------
// ProbeOutcome
// ---------------------------------------------------------------------------

/// A [`ProbeResult`] plus the scanned body slice, kept out of the result
/// record so downstream year extraction can read page text without the
/// report carrying it.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    /// The immutable probe record.
    pub result: ProbeResult,
    /// First [`MAX_SCAN_CHARS`] characters of the HTML body, when the
    /// response was alive HTML. `None` for non-HTML, dead, or bodyless
    /// responses.
    pub body_excerpt: Option<String>,
}

// ---------------------------------------------------------------------------
// Prober
// ---------------------------------------------------------------------------

/// Reachability prober holding a reused HTTP session.
pub struct Prober {
    client: Client,
}

impl Prober {
    /// Create a prober with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| LinkAuditError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Probe a single URL.
    ///
    /// Issues HEAD first; falls back to GET when the server rejects or
    /// mishandles HEAD (status >= 400 or missing Content-Type), and
    /// retries once via GET on network-level failure. A final failure
    /// becomes an error-marker status with `is_alive = false`.
    #[instrument(skip(self))]
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        let (response, via_get) = match self.head_then_get(url).await {
            Ok(pair) => pair,
            Err(marker) => {
                debug!(%url, %marker, "probe failed at network level");
                return ProbeOutcome {
                    result: ProbeResult {
                        original_url: url.to_string(),
                        final_url: url.to_string(),
                        status: ProbeStatus::Failed(marker),
                        content_type: String::new(),
                        last_modified: String::new(),
                        is_alive: false,
                        auth_wall: false,
                        html_title: String::new(),
                    },
                    body_excerpt: None,
                };
            }
        };

        let status = ProbeStatus::Http(response.status().as_u16());
        let is_alive = status.is_alive();
        let final_url = response.url().to_string();
        let content_type = header_value(&response, CONTENT_TYPE.as_str());
        let last_modified = header_value(&response, LAST_MODIFIED.as_str());

        let mut result = ProbeResult {
            original_url: url.to_string(),
            final_url: final_url.clone(),
            status,
            content_type: content_type.clone(),
            last_modified,
            is_alive,
            auth_wall: false,
            html_title: String::new(),
        };

        // Auth-wall and title detection apply to alive HTML only.
        if !is_alive || !content_type.to_ascii_lowercase().contains("html") {
            return ProbeOutcome {
                result,
                body_excerpt: None,
            };
        }

        // HEAD responses carry no body; fetch one so detection can run.
        let body = if via_get {
            response.text().await.unwrap_or_default()
        } else {
            match self.client.get(&final_url).send().await {
                Ok(resp) => resp.text().await.unwrap_or_default(),
                Err(e) => {
                    debug!(%final_url, error = %e, "body fetch failed, skipping content checks");
                    String::new()
                }
            }
        };

        let excerpt: String = body.chars().take(MAX_SCAN_CHARS).collect();
        result.auth_wall = looks_like_auth_wall(&excerpt);
        result.html_title = title_and_heading(&excerpt);

        ProbeOutcome {
            result,
            body_excerpt: Some(excerpt),
        }
    }

    /// HEAD with redirect-following, falling back to GET when HEAD is
    /// rejected, inconclusive, or fails outright.
    ///
    /// The boolean is true when the winning request was a GET (so its
    /// body may be read). The error case carries a short marker string
    /// for the report.
    async fn head_then_get(&self, url: &str) -> std::result::Result<(Response, bool), String> {
        match self.client.head(url).send().await {
            Ok(head) => {
                let inconclusive =
                    head.status().as_u16() >= 400 || head.headers().get(CONTENT_TYPE).is_none();
                if !inconclusive {
                    return Ok((head, false));
                }
                debug!(%url, status = head.status().as_u16(), "HEAD inconclusive, retrying with GET");
                self.get_fallback(url).await
            }
            Err(e) => {
                debug!(%url, error = %e, "HEAD failed, retrying with GET");
                self.get_fallback(url).await
            }
        }
    }

    async fn get_fallback(&self, url: &str) -> std::result::Result<(Response, bool), String> {
        self.client
            .get(url)
            .send()
            .await
            .map(|response| (response, true))
            .map_err(|e| e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Content heuristics
// ---------------------------------------------------------------------------

/// Coarse auth-wall detector for SSO portals, survey platforms, etc.
fn looks_like_auth_wall(html: &str) -> bool {
    if html.is_empty() {
        return false;
    }
    let lowered = html.to_lowercase();
    AUTH_WALL_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Extract the page `<title>` and the first non-empty `<h1>` text,
/// joined by `" | "` with duplicates removed (first occurrence wins).
fn title_and_heading(html: &str) -> String {
    let doc = Html::parse_document(html);

    let title_sel = Selector::parse("title").expect("title selector");
    let title = doc
        .select(&title_sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let h1_sel = Selector::parse("h1").expect("h1 selector");
    let heading = doc
        .select(&h1_sel)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|t| !t.is_empty())
        .unwrap_or_default();

    let mut parts: Vec<String> = Vec::new();
    for part in [title, heading] {
        if !part.is_empty() && !parts.contains(&part) {
            parts.push(part);
        }
    }
    parts.join(" | ")
}

fn header_value(response: &Response, name: &str) -> String {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Extract all anchor hrefs from an HTML fragment, resolved against the
/// base URL. Best-effort: anchors, `javascript:`, and `mailto:` links are
/// skipped and fragments stripped.
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    let doc = Html::parse_document(html);
    let link_sel = Selector::parse("a[href]").expect("anchor selector");
    let mut links = Vec::new();

    for el in doc.select(&link_sel) {
        if let Some(href) = el.value().attr("href") {
            if href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
            {
                continue;
            }

            if let Ok(mut resolved) = base_url.join(href) {
                resolved.set_fragment(None);
                links.push(resolved.to_string());
            }
        }
    }

    links
}
