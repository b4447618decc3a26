//! Application configuration for linkaudit.
//!
//! User config lives at `~/.linkaudit/linkaudit.toml`.
//! CLI flags override config file values, which override defaults.
//!
//! The link registry is an ordered `[[categories]]` array — report rows
//! are emitted in exactly this order.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LinkAuditError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "linkaudit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".linkaudit";

// ---------------------------------------------------------------------------
// Config structs (matching linkaudit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Search provider settings.
    #[serde(default)]
    pub search: SearchProviderConfig,

    /// The link registry: ordered categories of tracked URLs.
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Per-probe timeout in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Per-search-call timeout in seconds.
    #[serde(default = "default_search_timeout_secs")]
    pub search_timeout_secs: u64,

    /// Courtesy delay after each probe, in milliseconds.
    #[serde(default = "default_probe_delay_ms")]
    pub probe_delay_ms: u64,

    /// Courtesy delay after each search call, in milliseconds.
    #[serde(default = "default_search_delay_ms")]
    pub search_delay_ms: u64,

    /// Result pages (of 10) fetched per search query.
    #[serde(default = "default_search_pages")]
    pub search_pages: u32,

    /// Output path for the freshness report.
    #[serde(default = "default_report_path")]
    pub report_path: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout_secs(),
            search_timeout_secs: default_search_timeout_secs(),
            probe_delay_ms: default_probe_delay_ms(),
            search_delay_ms: default_search_delay_ms(),
            search_pages: default_search_pages(),
            report_path: default_report_path(),
        }
    }
}

fn default_probe_timeout_secs() -> u64 {
    25
}
fn default_search_timeout_secs() -> u64 {
    20
}
fn default_probe_delay_ms() -> u64 {
    200
}
fn default_search_delay_ms() -> u64 {
    300
}
fn default_search_pages() -> u32 {
    3
}
fn default_report_path() -> String {
    "link_audit_report.csv".into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchProviderConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Name of the env var holding the custom search engine id.
    #[serde(default = "default_engine_id_env")]
    pub engine_id_env: String,
}

impl Default for SearchProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            engine_id_env: default_engine_id_env(),
        }
    }
}

fn default_api_key_env() -> String {
    "LINKAUDIT_SEARCH_API_KEY".into()
}
fn default_engine_id_env() -> String {
    "LINKAUDIT_SEARCH_ENGINE_ID".into()
}

/// `[[categories]]` entry — one registry category with its tracked URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Human-readable category name.
    pub name: String,
    /// Tracked URLs, in publication order.
    pub urls: Vec<String>,
    /// Replacement-discovery hints; categories without hints are audited
    /// but never searched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<SearchHints>,
}

/// `[categories.hints]` — how to search for a replacement link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHints {
    /// Hosts to scope search queries to (`site:` filters).
    #[serde(default)]
    pub site_filters: Vec<String>,

    /// Phrases expected in a good replacement URL.
    #[serde(default)]
    pub expected_phrases: Vec<String>,

    /// Expected file extension of the target document (e.g. "pdf").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_ext: Option<String>,

    /// The authoritative host for this category; candidates on it score
    /// highest. Falls back to the first site filter when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_domain: Option<String>,
}

impl SearchHints {
    /// The domain that earns the authoritative-source scoring bonus.
    pub fn primary_domain(&self) -> Option<&str> {
        self.primary_domain
            .as_deref()
            .or_else(|| self.site_filters.first().map(String::as_str))
    }
}

// ---------------------------------------------------------------------------
// Audit options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime audit options — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Per-probe timeout.
    pub probe_timeout: Duration,
    /// Per-search-call timeout.
    pub search_timeout: Duration,
    /// Courtesy delay after each probe.
    pub probe_delay: Duration,
    /// Courtesy delay after each search call.
    pub search_delay: Duration,
    /// Result pages (of 10) fetched per search query.
    pub search_pages: u32,
}

impl From<&AppConfig> for AuditOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            probe_timeout: Duration::from_secs(config.defaults.probe_timeout_secs),
            search_timeout: Duration::from_secs(config.defaults.search_timeout_secs),
            probe_delay: Duration::from_millis(config.defaults.probe_delay_ms),
            search_delay: Duration::from_millis(config.defaults.search_delay_ms),
            search_pages: config.defaults.search_pages,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.linkaudit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LinkAuditError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.linkaudit/linkaudit.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LinkAuditError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| LinkAuditError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LinkAuditError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LinkAuditError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LinkAuditError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Validate the registry before a run. Malformed registries are the one
/// fatal startup condition — everything later is per-link fail-open.
pub fn validate_registry(config: &AppConfig) -> Result<()> {
    if config.categories.is_empty() {
        return Err(LinkAuditError::validation(
            "registry is empty: add at least one [[categories]] entry",
        ));
    }

    for category in &config.categories {
        if category.name.trim().is_empty() {
            return Err(LinkAuditError::validation(
                "registry contains a category with an empty name",
            ));
        }
        if category.urls.is_empty() {
            return Err(LinkAuditError::validation(format!(
                "category '{}' has no URLs",
                category.name
            )));
        }
        for url in &category.urls {
            Url::parse(url).map_err(|e| {
                LinkAuditError::validation(format!(
                    "category '{}' has invalid URL '{url}': {e}",
                    category.name
                ))
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("probe_timeout_secs"));
        assert!(toml_str.contains("LINKAUDIT_SEARCH_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.probe_timeout_secs, 25);
        assert_eq!(parsed.defaults.search_pages, 3);
        assert_eq!(parsed.search.api_key_env, "LINKAUDIT_SEARCH_API_KEY");
    }

    #[test]
    fn config_with_categories() {
        let toml_str = r#"
[[categories]]
name = "Conference Registration and Travel"
urls = [
  "https://example.edu/crt-policy-24-25.pdf",
  "https://example.edu/crt-form",
]

[categories.hints]
site_filters = ["studentgov.example.edu"]
expected_phrases = ["CRT", "Spending Policy"]
expected_ext = "pdf"

[[categories]]
name = "Dental care"
urls = ["https://health.example.edu/dental/"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.categories.len(), 2);

        let crt = &config.categories[0];
        assert_eq!(crt.urls.len(), 2);
        let hints = crt.hints.as_ref().expect("hints");
        assert_eq!(hints.expected_ext.as_deref(), Some("pdf"));
        // No explicit primary_domain → first site filter wins
        assert_eq!(hints.primary_domain(), Some("studentgov.example.edu"));

        assert!(config.categories[1].hints.is_none());
    }

    #[test]
    fn audit_options_from_app_config() {
        let app = AppConfig::default();
        let opts = AuditOptions::from(&app);
        assert_eq!(opts.probe_timeout, Duration::from_secs(25));
        assert_eq!(opts.search_timeout, Duration::from_secs(20));
        assert_eq!(opts.probe_delay, Duration::from_millis(200));
        assert_eq!(opts.search_delay, Duration::from_millis(300));
    }

    #[test]
    fn registry_validation_rejects_empty_and_malformed() {
        let empty = AppConfig::default();
        assert!(validate_registry(&empty).is_err());

        let no_urls: AppConfig = toml::from_str(
            r#"
[[categories]]
name = "Orphan"
urls = []
"#,
        )
        .expect("parse");
        assert!(validate_registry(&no_urls).is_err());

        let bad_url: AppConfig = toml::from_str(
            r#"
[[categories]]
name = "Broken"
urls = ["not a url"]
"#,
        )
        .expect("parse");
        let err = validate_registry(&bad_url).unwrap_err();
        assert!(err.to_string().contains("invalid URL"));

        let ok: AppConfig = toml::from_str(
            r#"
[[categories]]
name = "Fine"
urls = ["https://example.edu/"]
"#,
        )
        .expect("parse");
        assert!(validate_registry(&ok).is_ok());
    }
}
