//! Core domain types for link auditing.

use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for audit run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// TrackedLink
// ---------------------------------------------------------------------------

/// One registry entry: a published URL under a named category. Immutable input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedLink {
    /// Category the link is published under.
    pub category: String,
    /// The published URL.
    pub url: String,
}

// ---------------------------------------------------------------------------
// ProbeStatus / ProbeResult
// ---------------------------------------------------------------------------

/// Terminal status of a probe: a numeric HTTP status, or an error marker
/// when the request never produced a response (DNS, connect, timeout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Final HTTP status code after redirects.
    Http(u16),
    /// Network-level failure; the string is a short diagnostic marker.
    Failed(String),
}

impl ProbeStatus {
    /// The numeric status code, if the request produced a response.
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Http(code) => Some(*code),
            Self::Failed(_) => None,
        }
    }

    /// A link is alive iff its final numeric status is in [200, 400).
    pub fn is_alive(&self) -> bool {
        matches!(self, Self::Http(code) if (200..400).contains(code))
    }
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(code) => write!(f, "{code}"),
            Self::Failed(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// Everything learned from probing one URL. Produced once, never mutated.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// The URL as tracked in the registry.
    pub original_url: String,
    /// URL after redirect-following; equals `original_url` on failure.
    pub final_url: String,
    /// Final HTTP status or error marker.
    pub status: ProbeStatus,
    /// Content-Type header value, empty if absent.
    pub content_type: String,
    /// Last-Modified header value, empty if absent.
    pub last_modified: String,
    /// Whether the final status was in [200, 400).
    pub is_alive: bool,
    /// Whether the page body matched an auth-wall marker phrase.
    pub auth_wall: bool,
    /// Page title and first heading, joined by " | "; empty if neither present.
    pub html_title: String,
}

// ---------------------------------------------------------------------------
// YearRange / FiscalCycle
// ---------------------------------------------------------------------------

/// A detected year span, e.g. 2024–2025. Both bounds are 4-digit years
/// and `end_year >= start_year`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start_year: i32,
    pub end_year: i32,
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start_year, self.end_year)
    }
}

/// The institution's fiscal cycle: July 1 of `start_year` through
/// June 30 of `end_year`, where `end_year = start_year + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiscalCycle {
    pub start_year: i32,
    pub end_year: i32,
}

impl FiscalCycle {
    /// Build a cycle from its starting year.
    pub fn from_start(start_year: i32) -> Self {
        Self {
            start_year,
            end_year: start_year + 1,
        }
    }
}

impl std::fmt::Display for FiscalCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start_year, self.end_year)
    }
}

// ---------------------------------------------------------------------------
// FreshnessLabel
// ---------------------------------------------------------------------------

/// Verdict from comparing a detected year range to the expected cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreshnessLabel {
    /// Detected range equals the expected cycle exactly.
    Current,
    /// A range was detected but does not match the expected cycle.
    Outdated,
    /// No range detected, or the detected string failed to parse.
    Unknown,
}

impl std::fmt::Display for FreshnessLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Current => "current",
            Self::Outdated => "outdated",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A scored replacement candidate returned by the search capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Candidate URL.
    pub url: String,
    /// Deterministic additive score (higher is better).
    pub score: u32,
}

// ---------------------------------------------------------------------------
// ReportRow
// ---------------------------------------------------------------------------

/// One report record per tracked link per run. Field order is the output
/// column contract; booleans serialize as `yes`/`no`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub category: String,
    pub original_url: String,
    pub final_url: String,
    pub status_code: String,
    #[serde(serialize_with = "yes_no")]
    pub is_alive: bool,
    #[serde(serialize_with = "yes_no")]
    pub auth_wall: bool,
    pub content_type: String,
    pub last_modified: String,
    pub html_title: String,
    pub detected_year: String,
    pub expected_year: String,
    pub freshness: FreshnessLabel,
    pub suggested_replacement: String,
    pub suggestion_reason: String,
}

fn yes_no<S: Serializer>(value: &bool, ser: S) -> std::result::Result<S::Ok, S::Error> {
    ser.serialize_str(if *value { "yes" } else { "no" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_roundtrip() {
        let id = RunId::new();
        let s = id.to_string();
        let parsed: RunId = s.parse().expect("parse RunId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn probe_status_display() {
        assert_eq!(ProbeStatus::Http(200).to_string(), "200");
        assert_eq!(
            ProbeStatus::Failed("connect timeout".into()).to_string(),
            "error: connect timeout"
        );
    }

    #[test]
    fn probe_status_liveness_bounds() {
        assert!(ProbeStatus::Http(200).is_alive());
        assert!(ProbeStatus::Http(302).is_alive());
        assert!(ProbeStatus::Http(399).is_alive());
        assert!(!ProbeStatus::Http(400).is_alive());
        assert!(!ProbeStatus::Http(404).is_alive());
        assert!(!ProbeStatus::Failed("dns".into()).is_alive());
    }

    #[test]
    fn year_range_and_cycle_display() {
        let range = YearRange {
            start_year: 2024,
            end_year: 2025,
        };
        assert_eq!(range.to_string(), "2024-2025");

        let cycle = FiscalCycle::from_start(2025);
        assert_eq!(cycle.to_string(), "2025-2026");
        assert_eq!(cycle.end_year, cycle.start_year + 1);
    }

    #[test]
    fn freshness_label_serde_lowercase() {
        let json = serde_json::to_string(&FreshnessLabel::Outdated).expect("serialize");
        assert_eq!(json, "\"outdated\"");
        assert_eq!(FreshnessLabel::Current.to_string(), "current");
    }

    #[test]
    fn report_row_yes_no_booleans() {
        let row = ReportRow {
            category: "Dental care".into(),
            original_url: "https://example.edu/dental".into(),
            final_url: "https://example.edu/dental/".into(),
            status_code: "200".into(),
            is_alive: true,
            auth_wall: false,
            content_type: "text/html".into(),
            last_modified: String::new(),
            html_title: "Dental Services".into(),
            detected_year: String::new(),
            expected_year: "2025-2026".into(),
            freshness: FreshnessLabel::Unknown,
            suggested_replacement: String::new(),
            suggestion_reason: String::new(),
        };

        let json = serde_json::to_string(&row).expect("serialize");
        assert!(json.contains("\"is_alive\":\"yes\""));
        assert!(json.contains("\"auth_wall\":\"no\""));
        assert!(json.contains("\"freshness\":\"unknown\""));
    }
}
