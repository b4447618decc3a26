//! Year-range extraction from free text (URLs, titles, body slices).
//!
//! An ordered cascade of independent patterns, evaluated in priority
//! order. The first pattern that both matches and normalizes cleanly
//! wins; lower-priority patterns are not consulted after that.

use linkaudit_shared::YearRange;
use regex::Regex;
use std::sync::LazyLock;

// ---------------------------------------------------------------------------
// Patterns (compiled once, priority order)
// ---------------------------------------------------------------------------

/// Matches an explicit 4-digit range: `2024-2025`, `2024/2025`.
static FULL_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(20\d{2})\s*[-–/]\s*(20\d{2})\b").expect("full range regex"));

/// Matches a fiscal-year short code: `FY25`, `fy '25`.
static FY_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bFY\s*'?(\d{2})\b").expect("FY code regex"));

/// Matches a bare 4-digit year: `2025`.
static SINGLE_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(20\d{2})\b").expect("single year regex"));

/// Matches a 2-digit range: `24-25`.
static SHORT_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{2})\s*[-–/]\s*(\d{2})\b").expect("short range regex"));

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract a year range from arbitrary text, trying each pattern in
/// priority order.
///
/// Two-value matches are accepted leniently (`end >= start`, not strictly
/// `start + 1`). A single-year match synthesizes `(year, year + 1)` — a
/// best-effort fiscal guess, not a verified range. Returns `None` when no
/// pattern matches.
pub fn extract_year_range(text: &str) -> Option<YearRange> {
    if text.is_empty() {
        return None;
    }

    let patterns: [&Regex; 4] = [&FULL_RANGE_RE, &FY_CODE_RE, &SINGLE_YEAR_RE, &SHORT_RANGE_RE];

    for pattern in patterns {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        // Participating capture groups only (group 0 is the whole match).
        let found: Vec<&str> = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str())
            .collect();
        if let Some(range) = normalize_years(&found) {
            return Some(range);
        }
    }

    None
}

/// Normalize captured year strings into a range.
///
/// 2-digit values are assumed to be 20xx. A pair is rejected when the end
/// precedes the start.
fn normalize_years(found: &[&str]) -> Option<YearRange> {
    match found {
        [start, end] => {
            let start_year = to_four_digit(start)?;
            let end_year = to_four_digit(end)?;
            (end_year >= start_year).then_some(YearRange {
                start_year,
                end_year,
            })
        }
        [year] => {
            let start_year = to_four_digit(year)?;
            Some(YearRange {
                start_year,
                end_year: start_year + 1,
            })
        }
        _ => None,
    }
}

fn to_four_digit(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    Some(if year < 100 { year + 2000 } else { year })
}
