//! Fiscal-cycle computation and freshness classification.
//!
//! The institution's fiscal year runs July 1 → June 30. A tracked link is
//! "current" when the year range detected in its URL or content matches
//! the cycle containing the reference date, "outdated" when it names any
//! other range, and "unknown" when nothing year-like was found.

mod extract;

use chrono::{Datelike, NaiveDate};
use linkaudit_shared::{FiscalCycle, FreshnessLabel};
use regex::Regex;
use std::sync::LazyLock;

pub use extract::extract_year_range;

/// First month of the fiscal year (July).
const FISCAL_START_MONTH: u32 = 7;

/// Strict `YYYY-YYYY` shape a detected-year string must have to be
/// classified at all.
static CANONICAL_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(20\d{2})\s*[-–/]\s*(20\d{2})\s*$").expect("canonical range regex")
});

/// Compute the fiscal cycle containing `reference`.
///
/// July through December belong to the cycle starting that year; January
/// through June belong to the cycle started the previous year.
pub fn current_cycle(reference: NaiveDate) -> FiscalCycle {
    let start = if reference.month() >= FISCAL_START_MONTH {
        reference.year()
    } else {
        reference.year() - 1
    };
    FiscalCycle::from_start(start)
}

/// Classify a detected-year string against the expected cycle.
///
/// An empty or non-canonical string is `Unknown`; an exact match on both
/// bounds is `Current`; anything else is `Outdated`.
pub fn classify(detected_year: &str, expected: &FiscalCycle) -> FreshnessLabel {
    let Some(caps) = CANONICAL_RANGE_RE.captures(detected_year) else {
        return FreshnessLabel::Unknown;
    };

    // Captures are guaranteed 4-digit by the pattern.
    let start: i32 = caps[1].parse().unwrap_or_default();
    let end: i32 = caps[2].parse().unwrap_or_default();

    if start == expected.start_year && end == expected.end_year {
        FreshnessLabel::Current
    } else {
        FreshnessLabel::Outdated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn cycle_starts_in_july() {
        let cycle = current_cycle(date(2025, 7, 1));
        assert_eq!(cycle, FiscalCycle::from_start(2025));

        let cycle = current_cycle(date(2025, 12, 31));
        assert_eq!(cycle, FiscalCycle::from_start(2025));
    }

    #[test]
    fn cycle_before_july_belongs_to_previous_year() {
        let cycle = current_cycle(date(2025, 6, 30));
        assert_eq!(cycle, FiscalCycle::from_start(2024));

        let cycle = current_cycle(date(2026, 1, 1));
        assert_eq!(cycle, FiscalCycle::from_start(2025));
    }

    #[test]
    fn classify_current_outdated_unknown() {
        let expected = FiscalCycle::from_start(2024);

        assert_eq!(classify("2024-2025", &expected), FreshnessLabel::Current);
        assert_eq!(classify("2023-2024", &expected), FreshnessLabel::Outdated);
        assert_eq!(classify("", &expected), FreshnessLabel::Unknown);
        assert_eq!(classify("next year", &expected), FreshnessLabel::Unknown);
    }

    #[test]
    fn classify_tolerates_whitespace_and_slash() {
        let expected = FiscalCycle::from_start(2024);
        assert_eq!(classify(" 2024/2025 ", &expected), FreshnessLabel::Current);
    }

    #[test]
    fn classify_rejects_partial_matches() {
        // Extra text around the range is not canonical
        let expected = FiscalCycle::from_start(2024);
        assert_eq!(
            classify("policy 2024-2025", &expected),
            FreshnessLabel::Unknown
        );
    }

    #[test]
    fn extraction_feeds_classification() {
        let expected = FiscalCycle::from_start(2025);
        let detected = extract_year_range("https://example.edu/policy-2020-2021.pdf")
            .expect("range detected")
            .to_string();
        assert_eq!(classify(&detected, &expected), FreshnessLabel::Outdated);
    }
}
