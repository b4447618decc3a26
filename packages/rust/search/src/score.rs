//! Deterministic scoring and ranking of replacement candidates.
//!
//! The pool is a set keyed by URL string, so discovery order never
//! influences the outcome. Ranking is (score descending, URL ascending);
//! the secondary key makes repeated runs over the same pool reproducible
//! even when scores tie.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use linkaudit_shared::Candidate;
use regex::Regex;
use url::Url;

/// A year-like token anywhere in the URL suggests a cycle-specific document.
static YEAR_HINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"20\d{2}").expect("year hint regex"));

/// Score a candidate URL against the category's hints.
///
/// Additive: +20 when the host matches the primary authoritative domain,
/// +10 when the path ends with the expected extension, +10 per expected
/// phrase found in the URL, +5 for a `20xx` token.
pub fn score_candidate(
    url: &str,
    primary_domain: Option<&str>,
    expected_phrases: &[String],
    expected_ext: Option<&str>,
) -> u32 {
    let mut score = 0;
    let parsed = Url::parse(url).ok();

    if let (Some(domain), Some(parsed)) = (primary_domain, parsed.as_ref()) {
        let host = parsed.host_str().unwrap_or_default().to_lowercase();
        if !domain.is_empty() && host.contains(&domain.to_lowercase()) {
            score += 20;
        }
    }

    if let (Some(ext), Some(parsed)) = (expected_ext, parsed.as_ref()) {
        let suffix = format!(".{}", ext.trim_start_matches('.').to_lowercase());
        if parsed.path().to_lowercase().ends_with(&suffix) {
            score += 10;
        }
    }

    let lowered = url.to_lowercase();
    for phrase in expected_phrases {
        if !phrase.is_empty() && lowered.contains(&phrase.to_lowercase()) {
            score += 10;
        }
    }

    if YEAR_HINT_RE.is_match(url) {
        score += 5;
    }

    score
}

/// Rank a deduplicated candidate pool, best first.
///
/// Sort key: score descending, then URL ascending. The tie-break is an
/// invariant — callers may rely on identical output for identical pools.
pub fn rank_candidates(
    pool: &BTreeSet<String>,
    primary_domain: Option<&str>,
    expected_phrases: &[String],
    expected_ext: Option<&str>,
) -> Vec<Candidate> {
    let mut ranked: Vec<Candidate> = pool
        .iter()
        .map(|url| Candidate {
            url: url.clone(),
            score: score_candidate(url, primary_domain, expected_phrases, expected_ext),
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.url.cmp(&b.url)));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrases(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn full_score_is_45() {
        let url = "https://studentgov.example.edu/CRT-Spending-Policy-2024.pdf";
        let score = score_candidate(
            url,
            Some("studentgov.example.edu"),
            &phrases(&["CRT"]),
            Some("pdf"),
        );
        assert_eq!(score, 20 + 10 + 10 + 5);
    }

    #[test]
    fn score_independent_of_phrase_order() {
        let url = "https://studentgov.example.edu/CRT-Spending-Policy-2024.pdf";
        let a = score_candidate(url, None, &phrases(&["CRT", "Spending"]), None);
        let b = score_candidate(url, None, &phrases(&["Spending", "CRT"]), None);
        assert_eq!(a, b);
        assert_eq!(a, 10 + 10 + 5);
    }

    #[test]
    fn extension_match_is_case_insensitive_and_dot_optional() {
        let url = "https://example.edu/policy.PDF";
        assert_eq!(score_candidate(url, None, &[], Some("pdf")), 10);
        assert_eq!(score_candidate(url, None, &[], Some(".pdf")), 10);
        assert_eq!(score_candidate(url, None, &[], Some("docx")), 0);
    }

    #[test]
    fn ranking_is_deterministic_with_url_tiebreak() {
        let mut pool = BTreeSet::new();
        // Same score; must come back URL-ascending
        pool.insert("https://example.edu/b".to_string());
        pool.insert("https://example.edu/a".to_string());

        let first = rank_candidates(&pool, None, &[], None);
        let second = rank_candidates(&pool, None, &[], None);
        assert_eq!(first, second);
        assert_eq!(first[0].url, "https://example.edu/a");
        assert_eq!(first[1].url, "https://example.edu/b");
    }

    #[test]
    fn higher_score_outranks_lexicographic_order() {
        let mut pool = BTreeSet::new();
        pool.insert("https://aaa.example.com/misc".to_string());
        pool.insert("https://studentgov.example.edu/policy-2024.pdf".to_string());

        let ranked = rank_candidates(
            &pool,
            Some("studentgov.example.edu"),
            &phrases(&["policy"]),
            Some("pdf"),
        );
        assert_eq!(
            ranked[0].url,
            "https://studentgov.example.edu/policy-2024.pdf"
        );
        assert_eq!(ranked[0].score, 45);
        assert_eq!(ranked[1].score, 0);
    }

    #[test]
    fn empty_pool_ranks_empty() {
        let pool = BTreeSet::new();
        assert!(rank_candidates(&pool, None, &[], None).is_empty());
    }
}
