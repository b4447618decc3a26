//! End-to-end audit pipeline: registry → probe → extract → classify →
//! [search] → report.
//!
//! Each tracked link moves through probe, classification, an optional
//! replacement search, and lands as exactly one report row — in registry
//! order, regardless of what fails along the way. The assembled report
//! is written to the sink once, at run completion.

use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use linkaudit_freshness::{classify, current_cycle, extract_year_range};
use linkaudit_probe::{ProbeOutcome, Prober};
use linkaudit_search::SearchClient;
use linkaudit_shared::{
    AppConfig, AuditOptions, FiscalCycle, FreshnessLabel, ReportRow, Result, RunId, SearchHints,
    TrackedLink, validate_registry,
};

/// Everything a run needs, resolved before it starts.
#[derive(Debug)]
pub struct AuditPlan {
    /// Registry, hints, and provider settings.
    pub config: AppConfig,
    /// Timeouts, courtesy delays, pagination depth.
    pub options: AuditOptions,
    /// Where the CSV report lands.
    pub report_path: PathBuf,
    /// Date the expected fiscal cycle is computed from (normally today).
    pub reference_date: NaiveDate,
}

/// Summary of a completed audit run.
#[derive(Debug)]
pub struct AuditResult {
    /// Identifier for this run (appears in logs).
    pub run_id: RunId,
    /// Path the report was written to.
    pub report_path: PathBuf,
    /// Number of tracked links audited (== report rows).
    pub links_checked: usize,
    /// Number of replacement searches attempted.
    pub searches_run: usize,
    /// Number of rows that got a suggested replacement.
    pub suggestions_found: usize,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase or category.
    fn phase(&self, name: &str);
    /// Called before each link is probed.
    fn link_checked(&self, url: &str, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, result: &AuditResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn link_checked(&self, _url: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &AuditResult) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full audit.
///
/// Links are processed strictly sequentially in registry order, with a
/// courtesy delay after every probe. Per-link failures are recorded in
/// the row and never abort the run; only a malformed registry or a
/// report-write failure is fatal.
#[instrument(skip_all, fields(report = %plan.report_path.display()))]
pub async fn run_audit(plan: &AuditPlan, progress: &dyn ProgressReporter) -> Result<AuditResult> {
    let start = Instant::now();
    let run_id = RunId::new();

    validate_registry(&plan.config)?;

    let expected = current_cycle(plan.reference_date);
    let total: usize = plan.config.categories.iter().map(|c| c.urls.len()).sum();

    info!(%run_id, links = total, expected_cycle = %expected, "starting audit run");

    progress.phase("Preparing probe session");
    let prober = Prober::new(plan.options.probe_timeout)?;

    // The search capability initializes once per run. Failure disables
    // every SEARCHED transition and is logged exactly once, here.
    let search = match SearchClient::from_env(
        &plan.config.search,
        plan.options.search_timeout,
        plan.options.search_delay,
    ) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "search provider disabled for this run");
            None
        }
    };

    let mut rows: Vec<ReportRow> = Vec::with_capacity(total);
    let mut searches_run = 0usize;
    let mut suggestions_found = 0usize;

    for category in &plan.config.categories {
        progress.phase(&format!("Checking category: {}", category.name));

        for url in &category.urls {
            progress.link_checked(url, rows.len() + 1, total);

            let link = TrackedLink {
                category: category.name.clone(),
                url: url.clone(),
            };
            let (row, searched) = audit_link(
                &link,
                category.hints.as_ref(),
                &prober,
                search.as_ref(),
                &expected,
                plan.options.search_pages,
            )
            .await;

            searches_run += usize::from(searched);
            suggestions_found += usize::from(!row.suggested_replacement.is_empty());
            rows.push(row);

            // Courtesy delay between link checks — provider policy.
            tokio::time::sleep(plan.options.probe_delay).await;
        }
    }

    progress.phase("Writing report");
    linkaudit_report::write_report(&plan.report_path, &rows)?;

    let result = AuditResult {
        run_id,
        report_path: plan.report_path.clone(),
        links_checked: rows.len(),
        searches_run,
        suggestions_found,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        run_id = %result.run_id,
        links_checked = result.links_checked,
        searches_run = result.searches_run,
        suggestions_found = result.suggestions_found,
        elapsed_ms = result.elapsed.as_millis(),
        "audit run complete"
    );

    Ok(result)
}

/// Audit one tracked link end to end. Returns the finished row and
/// whether a replacement search was attempted.
async fn audit_link(
    link: &TrackedLink,
    hints: Option<&SearchHints>,
    prober: &Prober,
    search: Option<&SearchClient>,
    expected: &FiscalCycle,
    search_pages: u32,
) -> (ReportRow, bool) {
    let ProbeOutcome {
        result: probe,
        body_excerpt,
    } = prober.probe(&link.url).await;

    // Year detection: final URL first, then title, then page text.
    // The URL is consulted even for dead links — a filename like
    // `policy-2020-2021.pdf` still dates the document.
    let detected = extract_year_range(&probe.final_url)
        .or_else(|| extract_year_range(&probe.html_title))
        .or_else(|| body_excerpt.as_deref().and_then(extract_year_range));
    let detected_year = detected.map(|r| r.to_string()).unwrap_or_default();

    let freshness = classify(&detected_year, expected);

    let mut suggested_replacement = String::new();
    let mut suggestion_reason = String::new();
    let mut searched = false;

    if needs_replacement(freshness, probe.is_alive) {
        if let (Some(client), Some(hints)) = (search, hints) {
            searched = true;
            if let Some(candidate) = client
                .find_replacement(&link.category, hints, search_pages)
                .await
            {
                suggested_replacement = candidate.url;
                suggestion_reason = format!(
                    "found higher-scoring candidate via site-scoped search (score {})",
                    candidate.score
                );
            }
        }
    }

    let row = ReportRow {
        category: link.category.clone(),
        original_url: probe.original_url,
        final_url: probe.final_url,
        status_code: probe.status.to_string(),
        is_alive: probe.is_alive,
        auth_wall: probe.auth_wall,
        content_type: probe.content_type,
        last_modified: probe.last_modified,
        html_title: probe.html_title,
        detected_year,
        expected_year: expected.to_string(),
        freshness,
        suggested_replacement,
        suggestion_reason,
    };

    (row, searched)
}

/// A link qualifies for a replacement search when it is stale, undatable,
/// or unreachable. Hints and provider availability gate separately.
fn needs_replacement(freshness: FreshnessLabel, is_alive: bool) -> bool {
    matches!(
        freshness,
        FreshnessLabel::Outdated | FreshnessLabel::Unknown
    ) || !is_alive
}
