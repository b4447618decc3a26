//! CSV report sink.
//!
//! The freshness report is assembled in memory and written here exactly
//! once per run. Column order comes from the [`ReportRow`] field order —
//! downstream consumers treat the header as a compatibility contract.

use std::path::Path;

use tracing::info;

use linkaudit_shared::{LinkAuditError, ReportRow, Result};

/// Write the full report to `path`, creating parent directories as needed.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| LinkAuditError::io(parent, e))?;
        }
    }

    let mut writer =
        csv::Writer::from_path(path).map_err(|e| LinkAuditError::Report(e.to_string()))?;

    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| LinkAuditError::Report(e.to_string()))?;
    }

    writer
        .flush()
        .map_err(|e| LinkAuditError::Report(e.to_string()))?;

    info!(path = %path.display(), rows = rows.len(), "report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkaudit_shared::FreshnessLabel;
    use uuid::Uuid;

    fn sample_row(url: &str, freshness: FreshnessLabel) -> ReportRow {
        ReportRow {
            category: "Conference Travel".into(),
            original_url: url.into(),
            final_url: url.into(),
            status_code: "200".into(),
            is_alive: true,
            auth_wall: false,
            content_type: "application/pdf".into(),
            last_modified: String::new(),
            html_title: String::new(),
            detected_year: "2024-2025".into(),
            expected_year: "2025-2026".into(),
            freshness,
            suggested_replacement: String::new(),
            suggestion_reason: String::new(),
        }
    }

    #[test]
    fn report_has_contract_header_and_row_order() {
        let dir = std::env::temp_dir().join(format!("linkaudit-report-{}", Uuid::now_v7()));
        let path = dir.join("report.csv");

        let rows = vec![
            sample_row("https://example.edu/first.pdf", FreshnessLabel::Outdated),
            sample_row("https://example.edu/second.pdf", FreshnessLabel::Current),
        ];
        write_report(&path, &rows).expect("write report");

        let content = std::fs::read_to_string(&path).expect("read back");
        let mut lines = content.lines();

        assert_eq!(
            lines.next().expect("header"),
            "category,original_url,final_url,status_code,is_alive,auth_wall,\
             content_type,last_modified,html_title,detected_year,expected_year,\
             freshness,suggested_replacement,suggestion_reason"
        );

        let first = lines.next().expect("first row");
        assert!(first.contains("https://example.edu/first.pdf"));
        assert!(first.contains(",yes,no,"));
        assert!(first.contains("outdated"));

        let second = lines.next().expect("second row");
        assert!(second.contains("https://example.edu/second.pdf"));
        assert!(second.contains("current"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_run_still_writes_header() {
        let dir = std::env::temp_dir().join(format!("linkaudit-report-{}", Uuid::now_v7()));
        let path = dir.join("empty.csv");

        write_report(&path, &[]).expect("write report");

        let content = std::fs::read_to_string(&path).expect("read back");
        assert!(content.is_empty() || content.starts_with("category"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
