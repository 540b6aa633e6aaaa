//! Report rendering
//!
//! Turns reconciliation records into the fixed-width text table written to
//! the audit log, plus an optional JSON document.

use crate::align::AlignmentSummary;
use crate::reconcile::{ReconciliationRecord, RowCount};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

const HEADERS: [&str; 6] = ["#", "Left table", "Left rows", "Right table", "Right rows", "Delta"];
const ABSENT: &str = "-";
const ERROR_MARKER: &str = "ERROR";

/// Summary statistics for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_pairs: usize,
    #[serde(flatten)]
    pub alignment: AlignmentSummary,
    /// Matched pairs whose counts differ
    pub mismatched: usize,
    /// Records with at least one failed count
    pub failed: usize,
}

impl ReportSummary {
    pub fn from_records(records: &[ReconciliationRecord]) -> Self {
        let mut summary = Self {
            total_pairs: records.len(),
            ..Default::default()
        };

        for record in records {
            match (&record.left_table, &record.right_table) {
                (Some(_), Some(_)) => {
                    summary.alignment.matched += 1;
                    if !record.is_consistent() && !record.has_error() {
                        summary.mismatched += 1;
                    }
                }
                (Some(_), None) => summary.alignment.left_only += 1,
                (None, _) => summary.alignment.right_only += 1,
            }
            if record.has_error() {
                summary.failed += 1;
            }
        }

        summary
    }
}

/// Complete reconciliation report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub generated_at: DateTime<Utc>,
    /// Masked descriptor of the left engine
    pub left_source: String,
    /// Masked descriptor of the right engine
    pub right_source: String,
    pub summary: ReportSummary,
    pub records: Vec<ReconciliationRecord>,
}

impl ReconciliationReport {
    pub fn new(left_source: String, right_source: String, records: Vec<ReconciliationRecord>) -> Self {
        Self {
            generated_at: Utc::now(),
            left_source,
            right_source,
            summary: ReportSummary::from_records(&records),
            records,
        }
    }

    /// Render the records as a text table
    pub fn render_table(&self) -> String {
        render_table(&self.records)
    }

    pub fn render_summary(&self) -> String {
        let s = &self.summary;
        format!(
            "Pairs: {} | matched: {} | left only: {} | right only: {} | count mismatches: {} | errors: {}",
            s.total_pairs,
            s.alignment.matched,
            s.alignment.left_only,
            s.alignment.right_only,
            s.mismatched,
            s.failed
        )
    }

    /// Per-row error details, one line each
    pub fn render_errors(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for record in &self.records {
            for (table, count) in [
                (&record.left_table, &record.left_count),
                (&record.right_table, &record.right_count),
            ] {
                if let (Some(table), RowCount::Failed(reason)) = (table, count) {
                    lines.push(format!("#{} {}: {}", record.sequence_number, table, reason));
                }
            }
        }
        lines
    }

    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }
}

/// Render records as a fixed-width table.
///
/// Absent tables show `-`, failed counts and their delta show `ERROR`.
pub fn render_table(records: &[ReconciliationRecord]) -> String {
    let rows: Vec<[String; 6]> = records
        .iter()
        .map(|r| {
            [
                r.sequence_number.to_string(),
                r.left_table.clone().unwrap_or_else(|| ABSENT.to_string()),
                r.left_count.to_string(),
                r.right_table.clone().unwrap_or_else(|| ABSENT.to_string()),
                r.right_count.to_string(),
                r.delta.map(|d| d.to_string()).unwrap_or_else(|| ERROR_MARKER.to_string()),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(String::from), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let rendered: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            let pad = width.saturating_sub(cell.chars().count());
            // Numeric columns are right-aligned
            if matches!(i, 0 | 2 | 4 | 5) {
                format!("{}{}", " ".repeat(pad), cell)
            } else {
                format!("{}{}", cell, " ".repeat(pad))
            }
        })
        .collect();
    let _ = writeln!(out, "{}", rendered.join(" | ").trim_end());
}
