use std::fmt::Write;

use clap::ValueEnum;
use serde::Serialize;

use super::store::MetricsSnapshot;

/// Width of the `=` rules around the summary.
const RULE_WIDTH: usize = 50;

/// How the end-of-run summary is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable table.
    #[default]
    Text,
    /// Single pretty-printed JSON document.
    Json,
}

/// Render the summary in the requested format.
pub fn render(snapshot: &MetricsSnapshot, format: ReportFormat) -> String {
    match format {
        ReportFormat::Text => render_text(snapshot),
        ReportFormat::Json => render_json(snapshot),
    }
}

/// Plain-text summary printed on shutdown.
///
/// ```text
/// ==================================================
/// SERVER METRICS
/// ==================================================
/// Total Requests:     5
/// Total Body Size:    3000 bytes (0.00 MB)
/// Average Body Size:  0.59 KB
/// Dropped Bodies:     1 (20.00% of requests)
///
/// Requests by Method:
///   POST     3 (60.0%)
///   GET      2 (40.0%)
/// ==================================================
/// ```
pub fn render_text(s: &MetricsSnapshot) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "SERVER METRICS");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Total Requests:     {}", s.total_requests);
    let _ = writeln!(
        out,
        "Total Body Size:    {} bytes ({:.2} MB)",
        s.total_body_size,
        s.total_body_mb()
    );

    match s.average_body_kb() {
        Some(kb) => {
            let _ = writeln!(out, "Average Body Size:  {kb:.2} KB");
        }
        None => {
            let _ = writeln!(out, "Average Body Size:  0 KB (no request bodies)");
        }
    }

    let _ = write!(out, "Dropped Bodies:     {}", s.dropped_bodies);
    if let Some(pct) = s.drop_percentage() {
        let _ = write!(out, " ({pct:.2}% of requests)");
    }
    let _ = writeln!(out);

    let _ = writeln!(out);
    let _ = writeln!(out, "Requests by Method:");
    for m in &s.methods {
        let _ = writeln!(
            out,
            "  {:<8} {} ({:.1}%)",
            m.method,
            m.count,
            m.percentage_of(s.total_requests)
        );
    }
    let _ = writeln!(out, "{rule}");

    out
}

/// JSON document: the snapshot's own fields plus the derived figures.
#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    counters: &'a MetricsSnapshot,
    total_body_mb: f64,
    average_body_kb: Option<f64>,
    drop_percentage: Option<f64>,
}

/// JSON summary: the raw counters plus the derived figures.
pub fn render_json(s: &MetricsSnapshot) -> String {
    let doc = JsonReport {
        counters: s,
        total_body_mb: s.total_body_mb(),
        average_body_kb: s.average_body_kb(),
        drop_percentage: s.drop_percentage(),
    };

    serde_json::to_string_pretty(&doc).unwrap_or_default()
}
