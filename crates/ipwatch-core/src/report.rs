//! Static HTML report over the persisted history
//!
//! Pure formatting: the renderer reads the store and assembles a document,
//! it owns no state of its own. Rendering twice over an unchanged store with
//! the same [`ReportMeta`] yields byte-identical output.
//!
//! The period table is computed in a left-to-right scan over the ascending
//! period list (gap-to-previous needs the neighbour), then emitted
//! newest-first. The STRANGE flag here is a display-only heuristic with its
//! own threshold, independent of the store's persisted gap threshold.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{Local, TimeZone};
use tracing::warn;

use crate::error::{Error, Result};
use crate::store::HistoryStore;

/// Inputs that vary between renders of the same history
#[derive(Debug, Clone)]
pub struct ReportMeta {
    /// Version stamped into the footer
    pub version: String,
    /// Generation time, unix seconds
    pub generated_at: f64,
}

/// Render the full report over the store's history
pub fn render_report(
    store: &HistoryStore,
    report_gap_threshold_secs: f64,
    meta: &ReportMeta,
) -> Result<String> {
    let periods = store.list_periods(None)?;
    let gaps = store.list_gaps(None)?;
    let errors = store.list_errors(None)?;

    let mut html = String::new();
    html.push_str("<html><head><title>Public IP History</title></head><body>\n");
    let _ = writeln!(html, "<h1>Generated at: {}</h1>", format_ts(meta.generated_at));

    html.push_str("<table border='1'>\n");
    html.push_str(
        "<tr><th>id</th><th>IP</th><th>Start Time</th><th>End Time</th>\
         <th>Duration</th><th>Gap</th><th>Status</th></tr>\n",
    );

    // oldest-first scan so each row can see its predecessor
    let mut rows_oldest_first = Vec::with_capacity(periods.len());
    let mut previous_last_seen: Option<f64> = None;
    let mut previous_ip = None;
    for period in &periods {
        let (gap, mut status) = match previous_last_seen {
            Some(prev_last) => {
                let gap_secs = period.first_seen - prev_last;
                let status = if gap_secs < report_gap_threshold_secs {
                    "ok".to_string()
                } else {
                    "STRANGE".to_string()
                };
                (human_duration(gap_secs), status)
            }
            // not computable for the first row
            None => ("-".to_string(), "-".to_string()),
        };
        previous_last_seen = Some(period.last_seen);

        // consecutive periods with the same ip should not exist
        if previous_ip == Some(period.ip) {
            warn!("period {} repeats ip {} of its predecessor", period.id, period.ip);
            status.push_str(" SAME IP AS BEFORE");
        }
        previous_ip = Some(period.ip);

        let mut row = String::new();
        let _ = write!(
            row,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            period.id,
            period.ip,
            format_ts(period.first_seen),
            format_ts(period.last_seen),
            human_duration(period.duration_secs()),
            gap,
            status,
        );
        rows_oldest_first.push(row);
    }
    // newest on top
    for row in rows_oldest_first.iter().rev() {
        html.push_str(row);
    }
    html.push_str("</table>\n");

    if !errors.is_empty() {
        let _ = writeln!(html, "<h2>Errors ({})</h2>", errors.len());
        html.push_str("<table border='1'>\n<tr><th>Time</th><th>Error</th></tr>\n");
        for event in &errors {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td></tr>",
                format_ts(event.timestamp),
                escape_html(&event.message),
            );
        }
        html.push_str("</table>\n");
    }

    if !gaps.is_empty() {
        let _ = writeln!(html, "<h2>Gaps ({})</h2>", gaps.len());
        html.push_str(
            "<table border='1'>\n<tr><th>Start</th><th>End</th><th>Length</th><th>Reason</th></tr>\n",
        );
        for gap in &gaps {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                format_ts(gap.start),
                format_ts(gap.end),
                human_duration(gap.end - gap.start),
                escape_html(gap.reason.as_deref().unwrap_or("-")),
            );
        }
        html.push_str("</table>\n");
    }

    let _ = writeln!(
        html,
        "<p>Generated by ipwatch version {}</p></body></html>",
        escape_html(&meta.version)
    );
    Ok(html)
}

/// Write the report atomically: temp file in the target directory, then
/// rename over the destination.
pub fn write_report<P: AsRef<Path>>(path: P, html: &str) -> Result<()> {
    let path = path.as_ref();
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, html)
        .map_err(|e| Error::report(format!("write {}: {}", tmp.display(), e)))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| Error::report(format!("rename {} -> {}: {}", tmp.display(), path.display(), e)))?;
    Ok(())
}

/// Format a unix timestamp in the machine's local timezone
fn format_ts(t: f64) -> String {
    let secs = t.trunc() as i64;
    let nanos = (t.fract() * 1e9) as u32;
    match Local.timestamp_opt(secs, nanos).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
        None => format!("{t:.3}"),
    }
}

/// Humanize a duration in seconds: "45 seconds", "1 minute and 30 seconds",
/// "2 days, 1 hour and 5 minutes"
fn human_duration(secs: f64) -> String {
    let total = secs.round().max(0.0) as u64;
    if total == 0 {
        return "0 seconds".to_string();
    }

    let units = [
        (total / 86_400, "day"),
        (total % 86_400 / 3_600, "hour"),
        (total % 3_600 / 60, "minute"),
        (total % 60, "second"),
    ];
    let parts: Vec<String> = units
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| {
            if *n == 1 {
                format!("1 {unit}")
            } else {
                format!("{n} {unit}s")
            }
        })
        .collect();

    match parts.len() {
        1 => parts[0].clone(),
        n => format!("{} and {}", parts[..n - 1].join(", "), parts[n - 1]),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
