//! Contract tests: report rendering
//!
//! The renderer is pure: same history + same meta must produce identical
//! bytes, rows come out newest-first, and the STRANGE flag follows the
//! display threshold (independent of the persisted gap threshold).

use ipwatch_core::report::{ReportMeta, render_report, write_report};
use ipwatch_core::store::HistoryStore;

const REPORT_GAP_THRESHOLD_SECS: f64 = 90.0;

fn meta() -> ReportMeta {
    ReportMeta {
        version: "0.1.0".to_string(),
        generated_at: 5000.0,
    }
}

fn populated_store() -> HistoryStore {
    let store = HistoryStore::open_in_memory().unwrap();
    let first = store.insert_period("1.2.3.4".parse().unwrap(), 1000.0).unwrap();
    store.touch_period(first, 1200.0).unwrap();
    // 30s after the previous period ended: below the display threshold
    store.insert_period("5.6.7.8".parse().unwrap(), 1230.0).unwrap();
    store
}

#[test]
fn rendering_twice_is_byte_identical() {
    let store = populated_store();
    store.insert_gap(1000.0, 1300.0, Some("no successful sample for 300.0s")).unwrap();
    store.insert_error(1500.0, "all endpoints failed").unwrap();

    let meta = meta();
    let first = render_report(&store, REPORT_GAP_THRESHOLD_SECS, &meta).unwrap();
    let second = render_report(&store, REPORT_GAP_THRESHOLD_SECS, &meta).unwrap();
    assert_eq!(first, second);
}

#[test]
fn periods_are_emitted_newest_first() {
    let store = populated_store();
    let html = render_report(&store, REPORT_GAP_THRESHOLD_SECS, &meta()).unwrap();

    let newer = html.find("5.6.7.8").expect("newer period present");
    let older = html.find("1.2.3.4").expect("older period present");
    assert!(newer < older, "newest period must come first");
}

#[test]
fn small_gap_is_ok_large_gap_is_strange() {
    let store = HistoryStore::open_in_memory().unwrap();
    let first = store.insert_period("1.2.3.4".parse().unwrap(), 1000.0).unwrap();
    store.touch_period(first, 1100.0).unwrap();
    // 30s to the next period start: ok
    store.insert_period("5.6.7.8".parse().unwrap(), 1130.0).unwrap();

    let html = render_report(&store, REPORT_GAP_THRESHOLD_SECS, &meta()).unwrap();
    assert!(html.contains("<td>ok</td>"));
    assert!(!html.contains("STRANGE"));

    // 120s to the next period start: at/above the 90s display threshold
    let store = HistoryStore::open_in_memory().unwrap();
    let first = store.insert_period("1.2.3.4".parse().unwrap(), 1000.0).unwrap();
    store.touch_period(first, 1100.0).unwrap();
    store.insert_period("5.6.7.8".parse().unwrap(), 1220.0).unwrap();

    let html = render_report(&store, REPORT_GAP_THRESHOLD_SECS, &meta()).unwrap();
    assert!(html.contains("STRANGE"));
}

#[test]
fn display_threshold_is_independent_of_persisted_gaps() {
    // a 120s pause: flagged STRANGE in the report, but no gap row exists
    let store = HistoryStore::open_in_memory().unwrap();
    let first = store.insert_period("1.2.3.4".parse().unwrap(), 1000.0).unwrap();
    store.touch_period(first, 1100.0).unwrap();
    store.insert_period("5.6.7.8".parse().unwrap(), 1220.0).unwrap();

    assert_eq!(store.count_gaps().unwrap(), 0);
    let html = render_report(&store, REPORT_GAP_THRESHOLD_SECS, &meta()).unwrap();
    assert!(html.contains("STRANGE"));
    assert!(!html.contains("<h2>Gaps"));
}

#[test]
fn repeated_ip_across_periods_is_flagged() {
    let store = HistoryStore::open_in_memory().unwrap();
    store.insert_period("1.2.3.4".parse().unwrap(), 1000.0).unwrap();
    // should not happen under the tick algorithm, but the report surfaces it
    store.insert_period("1.2.3.4".parse().unwrap(), 1060.0).unwrap();

    let html = render_report(&store, REPORT_GAP_THRESHOLD_SECS, &meta()).unwrap();
    assert!(html.contains("SAME IP AS BEFORE"));
}

#[test]
fn empty_history_renders_without_sections() {
    let store = HistoryStore::open_in_memory().unwrap();
    let html = render_report(&store, REPORT_GAP_THRESHOLD_SECS, &meta()).unwrap();

    assert!(html.contains("<table"));
    assert!(!html.contains("<h2>Errors"));
    assert!(!html.contains("<h2>Gaps"));
    assert!(html.contains("Generated by ipwatch version 0.1.0"));
}

#[test]
fn error_and_gap_sections_appear_when_present() {
    let store = populated_store();
    store.insert_error(1500.0, "timed out").unwrap();
    store.insert_gap(1000.0, 1300.0, None).unwrap();

    let html = render_report(&store, REPORT_GAP_THRESHOLD_SECS, &meta()).unwrap();
    assert!(html.contains("<h2>Errors (1)</h2>"));
    assert!(html.contains("<h2>Gaps (1)</h2>"));
    assert!(html.contains("timed out"));
}

#[test]
fn report_is_written_atomically_to_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.html");

    let store = populated_store();
    let html = render_report(&store, REPORT_GAP_THRESHOLD_SECS, &meta()).unwrap();
    write_report(&path, &html).unwrap();

    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert_eq!(on_disk, html);
    // no temp residue
    assert!(!path.with_extension("tmp").exists());
}
