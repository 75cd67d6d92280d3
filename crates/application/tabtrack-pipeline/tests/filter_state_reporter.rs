mod common;

use common::{categorical, harness, TestDashboard};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tabtrack_core::EventKind;
use tabtrack_pipeline::StateReporter;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

const QUIET: Duration = Duration::from_millis(5_000);
const MS: Duration = Duration::from_millis(1);

#[tokio::test(start_paused = true)]
async fn burst_of_triggers_emits_single_state_after_quiet_period() {
    let h = harness();
    let host = Arc::new(TestDashboard::new(&["Sheet1", "Sheet2"]));
    host.set_filters("Sheet1", vec![categorical("Sheet1", "Region", &["East"])]);

    let (reporter, _task) = StateReporter::spawn(
        h.emitter.clone(),
        host.clone(),
        QUIET,
        CancellationToken::new(),
    );

    // Ten triggers between t=0 and t=3600ms.
    for i in 0..10 {
        reporter.trigger();
        if i < 9 {
            sleep(Duration::from_millis(400)).await;
        }
    }

    sleep(QUIET - MS).await;
    assert!(h.collector.events().is_empty(), "window still open");
    assert_eq!(*host.queries.lock().unwrap(), 0, "no query before flush");

    sleep(2 * MS).await;
    let states = h.collector.events_of(EventKind::FilterState);
    assert_eq!(states.len(), 1);
    assert_eq!(
        states[0].data["filterState"],
        json!([{
            "fieldName": "Region",
            "worksheetName": "Sheet1",
            "filterType": "categorical",
            "appliedValues": ["East"]
        }])
    );
    assert_eq!(*host.queries.lock().unwrap(), 2, "one query per worksheet");

    sleep(QUIET * 4).await;
    assert_eq!(h.collector.events().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn snapshot_reflects_state_at_flush_time() {
    let h = harness();
    let host = Arc::new(TestDashboard::new(&["Sheet1"]));
    host.set_filters("Sheet1", vec![categorical("Sheet1", "Region", &["East"])]);

    let (reporter, _task) = StateReporter::spawn(
        h.emitter.clone(),
        host.clone(),
        QUIET,
        CancellationToken::new(),
    );

    reporter.trigger();
    sleep(Duration::from_secs(1)).await;
    host.set_filters("Sheet1", vec![categorical("Sheet1", "Region", &["West"])]);
    sleep(QUIET).await;

    let states = h.collector.events_of(EventKind::FilterState);
    assert_eq!(states.len(), 1);
    assert_eq!(
        states[0].data["filterState"][0]["appliedValues"],
        json!(["West"])
    );
}

#[tokio::test(start_paused = true)]
async fn failed_worksheet_query_drops_the_whole_snapshot() {
    let h = harness();
    let host = Arc::new(TestDashboard::new(&["Sheet1", "Sheet2"]));
    host.set_filters("Sheet1", vec![categorical("Sheet1", "Region", &["East"])]);
    host.failing.lock().unwrap().insert("Sheet2".into());

    let (reporter, _task) = StateReporter::spawn(
        h.emitter.clone(),
        host.clone(),
        QUIET,
        CancellationToken::new(),
    );

    reporter.trigger();
    sleep(QUIET + MS).await;
    assert!(h.collector.events().is_empty());
    assert_eq!(*host.queries.lock().unwrap(), 2);

    // The reporter survives and the next window succeeds.
    host.failing.lock().unwrap().clear();
    reporter.trigger();
    sleep(QUIET + MS).await;
    assert_eq!(h.collector.events_of(EventKind::FilterState).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_worksheet_stalls_snapshot_but_keeps_order() {
    let h = harness();
    let mut dashboard = TestDashboard::new(&["Slow", "Fast"]);
    dashboard
        .delays
        .insert("Slow".into(), Duration::from_secs(3));
    let host = Arc::new(dashboard);
    host.set_filters("Slow", vec![categorical("Slow", "A", &["1"])]);
    host.set_filters("Fast", vec![categorical("Fast", "B", &["2"])]);

    let (reporter, _task) = StateReporter::spawn(
        h.emitter.clone(),
        host.clone(),
        QUIET,
        CancellationToken::new(),
    );

    reporter.trigger();
    sleep(QUIET + Duration::from_secs(2)).await;
    assert!(h.collector.events().is_empty(), "waiting on the slow sheet");

    sleep(Duration::from_secs(2)).await;
    let states = h.collector.events_of(EventKind::FilterState);
    assert_eq!(states.len(), 1);
    let names: Vec<_> = states[0].data["filterState"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["worksheetName"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Slow", "Fast"]);
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_pending_flush() {
    let h = harness();
    let host = Arc::new(TestDashboard::new(&["Sheet1"]));
    let cancel = CancellationToken::new();

    let (reporter, task) =
        StateReporter::spawn(h.emitter.clone(), host.clone(), QUIET, cancel.clone());

    reporter.trigger();
    sleep(Duration::from_secs(1)).await;
    cancel.cancel();
    task.await.unwrap();

    sleep(QUIET * 2).await;
    assert!(h.collector.events().is_empty());
    assert_eq!(*host.queries.lock().unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn triggers_during_snapshot_rearm_one_window_from_its_completion() {
    let h = harness();
    let mut dashboard = TestDashboard::new(&["Slow"]);
    dashboard
        .delays
        .insert("Slow".into(), Duration::from_secs(3));
    let host = Arc::new(dashboard);

    let (reporter, _task) = StateReporter::spawn(
        h.emitter.clone(),
        host.clone(),
        QUIET,
        CancellationToken::new(),
    );

    // Window closes at 5s; the snapshot is in flight until 8s.
    reporter.trigger();
    sleep(Duration::from_secs(6)).await;
    for _ in 0..5 {
        reporter.trigger();
    }

    sleep(Duration::from_secs(1)).await;
    assert_eq!(*host.queries.lock().unwrap(), 1, "no second query in flight");
    assert!(h.collector.events().is_empty());

    sleep(Duration::from_secs(1) + MS).await;
    assert_eq!(h.collector.events_of(EventKind::FilterState).len(), 1);

    // Queued triggers re-arm at 8s: nothing new before 13s.
    sleep(Duration::from_secs(4)).await;
    assert_eq!(*host.queries.lock().unwrap(), 1);
    assert_eq!(h.collector.events_of(EventKind::FilterState).len(), 1);

    // Second snapshot starts at 13s and lands at 16s.
    sleep(Duration::from_secs(5)).await;
    assert_eq!(*host.queries.lock().unwrap(), 2);
    assert_eq!(h.collector.events_of(EventKind::FilterState).len(), 2);
}
