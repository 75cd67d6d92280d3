mod common;

use common::{categorical, harness, harness_with, settings, RecordingCollector};
use serde_json::{json, Map};
use tabtrack_core::EventKind;
use tabtrack_infra::TransportError;
use tabtrack_pipeline::DeliveryReport;

#[tokio::test]
async fn each_event_travels_as_a_batch_of_one() {
    let mut h = harness();
    h.emitter.emit(EventKind::Noop, Map::new()).unwrap().await.unwrap();
    h.emitter
        .emit_filter_change(&categorical("Sheet1", "Region", &["East"]))
        .unwrap()
        .await
        .unwrap();

    let batches = h.collector.batches.lock().unwrap().clone();
    assert_eq!(batches.len(), 2);
    assert!(batches.iter().all(|b| b.events.len() == 1));
    assert_eq!(
        h.reports.recv().await,
        Some(DeliveryReport::Delivered {
            sequence: "1".into()
        })
    );
}

#[tokio::test]
async fn filter_change_payload_is_enriched() {
    let h = harness();
    h.emitter
        .emit_filter_change(&categorical("Sheet1", "Region", &["East"]))
        .unwrap()
        .await
        .unwrap();

    let ev = &h.collector.events()[0];
    assert_eq!(ev.kind, EventKind::FilterChange);
    assert_eq!(ev.data["fieldName"], json!("Region"));
    assert_eq!(ev.data["worksheetName"], json!("Sheet1"));
    assert_eq!(ev.data["filterType"], json!("categorical"));
    assert_eq!(ev.data["appliedValues"], json!(["East"]));
    assert!(ev.data.get("window").is_some());
    assert!(ev.data.get("document").is_some());
    assert!(ev.data.get("settings").is_some());
}

#[tokio::test]
async fn selection_change_carries_marks() {
    let h = harness();
    h.emitter
        .emit_selection_change("Sheet2", &[json!({"Region": "East"})])
        .unwrap()
        .await
        .unwrap();

    let ev = &h.collector.events()[0];
    assert_eq!(ev.kind, EventKind::SelectionChange);
    assert_eq!(ev.data["worksheetName"], json!("Sheet2"));
    assert_eq!(ev.data["selectedMarks"], json!([{"Region": "East"}]));
}

#[tokio::test]
async fn transport_failure_is_reported_not_raised() {
    let mut h = harness_with(
        RecordingCollector::failing(),
        settings(Some("D1"), Some("Book")),
    );

    let handle = h.emitter.emit(EventKind::Noop, Map::new()).unwrap();
    handle.await.unwrap();

    assert_eq!(
        h.reports.recv().await,
        Some(DeliveryReport::Failed {
            sequence: "1".into(),
            error: TransportError::Status(503),
        })
    );

    // Production continues after a failure.
    h.emitter.emit(EventKind::Noop, Map::new()).unwrap().await.unwrap();
    assert_eq!(h.collector.events().len(), 2);
}

#[tokio::test]
async fn invalid_event_is_never_sent() {
    let h = harness_with(RecordingCollector::default(), settings(Some("D1"), None));
    assert!(h.emitter.emit(EventKind::Noop, Map::new()).is_err());
    tokio::task::yield_now().await;
    assert!(h.collector.batches.lock().unwrap().is_empty());
}
