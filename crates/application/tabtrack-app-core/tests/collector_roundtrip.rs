use axum::http::StatusCode;
use axum::{routing::post, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tabtrack_app_core::{DashboardDocument, StaticDashboard, Tracker, TrackerConfig};
use tabtrack_core::HostEvent;
use tabtrack_pipeline::{ExtensionSettings, MemorySettingsStore};

type Received = Arc<Mutex<Vec<Value>>>;

async fn start_collector(prefix: &str) -> (SocketAddr, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().route(
        &format!("{prefix}/tableau-events"),
        post({
            let received = received.clone();
            move |body: String| async move {
                if let Ok(v) = serde_json::from_str(&body) {
                    received.lock().unwrap().push(v);
                }
                StatusCode::OK
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, received)
}

async fn wait_for(received: &Received, n: usize) -> Vec<Value> {
    for _ in 0..200 {
        let got = received.lock().unwrap().clone();
        if got.len() >= n {
            return got;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("collector did not receive {n} batches");
}

#[tokio::test]
async fn session_posts_to_collector_named_by_page_url() {
    let (addr, received) = start_collector("/custom/events").await;
    let page = format!(
        "http://{addr}/ext/index.html?backendUrl=http%3A%2F%2F{addr}%2Fcustom%2Fevents"
    );

    let mut config = TrackerConfig::new(page.parse().unwrap());
    config.quiet_period = Duration::from_millis(100);
    config.heartbeat_period = Duration::from_secs(3600);
    config.referrer = Some("https://portal.example/".into());

    let settings = ExtensionSettings::new(Arc::new(MemorySettingsStore::new()));
    settings.set_deployment_id("D1").unwrap();
    settings.set_workbook_name("Book").unwrap();

    let host = Arc::new(StaticDashboard::new(DashboardDocument {
        name: "Sales".into(),
        worksheets: vec![],
    }));
    let tracker = Tracker::connect(config, settings, host).unwrap();

    let event: HostEvent = serde_json::from_value(json!({
        "type": "filter-changed",
        "filter": {"worksheetName": "Map", "fieldName": "Region", "filterType": "hierarchical"}
    }))
    .unwrap();
    tracker.handle(&event).unwrap();

    let got = wait_for(&received, 2).await;
    let first = &got[0]["events"][0];
    assert_eq!(got[0]["events"].as_array().unwrap().len(), 1);
    assert_eq!(first["kind"], "FILTER_CHANGE");
    assert_eq!(first["data"]["filterType"], "hierarchical");
    assert_eq!(first["data"]["document"]["referer"], "https://portal.example/");
    assert_eq!(first["data"]["window"]["width"], 1920);

    let second = &got[1]["events"][0];
    assert_eq!(second["kind"], "FILTER_STATE");
    assert_eq!(second["data"]["filterState"], json!([]));

    tracker.shutdown().await;
}
