#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tabtrack_core::{EventBatch, EventKind, EventRecord, Filter, HostFilter, Viewport};
use tabtrack_infra::{Collector, TransportError};
use tabtrack_pipeline::{
    DeliveryReport, Dispatcher, Emitter, Enricher, Environment, EventBuilder, ExtensionSettings,
    HostDashboard, MemorySettingsStore, SessionContext, SnapshotQueryError,
};
use tokio::sync::mpsc;

#[derive(Default)]
pub struct RecordingCollector {
    pub batches: Mutex<Vec<EventBatch>>,
    pub fail: AtomicBool,
}

impl RecordingCollector {
    pub fn failing() -> Self {
        let c = Self::default();
        c.fail.store(true, Ordering::SeqCst);
        c
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flat_map(|b| b.events.clone())
            .collect()
    }

    pub fn events_of(&self, kind: EventKind) -> Vec<EventRecord> {
        self.events().into_iter().filter(|e| e.kind == kind).collect()
    }
}

#[async_trait::async_trait]
impl Collector for RecordingCollector {
    async fn post_batch(&self, batch: &EventBatch) -> Result<(), TransportError> {
        self.batches.lock().unwrap().push(batch.clone());
        if self.fail.load(Ordering::SeqCst) {
            Err(TransportError::Status(503))
        } else {
            Ok(())
        }
    }

    async fn validate_deployment(&self, _deployment_id: &str) -> Result<bool, TransportError> {
        Ok(true)
    }
}

pub struct FixedEnvironment {
    pub referrer: Option<String>,
}

impl Environment for FixedEnvironment {
    fn viewport(&self) -> Viewport {
        Viewport {
            width: 1280,
            height: 720,
        }
    }

    fn location(&self) -> String {
        "https://host.example/ext/index.html".into()
    }

    fn referrer(&self) -> Option<String> {
        self.referrer.clone()
    }
}

#[derive(Default)]
pub struct TestDashboard {
    pub worksheets: Vec<String>,
    pub filters: Mutex<HashMap<String, Vec<HostFilter>>>,
    pub failing: Mutex<HashSet<String>>,
    pub delays: HashMap<String, Duration>,
    pub queries: Mutex<u32>,
}

impl TestDashboard {
    pub fn new(worksheets: &[&str]) -> Self {
        Self {
            worksheets: worksheets.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn set_filters(&self, worksheet: &str, filters: Vec<HostFilter>) {
        self.filters
            .lock()
            .unwrap()
            .insert(worksheet.to_string(), filters);
    }
}

#[async_trait::async_trait]
impl HostDashboard for TestDashboard {
    fn dashboard_name(&self) -> String {
        "Sales".into()
    }

    fn worksheets(&self) -> Vec<String> {
        self.worksheets.clone()
    }

    async fn filters(&self, worksheet: &str) -> Result<Vec<HostFilter>, SnapshotQueryError> {
        *self.queries.lock().unwrap() += 1;
        if let Some(d) = self.delays.get(worksheet) {
            tokio::time::sleep(*d).await;
        }
        if self.failing.lock().unwrap().contains(worksheet) {
            return Err(SnapshotQueryError {
                worksheet: worksheet.to_string(),
                message: "host refused".into(),
            });
        }
        Ok(self
            .filters
            .lock()
            .unwrap()
            .get(worksheet)
            .cloned()
            .unwrap_or_default())
    }
}

pub fn categorical(worksheet: &str, field: &str, values: &[&str]) -> HostFilter {
    HostFilter {
        worksheet_name: worksheet.into(),
        field_name: field.into(),
        filter: Filter::Categorical {
            applied_values: values.iter().map(|v| json!(v)).collect(),
            is_exclude_mode: false,
        },
    }
}

pub fn settings(deployment: Option<&str>, workbook: Option<&str>) -> ExtensionSettings {
    let store = MemorySettingsStore::new();
    let settings = ExtensionSettings::new(Arc::new(store));
    if let Some(d) = deployment {
        settings.set_deployment_id(d).unwrap();
    }
    if let Some(w) = workbook {
        settings.set_workbook_name(w).unwrap();
    }
    settings
}

pub struct Harness {
    pub emitter: Arc<Emitter>,
    pub collector: Arc<RecordingCollector>,
    pub settings: ExtensionSettings,
    pub reports: mpsc::UnboundedReceiver<DeliveryReport>,
}

pub fn harness_with(collector: RecordingCollector, settings: ExtensionSettings) -> Harness {
    let collector = Arc::new(collector);
    let (tx, reports) = mpsc::unbounded_channel();
    let context = SessionContext::with_source_id(
        settings.clone(),
        "ab12-cd34".into(),
        "Sales",
        "Default",
    );
    let env = Arc::new(FixedEnvironment { referrer: None });
    let emitter = Emitter::new(
        Enricher::new(env, settings.clone()),
        EventBuilder::new(context),
        Dispatcher::new(collector.clone()).with_reports(tx),
    );
    Harness {
        emitter: Arc::new(emitter),
        collector,
        settings,
        reports,
    }
}

pub fn harness() -> Harness {
    harness_with(
        RecordingCollector::default(),
        settings(Some("D1"), Some("Book")),
    )
}
