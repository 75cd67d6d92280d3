use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tabtrack_app_core::{
    DashboardDocument, StaticDashboard, StaticEnvironment, Tracker, TrackerConfig, TrackerStatus,
};
use tabtrack_core::{check_wire_record, EventKind, EventRecord, HostEvent};
use tabtrack_infra::{resolve_collector_base, Collector, HttpCollector};
use tabtrack_pipeline::{
    DeliveryReport, Dispatcher, Emitter, Enricher, EventBuilder, ExtensionSettings,
    SessionContext,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

fn collector_for(page_url: &str) -> Result<HttpCollector> {
    let base = resolve_collector_base(page_url).context("Failed to resolve collector")?;
    Ok(HttpCollector::new(reqwest::Client::new(), base))
}

/// Checks a deployment id with the collector. On success a given id is saved.
pub async fn cmd_validate(
    settings: &ExtensionSettings,
    page_url: &str,
    deployment_id: Option<String>,
) -> Result<bool> {
    if settings.workbook_name().unwrap_or_default().is_empty() {
        bail!("Set a workbook name before validating a deployment");
    }
    let id = deployment_id
        .clone()
        .or_else(|| settings.deployment_id())
        .ok_or_else(|| anyhow!("No deployment ID given or saved"))?;

    let collector = collector_for(page_url)?;
    println!(":: Validating deployment '{}'", id);
    println!("   Collector: {}", collector.base());

    let valid = collector
        .validate_deployment(&id)
        .await
        .context("Validation request failed")?;

    if valid {
        if deployment_id.is_some() {
            settings.set_deployment_id(&id)?;
        }
        println!("   Deployment ID is valid.");
    } else {
        println!("   Deployment ID was rejected.");
    }
    Ok(valid)
}

/// Arguments for a one-off event.
#[derive(Debug, Clone)]
pub struct EmitRequest {
    pub page_url: String,
    pub kind: String,
    pub dashboard_name: String,
    pub project_name: String,
    pub referrer: Option<String>,
    pub data: Map<String, Value>,
}

/// Builds, enriches and delivers one event in a fresh session, waiting for the outcome.
pub async fn cmd_emit(settings: &ExtensionSettings, req: EmitRequest) -> Result<EventRecord> {
    let kind: EventKind = req.kind.parse()?;
    let collector = Arc::new(collector_for(&req.page_url)?);

    let config = TrackerConfig::new(req.page_url.parse().context("Invalid page URL")?);
    let env = Arc::new(StaticEnvironment {
        viewport: config.viewport,
        location: req.page_url.clone(),
        referrer: req.referrer,
    });
    let (tx, mut rx) = mpsc::unbounded_channel();
    let emitter = Emitter::new(
        Enricher::new(env, settings.clone()),
        EventBuilder::new(SessionContext::new(
            settings.clone(),
            &req.dashboard_name,
            &req.project_name,
        )),
        Dispatcher::new(collector).with_reports(tx),
    );

    let record = emitter.prepare(kind, req.data)?;
    emitter.dispatch(record.clone()).await?;

    match rx.recv().await {
        Some(DeliveryReport::Delivered { .. }) => {
            println!(":: Sent {} #{}", record.kind, record.source_sequence_id);
            Ok(record)
        }
        Some(DeliveryReport::Failed { error, .. }) => Err(error).context("Delivery failed"),
        None => bail!("Delivery outcome was lost"),
    }
}

/// Validates a serialized event record and returns its kind.
pub fn cmd_check_record(json: &str) -> Result<EventKind> {
    let value: Value = serde_json::from_str(json).context("Record is not valid JSON")?;
    Ok(check_wire_record(&value)?)
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: TrackerConfig,
    /// How long to keep the session alive after the input ends.
    pub linger: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub handled: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub status: TrackerStatus,
}

/// Runs a session over `dashboard`, feeding it one JSON host notification per line.
pub async fn cmd_run<R>(
    settings: &ExtensionSettings,
    opts: RunOptions,
    dashboard: DashboardDocument,
    input: R,
) -> Result<RunSummary>
where
    R: AsyncBufRead + Unpin,
{
    let host = Arc::new(StaticDashboard::new(dashboard));
    let tracker = Tracker::connect(opts.config, settings.clone(), host.clone())?;
    println!(":: Session {} started", tracker.source_id());

    let mut summary = RunSummary {
        handled: 0,
        rejected: 0,
        skipped: 0,
        status: tracker.status(),
    };

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: HostEvent = match serde_json::from_str(line) {
            Ok(ev) => ev,
            Err(e) => {
                warn!("Skipping malformed notification: {e}");
                summary.skipped += 1;
                continue;
            }
        };
        host.apply(&event);
        match tracker.handle(&event) {
            Ok(()) => summary.handled += 1,
            Err(e) => {
                warn!("Notification not sent: {e}");
                summary.rejected += 1;
            }
        }
    }

    info!("Input finished; lingering for {:?}", opts.linger);
    tokio::time::sleep(opts.linger).await;

    summary.status = tracker.status();
    tracker.shutdown().await;

    println!(
        ":: Handled {}, rejected {}, skipped {}",
        summary.handled, summary.rejected, summary.skipped
    );
    println!("   Status: {}", summary.status);
    Ok(summary)
}
