use anyhow::{Context, Result};
use std::sync::Arc;
use tabtrack_core::{BuildError, HostEvent};
use tabtrack_infra::{resolve_collector_base, Collector, HttpCollector};
use tabtrack_pipeline::{
    run_heartbeat, DeliveryReport, Dispatcher, Emitter, Enricher, EventBuilder,
    ExtensionSettings, HostDashboard, SessionContext, StateReporter,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::TrackerConfig;
use crate::host::StaticEnvironment;
use crate::status::{StatusEvent, StatusStore, TrackerStatus};

/// One running extension session: heartbeat, debounced state reporting, and
/// delivery tracking, all stopped together by [`Tracker::shutdown`].
///
/// Dropping the tracker cancels its tasks without waiting for them.
pub struct Tracker {
    settings: ExtensionSettings,
    emitter: Arc<Emitter>,
    reporter: StateReporter,
    status: StatusStore,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Tracker {
    /// Starts a session posting to the collector selected by `config.page_url`.
    pub fn connect(
        config: TrackerConfig,
        settings: ExtensionSettings,
        host: Arc<dyn HostDashboard>,
    ) -> Result<Self> {
        let base = resolve_collector_base(config.page_url.as_str())
            .context("Failed to resolve collector")?;
        let collector = Arc::new(HttpCollector::new(reqwest::Client::new(), base));
        Self::start(config, settings, host, collector)
    }

    /// Must be called from within a Tokio runtime.
    pub fn start(
        config: TrackerConfig,
        settings: ExtensionSettings,
        host: Arc<dyn HostDashboard>,
        collector: Arc<dyn Collector>,
    ) -> Result<Self> {
        settings
            .initialize_workbook()
            .context("Failed to initialize user metadata")?;

        let context = SessionContext::new(
            settings.clone(),
            &host.dashboard_name(),
            &config.project_name,
        );
        info!(
            "Session {} started on dashboard {:?} ({} worksheets)",
            context.source_id(),
            context.dashboard_name(),
            host.worksheets().len()
        );

        let env = Arc::new(StaticEnvironment {
            viewport: config.viewport,
            location: config.page_url.to_string(),
            referrer: config.referrer.clone(),
        });
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        let emitter = Arc::new(Emitter::new(
            Enricher::new(env, settings.clone()),
            EventBuilder::new(context),
            Dispatcher::new(collector).with_reports(reports_tx),
        ));

        let cancel = CancellationToken::new();
        let (reporter, reporter_task) = StateReporter::spawn(
            emitter.clone(),
            host,
            config.quiet_period,
            cancel.clone(),
        );
        let heartbeat_task = tokio::spawn(run_heartbeat(
            emitter.clone(),
            config.heartbeat_period,
            cancel.clone(),
        ));

        let status = StatusStore::default();
        status.apply(StatusEvent::Refreshed {
            configured: settings.is_configured(),
        });
        let status_task = tokio::spawn(track_deliveries(
            reports_rx,
            status.clone(),
            cancel.clone(),
        ));

        Ok(Self {
            settings,
            emitter,
            reporter,
            status,
            cancel,
            tasks: vec![reporter_task, heartbeat_task, status_task],
        })
    }

    pub fn source_id(&self) -> &str {
        self.emitter.builder().context().source_id()
    }

    pub fn settings(&self) -> &ExtensionSettings {
        &self.settings
    }

    /// Reacts to a host notification.
    ///
    /// A filter change is emitted at once and also arms the state reporter, even
    /// when the change event itself could not be built.
    pub fn handle(&self, event: &HostEvent) -> Result<(), BuildError> {
        match event {
            HostEvent::FilterChanged { filter } => {
                debug!(
                    "Filter {} changed on {}",
                    filter.field_name, filter.worksheet_name
                );
                let sent = self.emitter.emit_filter_change(filter);
                self.reporter.trigger();
                sent.map(drop)
            }
            HostEvent::SelectionChanged {
                worksheet_name,
                selected_marks,
            } => self
                .emitter
                .emit_selection_change(worksheet_name, selected_marks)
                .map(drop),
        }
    }

    pub fn status(&self) -> TrackerStatus {
        self.status.status()
    }

    pub fn status_store(&self) -> &StatusStore {
        &self.status
    }

    /// Re-reads the settings and clears any recorded delivery failure.
    pub fn refresh_status(&self) -> TrackerStatus {
        self.status.apply(StatusEvent::Refreshed {
            configured: self.settings.is_configured(),
        });
        let status = self.status.status();
        info!("Status: {}", status);
        status
    }

    /// Stops every task. A pending filter-state window is discarded.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            let _ = task.await;
        }
        info!("Session {} stopped", self.source_id());
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn track_deliveries(
    mut rx: mpsc::UnboundedReceiver<DeliveryReport>,
    status: StatusStore,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            report = rx.recv() => match report {
                Some(report) => status.apply(StatusEvent::Delivery(report)),
                None => break,
            },
        }
    }
}
