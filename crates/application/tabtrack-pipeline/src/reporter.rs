use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tabtrack_core::EventKind;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::debounce::{Debouncer, TokioClock, Trigger};
use crate::emitter::Emitter;
use crate::ports::HostDashboard;
use crate::snapshot::{filter_state_payload, snapshot_dashboard};

/// Coalesces filter-change signals into one FILTER_STATE event per quiet period.
///
/// The snapshot is taken when the window closes, so it reflects the dashboard at flush
/// time. Triggers that arrive while a snapshot is in flight re-arm the window for the
/// next one instead of starting a second query.
#[derive(Clone)]
pub struct StateReporter {
    tx: mpsc::UnboundedSender<()>,
}

impl StateReporter {
    pub fn spawn(
        emitter: Arc<Emitter>,
        host: Arc<dyn HostDashboard>,
        quiet_period: Duration,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_reporter(emitter, host, quiet_period, rx, cancel));
        (Self { tx }, handle)
    }

    pub fn trigger(&self) {
        if self.tx.send(()).is_err() {
            debug!("State reporter is gone; trigger ignored");
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(d) => sleep_until(d).await,
        None => pending::<()>().await,
    }
}

async fn run_reporter(
    emitter: Arc<Emitter>,
    host: Arc<dyn HostDashboard>,
    quiet_period: Duration,
    mut rx: mpsc::UnboundedReceiver<()>,
    cancel: CancellationToken,
) {
    let mut debouncer = Debouncer::new(quiet_period, TokioClock);

    loop {
        let deadline = debouncer.deadline();
        tokio::select! {
            () = cancel.cancelled() => break,
            msg = rx.recv() => match msg {
                Some(()) => {
                    if debouncer.trigger() == Trigger::Armed {
                        debug!("Filter state armed for {:?}", quiet_period);
                    }
                }
                None => break,
            },
            () = sleep_until_deadline(deadline) => {
                if debouncer.flush() {
                    report_filter_state(&emitter, host.as_ref()).await;
                }
            }
        }
    }
    info!("State reporter stopped");
}

async fn report_filter_state(emitter: &Emitter, host: &dyn HostDashboard) {
    debug!("START Sending filter state");
    match snapshot_dashboard(host).await {
        Ok(entries) => {
            debug!("COLLECTED filter state ({} filters)", entries.len());
            if let Err(e) = emitter.emit(EventKind::FilterState, filter_state_payload(&entries)) {
                warn!("Filter state not sent: {e}");
            }
        }
        Err(e) => warn!("Dropping filter state snapshot: {e}"),
    }
}
