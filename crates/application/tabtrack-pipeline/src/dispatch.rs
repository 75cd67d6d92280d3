use std::sync::Arc;
use tabtrack_core::{EventBatch, EventRecord};
use tabtrack_infra::{Collector, TransportError};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Outcome of one delivery attempt, published for status tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryReport {
    Delivered {
        sequence: String,
    },
    Failed {
        sequence: String,
        error: TransportError,
    },
}

/// Sends each event as its own batch of one. No retry, no queueing.
#[derive(Clone)]
pub struct Dispatcher {
    collector: Arc<dyn Collector>,
    reports: Option<UnboundedSender<DeliveryReport>>,
}

impl Dispatcher {
    pub fn new(collector: Arc<dyn Collector>) -> Self {
        Self {
            collector,
            reports: None,
        }
    }

    pub fn with_reports(mut self, reports: UnboundedSender<DeliveryReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Starts delivery in the background and returns at once.
    ///
    /// Must be called from within a Tokio runtime. The handle is only useful to tests;
    /// callers are not expected to await it.
    pub fn dispatch(&self, event: EventRecord) -> JoinHandle<()> {
        let collector = self.collector.clone();
        let reports = self.reports.clone();

        tokio::spawn(async move {
            let sequence = event.source_sequence_id.clone();
            let kind = event.kind;
            let report = match collector.post_batch(&EventBatch::single(event)).await {
                Ok(()) => {
                    debug!("Event {} #{} saved", kind, sequence);
                    DeliveryReport::Delivered { sequence }
                }
                Err(error) => {
                    warn!("Delivery of {} #{} failed: {}", kind, sequence, error);
                    DeliveryReport::Failed { sequence, error }
                }
            };
            if let Some(tx) = reports {
                let _ = tx.send(report);
            }
        })
    }
}
