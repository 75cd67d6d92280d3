use serde_json::Map;
use std::sync::Arc;
use std::time::Duration;
use tabtrack_core::EventKind;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::emitter::Emitter;

/// Emits one NOOP event every `period` until cancelled.
///
/// The first beat fires one full period after start. Delivery outcomes never pause
/// the loop.
pub async fn run_heartbeat(emitter: Arc<Emitter>, period: Duration, cancel: CancellationToken) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    // A stalled executor yields one late beat, not a burst.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("Heartbeat every {:?}", period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = emitter.emit(EventKind::Noop, Map::new()) {
                    warn!("Heartbeat not sent: {e}");
                }
            }
            () = cancel.cancelled() => {
                info!("Heartbeat stopped");
                return;
            }
        }
    }
}
