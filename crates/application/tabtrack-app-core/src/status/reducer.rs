use tabtrack_pipeline::DeliveryReport;

use super::events::StatusEvent;
use super::StatusState;

pub fn reduce(mut state: StatusState, ev: StatusEvent) -> StatusState {
    match ev {
        StatusEvent::Refreshed { configured } => {
            state.configured = configured;
            state.delivery_failed = false;
        }

        StatusEvent::Delivery(DeliveryReport::Delivered { .. }) => {
            state.delivered += 1;
        }

        // Sticky until the next refresh.
        StatusEvent::Delivery(DeliveryReport::Failed { .. }) => {
            state.failed += 1;
            state.delivery_failed = true;
        }
    }
    state
}
