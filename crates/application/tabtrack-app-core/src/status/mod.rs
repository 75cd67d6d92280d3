pub mod events;
pub mod reducer;
pub mod store;

pub use events::StatusEvent;
pub use reducer::reduce;
pub use store::StatusStore;

/// Why the tracker needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionReason {
    /// Deployment id or workbook name is missing.
    Unconfigured,
    /// A delivery failed since the last refresh.
    DeliveryFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStatus {
    Running,
    ActionRequired(ActionReason),
}

impl std::fmt::Display for TrackerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerStatus::Running => f.write_str("Running"),
            TrackerStatus::ActionRequired(ActionReason::Unconfigured) => {
                f.write_str("Action required: deployment id and workbook name must be set")
            }
            TrackerStatus::ActionRequired(ActionReason::DeliveryFailed) => {
                f.write_str("Action required: events could not be delivered")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusState {
    pub configured: bool,
    pub delivery_failed: bool,
    pub delivered: u64,
    pub failed: u64,
}

impl StatusState {
    pub fn status(&self) -> TrackerStatus {
        if !self.configured {
            TrackerStatus::ActionRequired(ActionReason::Unconfigured)
        } else if self.delivery_failed {
            TrackerStatus::ActionRequired(ActionReason::DeliveryFailed)
        } else {
            TrackerStatus::Running
        }
    }
}
