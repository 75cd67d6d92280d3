pub mod config;
pub mod host;
pub mod persistence;
pub mod status;
pub mod tracker;

pub use config::TrackerConfig;
pub use host::{DashboardDocument, StaticDashboard, StaticEnvironment, WorksheetDocument};
pub use persistence::FileSettingsStore;
pub use status::*;
pub use tracker::Tracker;
