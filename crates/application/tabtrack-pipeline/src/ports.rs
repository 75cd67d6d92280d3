use std::collections::BTreeMap;
use tabtrack_core::{HostFilter, Viewport};

use crate::settings::SettingsError;

/// Key-value extension settings. Composite values are JSON-encoded strings.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;
    fn all(&self) -> BTreeMap<String, String>;
}

/// Ambient page state read during enrichment.
pub trait Environment: Send + Sync {
    fn viewport(&self) -> Viewport;
    fn location(&self) -> String;
    fn referrer(&self) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("filter query for worksheet {worksheet} failed: {message}")]
pub struct SnapshotQueryError {
    pub worksheet: String,
    pub message: String,
}

/// The hosting dashboard.
#[async_trait::async_trait]
pub trait HostDashboard: Send + Sync {
    fn dashboard_name(&self) -> String;
    /// Worksheet names in dashboard order.
    fn worksheets(&self) -> Vec<String>;
    async fn filters(&self, worksheet: &str) -> Result<Vec<HostFilter>, SnapshotQueryError>;
}
