use reqwest::Url;
use std::time::Duration;
use tabtrack_config::{DEFAULT_PROJECT_NAME, FILTER_STATE_QUIET_PERIOD, HEARTBEAT_PERIOD};
use tabtrack_core::Viewport;

/// Everything a tracker session needs besides settings and the host.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// URL of the page hosting the extension. Selects the collector.
    pub page_url: Url,
    pub referrer: Option<String>,
    pub viewport: Viewport,
    pub project_name: String,
    pub quiet_period: Duration,
    pub heartbeat_period: Duration,
}

impl TrackerConfig {
    pub fn new(page_url: Url) -> Self {
        Self {
            page_url,
            referrer: None,
            viewport: Viewport {
                width: 1920,
                height: 1080,
            },
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            quiet_period: FILTER_STATE_QUIET_PERIOD,
            heartbeat_period: HEARTBEAT_PERIOD,
        }
    }
}
