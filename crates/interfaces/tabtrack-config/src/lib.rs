//! Central configuration constants for runtime timings, endpoints and settings keys.

use std::time::Duration;

/// Quiet period the filter-state reporter waits for before snapshotting. 5 s.
pub const FILTER_STATE_QUIET_PERIOD: Duration = Duration::from_millis(5_000);

/// Interval between liveness (NOOP) events. 15 s.
pub const HEARTBEAT_PERIOD: Duration = Duration::from_millis(15_000);

/// Collector base used when the hosting page does not name one.
pub const DEFAULT_COLLECTOR_BASE: &str = "/api/1.0/events";

/// Query parameter on the hosting page that overrides the collector base.
pub const COLLECTOR_BASE_PARAM: &str = "backendUrl";

/// Path (relative to the collector base) events are posted to.
pub const EVENTS_PATH: &str = "tableau-events";

/// Path (relative to the collector base) deployment ids are validated against.
pub const VALIDATE_PATH: &str = "validate";

/// Content type of every collector request.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Settings key holding the deployment identifier.
pub const DEPLOYMENT_ID_KEY: &str = "deploymentId";

/// Settings key holding the JSON-encoded user metadata map.
pub const USER_METADATA_KEY: &str = "userMetadata";

/// User metadata entry holding the workbook name.
pub const WORKBOOK_KEY: &str = "workbook";

/// Project name used when none is supplied.
pub const DEFAULT_PROJECT_NAME: &str = "Default";

/// Stand-in for an absent referrer; the collector rejects empty attribute values.
pub const REFERRER_SENTINEL: &str = "NULL";

/// Prefix of auto-generated user metadata keys (`Key 1`, `Key 2`, ...).
pub const METADATA_KEY_PREFIX: &str = "Key ";

/// Source id shape: groups of base-32 characters joined by `-`.
pub const SOURCE_ID_GROUPS: usize = 6;
pub const SOURCE_ID_GROUP_LEN: usize = 4;
