use futures::future::join_all;
use serde_json::{json, Map, Value};
use tabtrack_core::FilterStateEntry;
use tracing::debug;

use crate::ports::{HostDashboard, SnapshotQueryError};

/// Queries every worksheet's filters in parallel and flattens them in worksheet order.
///
/// Waits for all worksheets. A single failed query fails the whole snapshot; no
/// partial state is returned.
pub async fn snapshot_dashboard(
    host: &dyn HostDashboard,
) -> Result<Vec<FilterStateEntry>, SnapshotQueryError> {
    let worksheets = host.worksheets();
    debug!("Snapshotting filters of {} worksheets", worksheets.len());

    let results = join_all(worksheets.iter().map(|w| host.filters(w))).await;

    let mut entries = Vec::new();
    for res in results {
        entries.extend(res?.iter().map(FilterStateEntry::from));
    }
    Ok(entries)
}

/// FILTER_STATE payload: `{"filterState": [...]}`.
pub fn filter_state_payload(entries: &[FilterStateEntry]) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("filterState".into(), json!(entries));
    payload
}
