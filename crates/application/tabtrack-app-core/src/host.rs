use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tabtrack_core::{HostEvent, HostFilter, Viewport};
use tabtrack_pipeline::{Environment, HostDashboard, SnapshotQueryError};
use tracing::debug;

/// Serialized dashboard layout with the filters currently applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDocument {
    pub name: String,
    #[serde(default)]
    pub worksheets: Vec<WorksheetDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetDocument {
    pub name: String,
    #[serde(default)]
    pub filters: Vec<HostFilter>,
}

/// Dashboard whose filter state lives in memory and follows the notifications
/// it is shown.
pub struct StaticDashboard {
    name: String,
    sheets: Mutex<Vec<WorksheetDocument>>,
}

impl StaticDashboard {
    pub fn new(doc: DashboardDocument) -> Self {
        let mut sheets = doc.worksheets;
        // Filters listed under a worksheet belong to it.
        for sheet in &mut sheets {
            for f in &mut sheet.filters {
                if f.worksheet_name.is_empty() {
                    f.worksheet_name = sheet.name.clone();
                }
            }
        }
        Self {
            name: doc.name,
            sheets: Mutex::new(sheets),
        }
    }

    /// Applies a host notification to the filter state. Selection changes are ignored.
    pub fn apply(&self, event: &HostEvent) {
        let HostEvent::FilterChanged { filter } = event else {
            return;
        };
        let mut sheets = self.sheets.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sheet) = sheets.iter_mut().find(|s| s.name == filter.worksheet_name) else {
            debug!("Filter change for unknown worksheet {}", filter.worksheet_name);
            return;
        };
        match sheet
            .filters
            .iter_mut()
            .find(|f| f.field_name == filter.field_name)
        {
            Some(existing) => *existing = filter.clone(),
            None => sheet.filters.push(filter.clone()),
        }
    }
}

#[async_trait::async_trait]
impl HostDashboard for StaticDashboard {
    fn dashboard_name(&self) -> String {
        self.name.clone()
    }

    fn worksheets(&self) -> Vec<String> {
        self.sheets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    async fn filters(&self, worksheet: &str) -> Result<Vec<HostFilter>, SnapshotQueryError> {
        self.sheets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|s| s.name == worksheet)
            .map(|s| s.filters.clone())
            .ok_or_else(|| SnapshotQueryError {
                worksheet: worksheet.to_string(),
                message: "no such worksheet".into(),
            })
    }
}

/// Fixed page state.
#[derive(Debug, Clone)]
pub struct StaticEnvironment {
    pub viewport: Viewport,
    pub location: String,
    pub referrer: Option<String>,
}

impl Environment for StaticEnvironment {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn location(&self) -> String {
        self.location.clone()
    }

    fn referrer(&self) -> Option<String> {
        self.referrer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dashboard() -> StaticDashboard {
        let doc: DashboardDocument = serde_json::from_value(json!({
            "name": "Sales",
            "worksheets": [
                {"name": "Map", "filters": [
                    {"fieldName": "Region", "filterType": "categorical", "appliedValues": ["East"]}
                ]},
                {"name": "Trend"}
            ]
        }))
        .unwrap();
        StaticDashboard::new(doc)
    }

    fn region(values: serde_json::Value) -> HostEvent {
        serde_json::from_value(json!({
            "type": "filter-changed",
            "filter": {
                "worksheetName": "Map",
                "fieldName": "Region",
                "filterType": "categorical",
                "appliedValues": values
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn filters_inherit_their_worksheet_name() {
        let d = dashboard();
        assert_eq!(d.worksheets(), vec!["Map", "Trend"]);
        let f = d.filters("Map").await.unwrap();
        assert_eq!(f[0].worksheet_name, "Map");
        assert!(d.filters("Trend").await.unwrap().is_empty());
        assert!(d.filters("Nope").await.is_err());
    }

    #[tokio::test]
    async fn filter_change_replaces_same_field() {
        let d = dashboard();
        d.apply(&region(json!(["West"])));
        let f = d.filters("Map").await.unwrap();
        assert_eq!(f.len(), 1);
        assert_eq!(
            serde_json::to_value(&f[0]).unwrap()["appliedValues"],
            json!(["West"])
        );
    }
}
