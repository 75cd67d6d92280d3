use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Closed set of event kinds the collector accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Noop,
    FilterChange,
    FilterState,
    SelectionChange,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Noop,
        EventKind::FilterChange,
        EventKind::FilterState,
        EventKind::SelectionChange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Noop => "NOOP",
            EventKind::FilterChange => "FILTER_CHANGE",
            EventKind::FilterState => "FILTER_STATE",
            EventKind::SelectionChange => "SELECTION_CHANGE",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = InvalidKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| InvalidKindError {
                kind: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Not a valid event kind: {kind}")]
pub struct InvalidKindError {
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("While validating: {record}: Missing attribute: `{field}`")]
pub struct ValidationError {
    pub field: String,
    /// The offending record, serialized as JSON.
    pub record: String,
}

/// Failure modes of building one event. Neither is ever transmitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    InvalidKind(#[from] InvalidKindError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Wire names of the attributes that must be non-empty strings.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "deploymentId",
    "sourceId",
    "sourceSequenceId",
    "recordedAt",
    "projectName",
    "dashboardName",
    "workbookName",
    "kind",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub deployment_id: String,
    pub source_id: String,
    pub source_sequence_id: String,
    pub recorded_at: String,
    pub workbook_name: String,
    pub dashboard_name: String,
    pub project_name: String,
    pub kind: EventKind,
    pub data: Value,
}

impl EventRecord {
    fn required(&self) -> [(&'static str, &str); 8] {
        [
            ("deploymentId", self.deployment_id.as_str()),
            ("sourceId", self.source_id.as_str()),
            ("sourceSequenceId", self.source_sequence_id.as_str()),
            ("recordedAt", self.recorded_at.as_str()),
            ("projectName", self.project_name.as_str()),
            ("dashboardName", self.dashboard_name.as_str()),
            ("workbookName", self.workbook_name.as_str()),
            ("kind", self.kind.as_str()),
        ]
    }

    /// Fails on the first required attribute that is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.required().into_iter().find(|(_, v)| v.is_empty()) {
            Some((field, _)) => Err(ValidationError {
                field: field.to_string(),
                record: serde_json::to_string(self).unwrap_or_default(),
            }),
            None => Ok(()),
        }
    }
}

/// Validates an already-serialized record, as the collector would see it.
///
/// Every required attribute must be a non-empty JSON string and `kind` must name a
/// member of [`EventKind`].
pub fn check_wire_record(value: &Value) -> Result<EventKind, BuildError> {
    for field in REQUIRED_FIELDS {
        let ok = value
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty());
        if !ok {
            return Err(ValidationError {
                field: field.to_string(),
                record: value.to_string(),
            }
            .into());
        }
    }
    let kind = value
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Ok(kind.parse()?)
}

/// Request body envelope; the dispatcher always sends a batch of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    pub events: Vec<EventRecord>,
}

impl EventBatch {
    pub fn single(event: EventRecord) -> Self {
        Self {
            events: vec![event],
        }
    }
}
