use serde::{Deserialize, Serialize};

pub mod filters;
pub mod metadata;
pub mod record;
pub mod source_id;

pub use filters::{extract, Filter, FilterSnapshot, FilterStateEntry, HostFilter};
pub use metadata::UserMetadata;
pub use record::{
    check_wire_record, BuildError, EventBatch, EventKind, EventRecord, InvalidKindError,
    ValidationError,
};
pub use source_id::generate_source_id;

/// Browser viewport at enrichment time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Document location of the hosting page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLocation {
    pub location: String,
    // The collector schema uses the single-r spelling.
    pub referer: String,
}

/// A notification raised by the host dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostEvent {
    FilterChanged { filter: HostFilter },
    #[serde(rename_all = "camelCase")]
    SelectionChanged {
        worksheet_name: String,
        #[serde(default)]
        selected_marks: Vec<serde_json::Value>,
    },
}
