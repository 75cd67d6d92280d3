use serde_json::{json, Map, Value};
use tabtrack_core::{BuildError, EventKind, EventRecord, FilterStateEntry, HostFilter};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::dispatch::Dispatcher;
use crate::enrich::Enricher;
use crate::session::EventBuilder;

/// The enrich -> build -> dispatch chain shared by every producer.
pub struct Emitter {
    enricher: Enricher,
    builder: EventBuilder,
    dispatcher: Dispatcher,
}

impl Emitter {
    pub fn new(enricher: Enricher, builder: EventBuilder, dispatcher: Dispatcher) -> Self {
        Self {
            enricher,
            builder,
            dispatcher,
        }
    }

    pub fn builder(&self) -> &EventBuilder {
        &self.builder
    }

    /// Enriches and builds synchronously, then hands the record to the dispatcher.
    ///
    /// Build failures are returned and nothing is sent.
    pub fn emit(
        &self,
        kind: EventKind,
        payload: Map<String, Value>,
    ) -> Result<JoinHandle<()>, BuildError> {
        let record = self.prepare(kind, payload)?;
        Ok(self.dispatch(record))
    }

    /// Sends an already built record.
    pub fn dispatch(&self, record: EventRecord) -> JoinHandle<()> {
        self.dispatcher.dispatch(record)
    }

    /// Enrich and build without sending.
    pub fn prepare(
        &self,
        kind: EventKind,
        payload: Map<String, Value>,
    ) -> Result<EventRecord, BuildError> {
        debug!("Emitting {} with {} payload keys", kind, payload.len());
        self.builder.build(kind, Value::Object(self.enricher.enrich(payload)))
    }

    pub fn emit_filter_change(&self, filter: &HostFilter) -> Result<JoinHandle<()>, BuildError> {
        self.emit(EventKind::FilterChange, filter_change_payload(filter))
    }

    pub fn emit_selection_change(
        &self,
        worksheet_name: &str,
        selected_marks: &[Value],
    ) -> Result<JoinHandle<()>, BuildError> {
        let mut payload = Map::new();
        payload.insert("worksheetName".into(), json!(worksheet_name));
        payload.insert("selectedMarks".into(), json!(selected_marks));
        self.emit(EventKind::SelectionChange, payload)
    }
}

/// `{fieldName, worksheetName, filterType, ...descriptor}` for one changed filter.
pub fn filter_change_payload(filter: &HostFilter) -> Map<String, Value> {
    FilterStateEntry::from(filter).to_map()
}
