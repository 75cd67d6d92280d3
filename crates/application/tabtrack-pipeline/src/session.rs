use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use tabtrack_config::DEFAULT_PROJECT_NAME;
use tabtrack_core::{generate_source_id, BuildError, EventKind, EventRecord};
use tracing::{debug, warn};

use crate::settings::ExtensionSettings;

/// Identity of one extension load.
///
/// Deployment id and workbook name are not captured here: they come from the
/// settings at build time.
#[derive(Clone)]
pub struct SessionContext {
    source_id: String,
    dashboard_name: String,
    project_name: String,
    settings: ExtensionSettings,
}

impl SessionContext {
    pub fn new(settings: ExtensionSettings, dashboard_name: &str, project_name: &str) -> Self {
        Self::with_source_id(
            settings,
            generate_source_id(),
            dashboard_name,
            project_name,
        )
    }

    pub fn with_source_id(
        settings: ExtensionSettings,
        source_id: String,
        dashboard_name: &str,
        project_name: &str,
    ) -> Self {
        let project_name = if project_name.is_empty() {
            DEFAULT_PROJECT_NAME
        } else {
            project_name
        };
        Self {
            source_id,
            dashboard_name: dashboard_name.to_string(),
            project_name: project_name.to_string(),
            settings,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn dashboard_name(&self) -> &str {
        &self.dashboard_name
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn settings(&self) -> &ExtensionSettings {
        &self.settings
    }
}

/// Turns (kind, payload) into a validated record stamped with the next sequence number.
///
/// The counter is the only mutable session state and is touched nowhere else. It is
/// committed only after the candidate record validates, so failed builds leave no gap.
pub struct EventBuilder {
    context: SessionContext,
    sequence: Mutex<u64>,
}

impl EventBuilder {
    pub fn new(context: SessionContext) -> Self {
        Self {
            context,
            sequence: Mutex::new(0),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn build(&self, kind: EventKind, data: Value) -> Result<EventRecord, BuildError> {
        let settings = self.context.settings();
        let mut sequence = self.sequence.lock().unwrap_or_else(PoisonError::into_inner);
        let next = *sequence + 1;

        let record = EventRecord {
            deployment_id: settings.deployment_id().unwrap_or_default(),
            source_id: self.context.source_id.clone(),
            source_sequence_id: next.to_string(),
            recorded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            workbook_name: settings.workbook_name().unwrap_or_default(),
            dashboard_name: self.context.dashboard_name.clone(),
            project_name: self.context.project_name.clone(),
            kind,
            data,
        };

        if let Err(e) = record.validate() {
            warn!("Dropping invalid {} event: {}", kind, e);
            return Err(e.into());
        }

        *sequence = next;
        debug!("Built {} #{}", kind, next);
        Ok(record)
    }

    /// Like [`EventBuilder::build`] for a kind given by name.
    pub fn build_named(&self, kind: &str, data: Value) -> Result<EventRecord, BuildError> {
        let kind = kind.parse::<EventKind>().map_err(|e| {
            warn!("{e}");
            e
        })?;
        self.build(kind, data)
    }
}
