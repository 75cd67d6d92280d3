use serde_json::{json, Map, Value};
use std::sync::Arc;
use tabtrack_config::REFERRER_SENTINEL;

use crate::ports::Environment;
use crate::settings::ExtensionSettings;

type Payload = Map<String, Value>;
type Stage = fn(&Enricher, Payload) -> Payload;

/// Attaches page context to a raw payload before it is built into an event.
///
/// Stages run left to right, each seeing the previous output. A stage overrides only
/// the one key it owns.
pub struct Enricher {
    env: Arc<dyn Environment>,
    settings: ExtensionSettings,
}

impl Enricher {
    const STAGES: [Stage; 3] = [
        Enricher::with_viewport,
        Enricher::with_document,
        Enricher::with_settings,
    ];

    pub fn new(env: Arc<dyn Environment>, settings: ExtensionSettings) -> Self {
        Self { env, settings }
    }

    pub fn enrich(&self, payload: Payload) -> Payload {
        Self::STAGES
            .iter()
            .fold(payload, |acc, stage| stage(self, acc))
    }

    fn with_viewport(&self, mut payload: Payload) -> Payload {
        let viewport = self.env.viewport();
        payload.insert(
            "window".into(),
            json!({ "width": viewport.width, "height": viewport.height }),
        );
        payload
    }

    fn with_document(&self, mut payload: Payload) -> Payload {
        let referer = self
            .env
            .referrer()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| REFERRER_SENTINEL.to_string());
        payload.insert(
            "document".into(),
            json!({ "location": self.env.location(), "referer": referer }),
        );
        payload
    }

    fn with_settings(&self, mut payload: Payload) -> Payload {
        payload.insert("settings".into(), json!(self.settings.snapshot()));
        payload
    }
}
