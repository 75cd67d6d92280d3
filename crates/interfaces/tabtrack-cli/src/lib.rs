pub mod commands;
pub mod settings;

use anyhow::Result;
use camino::Utf8Path;
use std::sync::Arc;
use tabtrack_app_core::FileSettingsStore;
use tabtrack_pipeline::ExtensionSettings;

/// Opens the settings file at `path`, or the one in the platform config directory.
pub fn open_settings(path: Option<&Utf8Path>) -> Result<ExtensionSettings> {
    let store = match path {
        Some(p) => FileSettingsStore::open(p.as_std_path())?,
        None => FileSettingsStore::open_default()?,
    };
    tracing::debug!("Settings file: {}", store.path().display());
    Ok(ExtensionSettings::new(Arc::new(store)))
}
