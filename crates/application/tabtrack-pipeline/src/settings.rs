use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tabtrack_config::{DEPLOYMENT_ID_KEY, USER_METADATA_KEY};
use tabtrack_core::UserMetadata;
use tracing::warn;

use crate::ports::SettingsStore;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings store error: {0}")]
    Store(String),
    #[error("setting {key} is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// In-process settings store.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: Mutex::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn all(&self) -> BTreeMap<String, String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Configuration context handed to the builder, enricher and status logic.
///
/// Values are read from the store on every call, so edits made between events are
/// picked up without rebuilding anything.
#[derive(Clone)]
pub struct ExtensionSettings {
    store: Arc<dyn SettingsStore>,
}

impl ExtensionSettings {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }

    pub fn deployment_id(&self) -> Option<String> {
        self.store
            .get(DEPLOYMENT_ID_KEY)
            .filter(|id| !id.is_empty())
    }

    pub fn set_deployment_id(&self, id: &str) -> Result<(), SettingsError> {
        self.store.set(DEPLOYMENT_ID_KEY, id)
    }

    pub fn user_metadata(&self) -> Result<UserMetadata, SettingsError> {
        match self.store.get(USER_METADATA_KEY) {
            Some(raw) if !raw.is_empty() => {
                UserMetadata::parse(&raw).map_err(|source| SettingsError::Corrupt {
                    key: USER_METADATA_KEY.to_string(),
                    source,
                })
            }
            _ => Ok(UserMetadata::default()),
        }
    }

    pub fn workbook_name(&self) -> Option<String> {
        match self.user_metadata() {
            Ok(meta) => meta.workbook_name().map(str::to_string),
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }

    /// Read-modify-write of the user metadata.
    pub fn update_metadata<R>(
        &self,
        f: impl FnOnce(&mut UserMetadata) -> R,
    ) -> Result<R, SettingsError> {
        let mut meta = self.user_metadata()?;
        let out = f(&mut meta);
        self.store.set(USER_METADATA_KEY, &meta.to_json())?;
        Ok(out)
    }

    pub fn initialize_workbook(&self) -> Result<(), SettingsError> {
        self.update_metadata(UserMetadata::initialize_workbook)
    }

    pub fn set_workbook_name(&self, name: &str) -> Result<(), SettingsError> {
        self.update_metadata(|m| m.set_workbook_name(name))
    }

    pub fn add_metadata_pair(&self) -> Result<String, SettingsError> {
        self.update_metadata(UserMetadata::add_pair)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.update_metadata(|m| m.set(key, value))
    }

    pub fn rename_metadata(&self, key: &str, new_key: &str) -> Result<bool, SettingsError> {
        self.update_metadata(|m| m.rename(key, new_key))
    }

    pub fn remove_metadata(&self, key: &str) -> Result<bool, SettingsError> {
        self.update_metadata(|m| m.remove(key).is_some())
    }

    /// Both a deployment id and a workbook name are present.
    pub fn is_configured(&self) -> bool {
        self.deployment_id().is_some() && self.workbook_name().is_some_and(|w| !w.is_empty())
    }

    /// Every stored setting, as attached to outgoing events.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.store.all()
    }
}
