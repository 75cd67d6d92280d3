use serde_json::{Map, Value};
use tabtrack_config::{METADATA_KEY_PREFIX, WORKBOOK_KEY};

/// User-entered key/value metadata, stored JSON-encoded under one setting.
///
/// The `workbook` entry is special: it names the workbook every event is attributed to
/// and is kept apart from the free-form pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserMetadata {
    entries: Map<String, Value>,
}

impl UserMetadata {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            entries: serde_json::from_str(json)?,
        })
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.entries.clone()).to_string()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// The workbook name, if present as a string.
    pub fn workbook_name(&self) -> Option<&str> {
        self.entries.get(WORKBOOK_KEY).and_then(Value::as_str)
    }

    /// An empty name leaves the current one in place.
    pub fn set_workbook_name(&mut self, name: &str) {
        if !name.is_empty() {
            self.entries
                .insert(WORKBOOK_KEY.to_string(), Value::String(name.to_string()));
        }
    }

    pub fn initialize_workbook(&mut self) {
        self.entries
            .entry(WORKBOOK_KEY.to_string())
            .or_insert_with(|| Value::String(String::new()));
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.entries
            .insert(key.to_string(), Value::String(value.to_string()));
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Moves the value under `key` to `new_key`. Returns false if `key` is absent.
    pub fn rename(&mut self, key: &str, new_key: &str) -> bool {
        if key == new_key {
            return self.entries.contains_key(key);
        }
        match self.entries.remove(key) {
            Some(v) => {
                self.entries.insert(new_key.to_string(), v);
                true
            }
            None => false,
        }
    }

    /// First `Key N` (N >= 1) not already in use.
    pub fn next_free_key(&self) -> String {
        (1..)
            .map(|i| format!("{METADATA_KEY_PREFIX}{i}"))
            .find(|k| !self.entries.contains_key(k))
            .unwrap_or_else(|| METADATA_KEY_PREFIX.trim_end().to_string())
    }

    /// Adds an empty pair under the next free key and returns that key.
    pub fn add_pair(&mut self) -> String {
        let key = self.next_free_key();
        self.entries.insert(key.clone(), Value::String(String::new()));
        key
    }

    /// Free-form pairs, excluding the workbook entry.
    pub fn custom_pairs(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter().filter(|(k, _)| k.as_str() != WORKBOOK_KEY)
    }
}
