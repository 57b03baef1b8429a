//! # preferences
//!
//! Persistent display preferences — a flat JSON object on disk.
//!
//! The file is read once when the store is built; a missing or unreadable
//! file simply means "all defaults". Every change rewrites the whole file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const DARK_MODE_KEY: &str = "darkMode";

#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl PreferenceStore {
    /// Load preferences from `path`, falling back to an empty set.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(map) => {
                    debug!(path = %path.display(), keys = map.len(), "preferences loaded");
                    map
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "preferences file corrupt, using defaults");
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "preferences unreadable, using defaults");
                Map::new()
            }
        };

        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn dark_mode(&self) -> bool {
        self.values
            .lock()
            .await
            .get(DARK_MODE_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub async fn set_dark_mode(&self, enabled: bool) -> anyhow::Result<()> {
        let mut values = self.values.lock().await;
        values.insert(DARK_MODE_KEY.to_string(), Value::Bool(enabled));
        self.persist(&values).await?;
        info!(dark_mode = enabled, "dark mode preference saved");
        Ok(())
    }

    /// Flip dark mode and persist. Returns the new value.
    pub async fn toggle_dark_mode(&self) -> anyhow::Result<bool> {
        let mut values = self.values.lock().await;
        let enabled = !values.get(DARK_MODE_KEY).and_then(Value::as_bool).unwrap_or(false);
        values.insert(DARK_MODE_KEY.to_string(), Value::Bool(enabled));
        self.persist(&values).await?;
        info!(dark_mode = enabled, "dark mode toggled");
        Ok(enabled)
    }

    async fn persist(&self, values: &Map<String, Value>) -> anyhow::Result<()> {
        let body = serde_json::to_string_pretty(values)?;
        tokio::fs::write(&self.path, body)
            .await
            .with_context(|| format!("writing preferences to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("quant-dashboard-{name}-{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_missing_file_defaults_to_light() {
        let store = PreferenceStore::load(temp_path("missing"));
        assert!(!store.dark_mode().await);
    }

    #[tokio::test]
    async fn test_corrupt_file_defaults_to_light() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "{not json").unwrap();
        let store = PreferenceStore::load(&path);
        assert!(!store.dark_mode().await);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_toggle_persists_across_reload() {
        let path = temp_path("toggle");
        let store = PreferenceStore::load(&path);
        assert!(store.toggle_dark_mode().await.unwrap());

        let reloaded = PreferenceStore::load(&path);
        assert!(reloaded.dark_mode().await);

        let raw = std::fs::read_to_string(&path).unwrap();
        let json: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[DARK_MODE_KEY], Value::Bool(true));

        assert!(!reloaded.toggle_dark_mode().await.unwrap());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_unrelated_keys_survive_write() {
        let path = temp_path("keys");
        std::fs::write(&path, r#"{"language":"en"}"#).unwrap();
        let store = PreferenceStore::load(&path);
        store.set_dark_mode(true).await.unwrap();

        let json: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["language"], "en");
        assert_eq!(json[DARK_MODE_KEY], true);
        let _ = std::fs::remove_file(path);
    }
}
