//! Credential persistence
//!
//! The API key lives in a small JSON file in the user's config directory,
//! under a fixed key, so it survives between sessions.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use crate::types::{SimError, SimResult};
use crate::{CREDENTIAL_ENV, CREDENTIAL_KEY};

const APP_DIR: &str = "echo-sim";
const FILE_NAME: &str = "credentials.json";

/// File-backed key/value credential store
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl Default for CredentialStore {
    fn default() -> Self {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(FILE_NAME);
        Self { path }
    }
}

impl CredentialStore {
    /// Store at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> HashMap<String, String> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> SimResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| SimError::Storage(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Stored key, if any and non-blank
    pub fn load(&self) -> Option<String> {
        self.read_all()
            .remove(CREDENTIAL_KEY)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    /// Persist a key; blank keys are rejected
    pub fn save(&self, key: &str) -> SimResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(SimError::MissingCredential);
        }
        let mut entries = self.read_all();
        entries.insert(CREDENTIAL_KEY.to_string(), key.to_string());
        self.write_all(&entries)?;
        info!(path = %self.path.display(), "API key saved");
        Ok(())
    }

    pub fn clear(&self) -> SimResult<()> {
        let mut entries = self.read_all();
        if entries.remove(CREDENTIAL_KEY).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    /// Explicit value, then the environment, then the stored key
    pub fn resolve(&self, explicit: Option<&str>) -> Option<String> {
        let from_env = std::env::var(CREDENTIAL_ENV).ok();
        let resolved = [explicit.map(str::to_string), from_env]
            .into_iter()
            .flatten()
            .map(|k| k.trim().to_string())
            .find(|k| !k.is_empty())
            .or_else(|| self.load());
        debug!(found = resolved.is_some(), "credential resolved");
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("nested").join(FILE_NAME));

        assert_eq!(store.load(), None);
        store.save("  abc123  ").unwrap();
        assert_eq!(store.load().as_deref(), Some("abc123"));

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains(CREDENTIAL_KEY));
    }

    #[test]
    fn test_blank_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join(FILE_NAME));
        assert!(matches!(store.save("   "), Err(SimError::MissingCredential)));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join(FILE_NAME));
        store.save("abc").unwrap();
        store.clear().unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_explicit_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join(FILE_NAME));
        store.save("stored").unwrap();
        assert_eq!(store.resolve(Some("flag")).as_deref(), Some("flag"));
    }
}
