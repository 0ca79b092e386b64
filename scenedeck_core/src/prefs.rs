//! Durable key/value preferences.

use crate::config::ConnectionSettings;
use crate::soundboard::CustomSound;
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub const KEY_HOST: &str = "obs_ip";
pub const KEY_PORT: &str = "obs_port";
pub const KEY_PASSWORD: &str = "obs_pass";
pub const KEY_SCENE_ORDER: &str = "obs_scene_order";
pub const KEY_CUSTOM_SOUNDS: &str = "obs_custom_sounds";
pub const KEY_LAYOUT_LOCKED: &str = "obs_layout_locked";

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("failed to determine config directory")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait PrefBackend: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), PrefsError>;
    fn remove(&mut self, key: &str) -> Result<(), PrefsError>;
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: BTreeMap<String, String>,
}

impl PrefBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), PrefsError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PrefsError> {
        self.values.remove(key);
        Ok(())
    }
}

/// A JSON object of string values, rewritten whole on every change.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileBackend {
    pub fn default_path() -> Result<PathBuf, PrefsError> {
        let dirs = ProjectDirs::from("", "", "scenedeck").ok_or(PrefsError::NoConfigDir)?;
        Ok(dirs.config_dir().join("prefs.json"))
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PrefsError> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), PrefsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&self.values)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PrefBackend for FileBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), PrefsError> {
        let previous = self.values.insert(key.to_string(), value);
        if let Err(e) = self.persist() {
            match previous {
                Some(v) => self.values.insert(key.to_string(), v),
                None => self.values.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PrefsError> {
        if self.values.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

/// Typed access to the stored keys. Values are plain strings; lists are JSON encoded.
pub struct PreferenceStore {
    backend: Box<dyn PrefBackend>,
}

impl PreferenceStore {
    pub fn new(backend: impl PrefBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::default())
    }

    pub fn open_file(path: impl Into<PathBuf>) -> Result<Self, PrefsError> {
        Ok(Self::new(FileBackend::open(path)?))
    }

    /// `None` until a non-empty host has been saved.
    pub fn connection_settings(&self) -> Option<ConnectionSettings> {
        let host = self.backend.get(KEY_HOST).filter(|h| !h.trim().is_empty())?;
        Some(ConnectionSettings::new(
            host,
            self.backend.get(KEY_PORT).unwrap_or_default(),
            self.backend.get(KEY_PASSWORD).unwrap_or_default(),
        ))
    }

    pub fn set_connection_settings(&mut self, settings: &ConnectionSettings) -> Result<(), PrefsError> {
        self.backend.set(KEY_HOST, settings.host.clone())?;
        self.backend.set(KEY_PORT, settings.port.clone())?;
        self.backend.set(KEY_PASSWORD, settings.password.to_string())
    }

    /// `None` when no order has ever been saved.
    pub fn scene_order(&self) -> Option<Vec<String>> {
        self.get_json(KEY_SCENE_ORDER)
    }

    pub fn set_scene_order(&mut self, order: &[String]) -> Result<(), PrefsError> {
        self.backend.set(KEY_SCENE_ORDER, serde_json::to_string(order)?)
    }

    pub fn custom_sounds(&self) -> Vec<CustomSound> {
        self.get_json(KEY_CUSTOM_SOUNDS).unwrap_or_default()
    }

    pub fn set_custom_sounds(&mut self, sounds: &[CustomSound]) -> Result<(), PrefsError> {
        self.backend.set(KEY_CUSTOM_SOUNDS, serde_json::to_string(sounds)?)
    }

    pub fn layout_locked(&self) -> bool {
        self.backend.get(KEY_LAYOUT_LOCKED).as_deref() == Some("true")
    }

    pub fn set_layout_locked(&mut self, locked: bool) -> Result<(), PrefsError> {
        self.backend.set(KEY_LAYOUT_LOCKED, locked.to_string())
    }

    pub fn clear(&mut self, key: &str) -> Result<(), PrefsError> {
        self.backend.remove(key)
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.backend.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "ignoring unreadable preference");
                None
            }
        }
    }
}
