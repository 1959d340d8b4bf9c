//! Configuration resolution
//!
//! The settings subsystem persists a small JSON record; this module turns it
//! into an immutable [`Configuration`] snapshot. Resolution never fails: a
//! missing or corrupt record yields the defaults, and a missing key is left for
//! the backend selector to report.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Environment variables consulted (in order) for the managed backend key.
const ENV_API_KEYS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendMode {
    #[default]
    #[serde(rename = "official")]
    Managed,
    #[serde(rename = "proxy")]
    Proxy,
}

impl BackendMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendMode::Managed => "official",
            BackendMode::Proxy => "proxy",
        }
    }
}

/// The persisted settings record, field names as the settings UI writes them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredSettings {
    pub model: String,
    pub api_mode: BackendMode,
    pub user_api_key: String,
    pub proxy_url: String,
    pub proxy_api_key: String,
}

/// Resolved snapshot used for exactly one gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub model: String,
    pub backend_mode: BackendMode,
    pub managed_api_key: String,
    pub proxy_endpoint: String,
    pub proxy_api_key: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            backend_mode: BackendMode::Managed,
            managed_api_key: String::new(),
            proxy_endpoint: String::new(),
            proxy_api_key: String::new(),
        }
    }
}

impl Configuration {
    /// Whether the credential path of the active mode is usable.
    pub fn has_credentials(&self) -> bool {
        match self.backend_mode {
            BackendMode::Managed => !self.managed_api_key.trim().is_empty(),
            BackendMode::Proxy => {
                !self.proxy_api_key.trim().is_empty() && !self.proxy_endpoint.trim().is_empty()
            }
        }
    }
}

/// Source of the raw persisted settings blob.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Option<String>;
}

/// Settings stored as a JSON file on disk.
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Some(contents),
            Err(e) => {
                tracing::debug!("No settings at {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

/// In-process settings; clones share the same record.
#[derive(Clone, Default)]
pub struct MemorySettingsStore {
    record: Arc<Mutex<Option<String>>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(self, settings: &StoredSettings) -> Self {
        self.save(settings);
        self
    }

    pub fn save(&self, settings: &StoredSettings) {
        match serde_json::to_string(settings) {
            Ok(json) => self.save_raw(json),
            Err(e) => tracing::warn!("Failed to serialize settings: {}", e),
        }
    }

    pub fn save_raw(&self, raw: impl Into<String>) {
        if let Ok(mut record) = self.record.lock() {
            *record = Some(raw.into());
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Option<String> {
        self.record.lock().ok().and_then(|record| record.clone())
    }
}

pub struct ConfigResolver {
    store: Box<dyn SettingsStore>,
    env_api_key: Option<String>,
}

impl ConfigResolver {
    pub fn new(store: Box<dyn SettingsStore>, env_api_key: Option<String>) -> Self {
        Self { store, env_api_key }
    }

    /// Build a resolver whose managed-mode key falls back to the environment.
    pub fn from_env(store: Box<dyn SettingsStore>) -> Self {
        dotenvy::dotenv().ok();

        let env_api_key = ENV_API_KEYS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty());

        Self::new(store, env_api_key)
    }

    /// Read the latest persisted snapshot.
    pub fn resolve(&self) -> Configuration {
        let settings = self
            .store
            .load()
            .and_then(|raw| match serde_json::from_str::<StoredSettings>(&raw) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    tracing::warn!("Failed to load settings, using defaults: {}", e);
                    None
                }
            })
            .unwrap_or_default();

        let model = match settings.model.trim() {
            "" => DEFAULT_MODEL.to_string(),
            model => model.to_string(),
        };

        let config = match settings.api_mode {
            BackendMode::Managed => Configuration {
                model,
                backend_mode: BackendMode::Managed,
                managed_api_key: match settings.user_api_key.trim() {
                    "" => self.env_api_key.clone().unwrap_or_default(),
                    key => key.to_string(),
                },
                proxy_endpoint: String::new(),
                proxy_api_key: String::new(),
            },
            BackendMode::Proxy => Configuration {
                model,
                backend_mode: BackendMode::Proxy,
                managed_api_key: String::new(),
                proxy_endpoint: settings.proxy_url.trim().to_string(),
                proxy_api_key: settings.proxy_api_key.trim().to_string(),
            },
        };

        if !config.has_credentials() {
            tracing::warn!(
                "No API key found for {} mode. Please configure it in settings.",
                config.backend_mode.as_str()
            );
        }

        config
    }
}
