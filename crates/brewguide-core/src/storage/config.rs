//! TOML-based application configuration.
//!
//! Stores:
//! - Catalog sources (remote sample API, user recipe file)
//! - Translation endpoint for remote recipe text
//! - Photo search for recipes without a picture
//! - Interface defaults (language, theme)
//! - Session ticker settings
//!
//! Configuration is stored at `~/.config/brewguide/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::i18n::Language;
use crate::recipes::sample_api::{DEFAULT_API_URL, DEFAULT_IMAGE_URL, DEFAULT_LIMIT};
use crate::settings::ThemeName;

/// Where recipes come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Merge recipes from the sample API on refresh.
    #[serde(default)]
    pub fetch_remote: bool,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Extra recipes file. `<data_dir>/recipes.toml` when unset.
    #[serde(default)]
    pub recipes_file: Option<String>,
}

/// LibreTranslate-compatible endpoint used for remote recipe text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslateConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Pixabay photo search. Disabled until an API key is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "default_image_url")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "default_theme")]
    pub default_theme: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Ring the terminal bell when a timer runs out.
    #[serde(default = "default_true")]
    pub bell: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/brewguide/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub timer: TimerConfig,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_image_url() -> String {
    DEFAULT_IMAGE_URL.into()
}
fn default_limit() -> usize {
    DEFAULT_LIMIT
}
fn default_language() -> String {
    Language::default().code().into()
}
fn default_theme() -> String {
    ThemeName::default().as_str().into()
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            fetch_remote: false,
            api_url: default_api_url(),
            limit: default_limit(),
            recipes_file: None,
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            endpoint: default_image_url(),
            api_key: None,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            default_theme: default_theme(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            bell: true,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parents, leaf) = match key.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        for part in parents.into_iter().flat_map(|p| p.split('.')) {
            current = current.get_mut(part).ok_or_else(unknown)?;
        }
        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => serde_json::Value::Number(
                value
                    .parse::<u64>()
                    .map_err(|e| invalid(format!("cannot parse '{value}' as number: {e}")))?
                    .into(),
            ),
            serde_json::Value::Object(_) => return Err(invalid("cannot replace a whole section".into())),
            // Optional strings serialize as null when unset.
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// Reject values that deserialize fine but are meaningless.
    fn validate(&self) -> Result<(), ConfigError> {
        if Language::from_code(&self.ui.default_language).is_none() {
            return Err(ConfigError::InvalidValue {
                key: "ui.default_language".into(),
                message: format!("unsupported language '{}'", self.ui.default_language),
            });
        }
        if self.ui.default_theme.parse::<ThemeName>().is_err() {
            return Err(ConfigError::InvalidValue {
                key: "ui.default_theme".into(),
                message: format!("unknown theme '{}'", self.ui.default_theme),
            });
        }
        if let Err(e) = url::Url::parse(&self.catalog.api_url) {
            return Err(ConfigError::InvalidValue {
                key: "catalog.api_url".into(),
                message: e.to_string(),
            });
        }
        if let Err(e) = url::Url::parse(&self.images.endpoint) {
            return Err(ConfigError::InvalidValue {
                key: "images.endpoint".into(),
                message: e.to_string(),
            });
        }
        if self.timer.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timer.tick_interval_ms".into(),
                message: "must be positive".into(),
            });
        }
        Ok(())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()
            .map_err(|e| ConfigError::DataDir(e.to_string()))?
            .join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                tracing::debug!(path = %path.display(), "config loaded");
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Every leaf as `(dotted key, value)`, in section order.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    /// Change a value in memory. The key must already exist.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and persist. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    pub fn language(&self) -> Language {
        Language::from_code(&self.ui.default_language).unwrap_or_default()
    }

    pub fn theme(&self) -> ThemeName {
        self.ui.default_theme.parse().unwrap_or_default()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }
}
