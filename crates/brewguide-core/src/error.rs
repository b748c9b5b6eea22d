//! Core error types for brewguide-core.
//!
//! The session itself never fails: invalid transitions are no-ops and
//! unknown ids resolve to defaults. The errors below come from the edges
//! of the library -- loading catalogs, reading configuration and talking
//! to the preference database.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for brewguide-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Catalog loading or validation errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Preference store errors
    #[error("Preference store error: {0}")]
    Preferences(#[from] PreferenceError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading recipes from a source.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read/write recipes file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse recipes TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize recipes TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status} for {url}")]
    UpstreamStatus { url: String, status: u16 },

    #[error("Invalid recipe {recipe_id}: {reason}")]
    InvalidRecipe { recipe_id: u32, reason: InvalidRecipe },

    #[error("Duplicate recipe id {0}")]
    DuplicateRecipe(u32),

    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Structural problems found by recipe validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidRecipe {
    #[error("block id '{0}' is used more than once")]
    DuplicateBlock(String),

    #[error("block '{block}' depends on unknown block '{dependency}'")]
    UnknownDependency { block: String, dependency: String },

    #[error("block '{block}' schedules a transition to unknown block '{target}'")]
    UnknownTransitionTarget { block: String, target: String },

    #[error("fire level {level} is outside 1..=9")]
    FireLevelOutOfRange { level: u8 },

    #[error("dependency cycle through blocks {0:?}")]
    DependencyCycle(Vec<String>),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to access the data directory
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Preference store errors.
#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("Failed to open preference database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Preference query failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),

    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
