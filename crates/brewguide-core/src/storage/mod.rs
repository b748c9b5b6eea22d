pub mod config;
pub mod preferences;

pub use config::Config;
pub use preferences::{MemoryPreferences, PreferenceStore, SqlitePreferences};

use std::path::PathBuf;

/// Returns `~/.config/brewguide[-dev]/` based on BREWGUIDE_ENV.
///
/// Set BREWGUIDE_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("BREWGUIDE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("brewguide-dev")
    } else {
        base_dir.join("brewguide")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
