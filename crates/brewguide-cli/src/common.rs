//! Wiring shared by the commands: catalog, preferences, host.

use brewguide_core::host::HapticStyle;
use brewguide_core::recipes::{
    FileSource, ImageProvider, RefreshOutcome, SampleApiSource, Translator,
};
use brewguide_core::{
    Config, HostCapabilities, MemoryPreferences, PreferenceStore, RecipeCatalog, Settings,
    SqlitePreferences, UserProfile,
};

/// Terminal session: the user is whoever runs the process and there is
/// no device to vibrate. Reports no locale so the process locale decides.
#[derive(Debug, Clone, Default)]
pub struct TerminalHost {
    user: Option<UserProfile>,
    bell: bool,
}

impl TerminalHost {
    pub fn from_env(bell: bool) -> Self {
        let user = std::env::var("USER").ok().filter(|s| !s.is_empty()).map(|name| UserProfile {
            id: 0,
            first_name: name.clone(),
            last_name: None,
            username: Some(name),
            language_code: None,
        });
        Self { user, bell }
    }
}

impl HostCapabilities for TerminalHost {
    fn user(&self) -> Option<UserProfile> {
        self.user.clone()
    }

    fn haptic_pulse(&self, style: HapticStyle) {
        if self.bell && style == HapticStyle::Heavy {
            eprint!("\x07");
        }
    }
}

/// SQLite preferences, or an in-memory store when the database cannot be
/// opened.
pub fn open_preferences() -> Box<dyn PreferenceStore> {
    match SqlitePreferences::open() {
        Ok(prefs) => Box::new(prefs),
        Err(e) => {
            tracing::warn!(error = %e, "preferences unavailable, changes will not persist");
            Box::new(MemoryPreferences::new())
        }
    }
}

pub fn load_settings(config: &Config) -> Settings {
    let host = TerminalHost::from_env(config.timer.bell);
    Settings::from_config(open_preferences(), &host, config)
}

/// Built-in recipes, then the remote sample API when enabled, then the
/// user's recipe file. Recipes without a photo get one from Pixabay when
/// `images.api_key` is set.
pub async fn load_catalog(
    config: &Config,
    settings: &Settings,
) -> Result<RecipeCatalog, Box<dyn std::error::Error>> {
    let mut catalog = RecipeCatalog::builtin()?;

    if config.catalog.fetch_remote {
        let url = url::Url::parse(&config.catalog.api_url)?;
        let mut source = SampleApiSource::new(url, settings.language()).with_limit(config.catalog.limit);
        if let Some(endpoint) = config.translate.endpoint.as_deref() {
            let endpoint = url::Url::parse(endpoint)?;
            source = source.with_translator(Translator::new(endpoint, config.translate.api_key.clone()));
        }
        match catalog.refresh(&source).await {
            RefreshOutcome::Updated { simple, .. } => tracing::info!(simple, "remote recipes loaded"),
            other => tracing::warn!(outcome = ?other, "remote recipes not loaded"),
        }
    }

    let file = match config.catalog.recipes_file.as_deref() {
        Some(path) => FileSource::with_path(path),
        None => FileSource::open()?,
    };
    match file.load() {
        Ok(recipes) => {
            let added = catalog.extend(recipes.into_recipes());
            tracing::debug!(path = %file.path().display(), added, "user recipes merged");
        }
        Err(e) => tracing::warn!(path = %file.path().display(), error = %e, "user recipes skipped"),
    }

    if let Some(key) = config.images.api_key.as_deref().filter(|k| !k.is_empty()) {
        let endpoint = url::Url::parse(&config.images.endpoint)?;
        let provider = ImageProvider::new(endpoint, key);
        let replaced = catalog.enrich_images(&provider, settings.language()).await;
        tracing::info!(replaced, "recipe photos looked up");
    }

    Ok(catalog)
}
