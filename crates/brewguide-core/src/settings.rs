//! Interface language and theme.
//!
//! Language resolution order:
//! 1. stored preference (`app_language`)
//! 2. locale reported by the host
//! 3. process locale (`LC_ALL`, `LC_MESSAGES`, `LANG`)
//! 4. [`Language::default`]
//!
//! Each step skips values that do not name a supported language.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PreferenceError;
use crate::host::HostCapabilities;
use crate::i18n::Language;
use crate::storage::preferences::{PreferenceStore, LANGUAGE_KEY, THEME_KEY};
use crate::storage::Config;

const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    Classic,
    #[default]
    Coffee,
}

impl ThemeName {
    pub const ALL: [ThemeName; 2] = [ThemeName::Classic, ThemeName::Coffee];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeName::Classic => "classic",
            ThemeName::Coffee => "coffee",
        }
    }

    pub fn css_class(self) -> String {
        format!("theme-{}", self.as_str())
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "classic" => Ok(ThemeName::Classic),
            "coffee" => Ok(ThemeName::Coffee),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

pub fn stored_language(prefs: &dyn PreferenceStore) -> Option<Language> {
    match prefs.get(LANGUAGE_KEY) {
        Ok(value) => value.as_deref().and_then(Language::from_code),
        Err(e) => {
            tracing::warn!(error = %e, "could not read stored language");
            None
        }
    }
}

pub fn host_language(host: &dyn HostCapabilities) -> Option<Language> {
    host.locale().as_deref().and_then(Language::from_code)
}

/// First supported language among the locale variables, read through
/// `lookup`.
pub fn env_language_with<F>(lookup: F) -> Option<Language>
where
    F: Fn(&str) -> Option<String>,
{
    LOCALE_VARS
        .iter()
        .filter_map(|var| lookup(var))
        .find_map(|value| Language::from_code(&value))
}

pub fn env_language() -> Option<Language> {
    env_language_with(|var| std::env::var(var).ok())
}

pub fn resolve_language(
    prefs: &dyn PreferenceStore,
    host: &dyn HostCapabilities,
    env: Option<Language>,
) -> Language {
    stored_language(prefs)
        .or_else(|| host_language(host))
        .or(env)
        .unwrap_or_default()
}

pub fn stored_theme(prefs: &dyn PreferenceStore) -> Option<ThemeName> {
    prefs
        .get(THEME_KEY)
        .ok()
        .flatten()
        .and_then(|s| s.parse().ok())
}

/// Current language and theme, written through to the preference store.
pub struct Settings {
    prefs: Box<dyn PreferenceStore>,
    language: Language,
    theme: ThemeName,
}

impl Settings {
    pub fn load(prefs: Box<dyn PreferenceStore>, host: &dyn HostCapabilities) -> Self {
        Self::load_with_env(prefs, host, env_language())
    }

    pub fn load_with_env(
        prefs: Box<dyn PreferenceStore>,
        host: &dyn HostCapabilities,
        env: Option<Language>,
    ) -> Self {
        let language = resolve_language(prefs.as_ref(), host, env);
        let theme = stored_theme(prefs.as_ref()).unwrap_or_default();
        tracing::debug!(%language, %theme, "settings loaded");
        Self {
            prefs,
            language,
            theme,
        }
    }

    /// Like [`Settings::load`], with the configured interface defaults
    /// taking the place of the built-in ones.
    pub fn from_config(
        prefs: Box<dyn PreferenceStore>,
        host: &dyn HostCapabilities,
        config: &Config,
    ) -> Self {
        let env = env_language().or(Some(config.language()));
        let language = resolve_language(prefs.as_ref(), host, env);
        let theme = stored_theme(prefs.as_ref()).unwrap_or(config.theme());
        tracing::debug!(%language, %theme, "settings loaded");
        Self {
            prefs,
            language,
            theme,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Switch language and persist it. The in-memory value changes even
    /// when the write fails.
    pub fn set_language(&mut self, language: Language) -> Result<(), PreferenceError> {
        self.language = language;
        self.prefs.set(LANGUAGE_KEY, language.code())
    }

    pub fn theme(&self) -> ThemeName {
        self.theme
    }

    pub fn set_theme(&mut self, theme: ThemeName) -> Result<(), PreferenceError> {
        self.theme = theme;
        self.prefs.set(THEME_KEY, theme.as_str())
    }

    pub fn theme_class(&self) -> String {
        self.theme.css_class()
    }

    pub fn preferences(&self) -> &dyn PreferenceStore {
        self.prefs.as_ref()
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("language", &self.language)
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{NoHost, UserProfile};
    use crate::storage::MemoryPreferences;

    struct LocaleHost(Option<&'static str>);

    impl HostCapabilities for LocaleHost {
        fn user(&self) -> Option<UserProfile> {
            None
        }

        fn locale(&self) -> Option<String> {
            self.0.map(String::from)
        }
    }

    #[test]
    fn stored_preference_wins() {
        let prefs = MemoryPreferences::new().with(LANGUAGE_KEY, "kk");
        let lang = resolve_language(&prefs, &LocaleHost(Some("en")), Some(Language::De));
        assert_eq!(lang, Language::Kk);
    }

    #[test]
    fn host_locale_beats_environment() {
        let prefs = MemoryPreferences::new();
        let lang = resolve_language(&prefs, &LocaleHost(Some("uk-UA")), Some(Language::De));
        assert_eq!(lang, Language::Uk);
    }

    #[test]
    fn environment_used_when_host_is_silent() {
        let prefs = MemoryPreferences::new().with(LANGUAGE_KEY, "klingon");
        let lang = resolve_language(&prefs, &LocaleHost(Some("pt")), Some(Language::Fi));
        assert_eq!(lang, Language::Fi);
    }

    #[test]
    fn falls_back_to_default() {
        let prefs = MemoryPreferences::new();
        assert_eq!(resolve_language(&prefs, &LocaleHost(None), None), Language::Ru);
    }

    #[test]
    fn env_lookup_skips_unsupported_values() {
        let lang = env_language_with(|var| match var {
            "LC_ALL" => Some("C".into()),
            "LC_MESSAGES" => None,
            "LANG" => Some("sv_SE.UTF-8".into()),
            _ => None,
        });
        assert_eq!(lang, Some(Language::Sv));
        assert_eq!(env_language_with(|_| None), None);
    }

    #[test]
    fn theme_defaults_to_coffee_and_persists() {
        let mut settings =
            Settings::load_with_env(Box::new(MemoryPreferences::new()), &NoHost, None);
        assert_eq!(settings.theme(), ThemeName::Coffee);
        assert_eq!(settings.theme_class(), "theme-coffee");
        assert_eq!(settings.language(), Language::Ru);

        settings.set_theme(ThemeName::Classic).unwrap();
        settings.set_language(Language::En).unwrap();
        assert_eq!(settings.theme_class(), "theme-classic");
        assert_eq!(
            settings.preferences().get(THEME_KEY).unwrap().as_deref(),
            Some("classic")
        );
        assert_eq!(
            settings.preferences().get(LANGUAGE_KEY).unwrap().as_deref(),
            Some("en")
        );
    }

    #[test]
    fn config_defaults_fill_the_gaps() {
        let mut config = Config::default();
        config.apply("ui.default_theme", "classic").unwrap();
        let settings =
            Settings::from_config(Box::new(MemoryPreferences::new()), &LocaleHost(Some("fr")), &config);
        assert_eq!(settings.theme(), ThemeName::Classic);
        assert_eq!(settings.language(), Language::Fr);

        let prefs = MemoryPreferences::new().with(THEME_KEY, "coffee");
        let settings = Settings::from_config(Box::new(prefs), &LocaleHost(None), &config);
        assert_eq!(settings.theme(), ThemeName::Coffee);
    }

    #[test]
    fn unknown_stored_theme_is_ignored() {
        let prefs = MemoryPreferences::new().with(THEME_KEY, "neon");
        assert_eq!(stored_theme(&prefs), None);
        assert!("neon".parse::<ThemeName>().is_err());
    }
}
