//! Interface translations.
//!
//! Every supported language ships a TOML table compiled into the binary.
//! Keys are dotted paths (`recipe.backToRecipes`) into those tables.
//! Lookups never fail: an unknown language falls back to the default
//! table and a missing key comes back verbatim.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
    Uk,
    Kk,
    De,
    Fr,
    Fi,
    Sv,
}

/// How a language inflects nouns after a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralRule {
    /// one / few / many (East Slavic and Kazakh tables).
    OneFewMany,
    /// one / other.
    OneOther,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::Ru,
        Language::En,
        Language::Uk,
        Language::Kk,
        Language::De,
        Language::Fr,
        Language::Fi,
        Language::Sv,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
            Language::Uk => "uk",
            Language::Kk => "kk",
            Language::De => "de",
            Language::Fr => "fr",
            Language::Fi => "fi",
            Language::Sv => "sv",
        }
    }

    pub fn native_name(self) -> &'static str {
        match self {
            Language::Ru => "Русский",
            Language::En => "English",
            Language::Uk => "Українська",
            Language::Kk => "Қазақ",
            Language::De => "Deutsch",
            Language::Fr => "Français",
            Language::Fi => "Suomi",
            Language::Sv => "Svenska",
        }
    }

    pub fn plural_rule(self) -> PluralRule {
        match self {
            Language::Ru | Language::Uk | Language::Kk => PluralRule::OneFewMany,
            _ => PluralRule::OneOther,
        }
    }

    /// Parse a locale tag such as `ru`, `en-US` or `uk_UA.UTF-8`.
    /// Only the primary subtag is considered.
    pub fn from_code(raw: &str) -> Option<Language> {
        let primary = raw
            .trim()
            .split(['-', '_', '.', '@'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        Language::ALL.into_iter().find(|l| l.code() == primary)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s).ok_or_else(|| format!("unsupported language: {s}"))
    }
}

/// Key lookup seam so the session can be tested with a stub table.
pub trait Localization: Send {
    fn translate(&self, key: &str, lang: Language) -> String;
}

fn embedded_source(lang: Language) -> &'static str {
    match lang {
        Language::Ru => include_str!("../../locales/ru.toml"),
        Language::En => include_str!("../../locales/en.toml"),
        Language::Uk => include_str!("../../locales/uk.toml"),
        Language::Kk => include_str!("../../locales/kk.toml"),
        Language::De => include_str!("../../locales/de.toml"),
        Language::Fr => include_str!("../../locales/fr.toml"),
        Language::Fi => include_str!("../../locales/fi.toml"),
        Language::Sv => include_str!("../../locales/sv.toml"),
    }
}

/// Translation tables for every [`Language`].
#[derive(Debug, Clone)]
pub struct Locales {
    tables: HashMap<Language, toml::Table>,
}

impl Locales {
    /// Tables compiled into the binary. A table that fails to parse is
    /// logged and left empty.
    pub fn embedded() -> Self {
        let tables = Language::ALL
            .into_iter()
            .map(|lang| {
                let table = toml::from_str::<toml::Table>(embedded_source(lang)).unwrap_or_else(|e| {
                    tracing::error!(lang = %lang, error = %e, "locale table is malformed");
                    toml::Table::new()
                });
                (lang, table)
            })
            .collect();
        Self { tables }
    }

    pub fn from_tables(tables: HashMap<Language, toml::Table>) -> Self {
        Self { tables }
    }

    fn lookup(&self, key: &str, lang: Language) -> Option<&str> {
        let table = self
            .tables
            .get(&lang)
            .or_else(|| self.tables.get(&Language::default()))?;
        let mut parts = key.split('.');
        let mut value = table.get(parts.next()?)?;
        for part in parts {
            value = value.as_table()?.get(part)?;
        }
        value.as_str()
    }
}

impl Default for Locales {
    fn default() -> Self {
        Self::embedded()
    }
}

impl Localization for Locales {
    fn translate(&self, key: &str, lang: Language) -> String {
        match self.lookup(key, lang) {
            Some(text) => text.to_string(),
            None => {
                tracing::debug!(key, lang = %lang, "translation key not found");
                key.to_string()
            }
        }
    }
}

/// Pick the inflected form for `count`.
///
/// `few` is ignored by one/other languages, which use `many` for every
/// count except one.
pub fn pluralize<'a>(lang: Language, count: u64, one: &'a str, few: &'a str, many: &'a str) -> &'a str {
    match lang.plural_rule() {
        PluralRule::OneOther => {
            if count == 1 {
                one
            } else {
                many
            }
        }
        PluralRule::OneFewMany => {
            if (11..=19).contains(&(count % 100)) {
                return many;
            }
            match count % 10 {
                1 => one,
                2..=4 => few,
                _ => many,
            }
        }
    }
}

/// `"<count> <noun>"` where the noun comes from `base`, `base2` and
/// `base5` keys (e.g. `recipes.steps`).
pub fn count_label(l10n: &dyn Localization, lang: Language, count: u64, base: &str) -> String {
    let one = l10n.translate(base, lang);
    let few = l10n.translate(&format!("{base}2"), lang);
    let many = l10n.translate(&format!("{base}5"), lang);
    format!("{count} {}", pluralize(lang, count, &one, &few, &many))
}
