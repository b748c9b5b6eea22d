//! Language and theme preferences, and key lookup.

use brewguide_core::i18n::{Locales, Localization};
use brewguide_core::{Config, Language, ThemeName};
use clap::Subcommand;

use crate::common;

#[derive(Subcommand)]
pub enum LangAction {
    /// Print the current language code
    Get,
    /// Store a new interface language
    Set {
        /// Language code (ru, en, uk, kk, de, fr, fi, sv)
        code: String,
    },
    /// List supported languages
    List,
}

#[derive(Subcommand)]
pub enum ThemeAction {
    /// Print the current theme
    Get,
    /// Store a new theme
    Set {
        /// Theme name (classic, coffee)
        name: String,
    },
    /// List available themes
    List,
}

pub fn run_lang(action: LangAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut settings = common::load_settings(&config);
    match action {
        LangAction::Get => println!("{}", settings.language()),
        LangAction::Set { code } => {
            let language: Language = code.parse()?;
            settings.set_language(language)?;
            println!("{} ({})", language, language.native_name());
        }
        LangAction::List => {
            let current = settings.language();
            for language in Language::ALL {
                let marker = if language == current { "*" } else { " " };
                println!("{marker} {}  {}", language.code(), language.native_name());
            }
        }
    }
    Ok(())
}

pub fn run_theme(action: ThemeAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut settings = common::load_settings(&config);
    match action {
        ThemeAction::Get => println!("{}", settings.theme()),
        ThemeAction::Set { name } => {
            let theme: ThemeName = name.parse()?;
            settings.set_theme(theme)?;
            println!("{}", settings.theme_class());
        }
        ThemeAction::List => {
            let current = settings.theme();
            for theme in ThemeName::ALL {
                let marker = if theme == current { "*" } else { " " };
                println!("{marker} {theme}");
            }
        }
    }
    Ok(())
}

pub fn translate(key: &str, lang: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let language = match lang {
        Some(code) => code.parse::<Language>()?,
        None => common::load_settings(&Config::load_or_default()).language(),
    };
    println!("{}", Locales::embedded().translate(key, language));
    Ok(())
}
