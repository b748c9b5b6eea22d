//! # Brewguide Core Library
//!
//! Step-by-step cooking sessions for simple and multi-block recipes.
//! Front ends (the `brewguide` CLI, a messenger web view) are thin layers
//! that feed commands and a one-second tick into [`SessionController`]
//! and render the [`Event`]s it returns.
//!
//! ## Architecture
//!
//! - **Timer Engine**: tick-driven countdowns keyed by action id; the
//!   caller invokes `tick()` once per second
//! - **Step Tracker**: which actions the user has confirmed
//! - **Resolver**: which blocks of a multi-block recipe may start
//! - **Session**: the navigation state machine tying the above together
//! - **Recipes**: built-in TOML catalog, user file, remote sample API
//! - **Storage**: TOML configuration and SQLite-backed preferences
//!
//! ## Key Components
//!
//! - [`SessionController`]: navigation and progress for one user
//! - [`TimerEngine`]: countdown timers
//! - [`RecipeCatalog`]: validated recipe collection
//! - [`Config`]: application configuration management
//! - [`Localization`]: interface string lookup

pub mod error;
pub mod events;
pub mod host;
pub mod i18n;
pub mod progress;
pub mod recipes;
pub mod resolver;
pub mod session;
pub mod settings;
pub mod storage;
pub mod timer;

pub use error::{CatalogError, ConfigError, CoreError, InvalidRecipe, PreferenceError};
pub use events::{Event, EventBus, NotificationKind};
pub use host::{HostCapabilities, NoHost, UserProfile};
pub use i18n::{Language, Locales, Localization};
pub use progress::StepTracker;
pub use recipes::{AnyRecipe, MultiTaskRecipe, Recipe, RecipeCatalog, RecipeSource};
pub use session::{SessionController, SessionPhase};
pub use settings::{Settings, ThemeName};
pub use storage::{Config, MemoryPreferences, PreferenceStore, SqlitePreferences};
pub use timer::{TimerEngine, TimerState};
