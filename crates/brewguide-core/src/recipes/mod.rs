//! Recipe model, catalog and sources.
//!
//! Two recipe shapes exist: simple recipes with a linear step list and
//! multi-block recipes whose blocks gate on each other.

pub mod block;
pub mod catalog;
pub mod recipe;
pub mod sample_api;
pub mod source;
pub mod validate;

pub use block::{
    block_step_action_id, BlockStep, CookingBlock, MultiTaskRecipe, NextAction, OnCompletion,
    ScheduleAction, ScheduleTransition, TimerKind, TransitionKind,
};
pub use catalog::{RecipeCatalog, RefreshOutcome};
pub use recipe::{AnyRecipe, Recipe, RecipeIngredient, RecipeKind, Step, StepKind};
pub use sample_api::{ImageProvider, SampleApiSource, Translator};
pub use source::{CatalogFile, FileSource, RecipeSource, StaticSource};
