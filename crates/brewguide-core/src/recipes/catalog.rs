//! The recipe catalog.
//!
//! Holds the last known good set of simple and multi-block recipes.
//! Refreshing from a source replaces each shape only when the source
//! delivered recipes of that shape; failures leave the catalog untouched.

use std::collections::HashSet;

use crate::error::CatalogError;
use crate::i18n::Language;

use super::sample_api::ImageProvider;
use super::source::{RecipeSource, StaticSource};
use super::validate::{validate_multi_task, validate_recipe};
use super::{AnyRecipe, MultiTaskRecipe, Recipe};

/// Outcome of [`RecipeCatalog::refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Recipes were replaced. `rejected` counts invalid recipes dropped.
    Updated { simple: usize, multi_task: usize, rejected: usize },
    /// The source answered with nothing usable; the catalog is unchanged.
    Empty,
    /// The source failed; the catalog is unchanged.
    Unavailable,
}

#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
    multi_task: Vec<MultiTaskRecipe>,
}

impl RecipeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog seeded from the compiled-in table. The table must validate.
    pub fn builtin() -> Result<Self, CatalogError> {
        let file = StaticSource::builtin_file()?;
        Self::from_recipes(file.into_recipes())
    }

    /// Strict constructor: any invalid or duplicate recipe is an error.
    pub fn from_recipes(recipes: Vec<AnyRecipe>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        let mut seen = HashSet::new();
        for recipe in recipes {
            if !seen.insert(recipe.id()) {
                return Err(CatalogError::DuplicateRecipe(recipe.id()));
            }
            check(&recipe)?;
            catalog.push(recipe);
        }
        Ok(catalog)
    }

    fn push(&mut self, recipe: AnyRecipe) {
        match recipe {
            AnyRecipe::Simple(r) => self.recipes.push(r),
            AnyRecipe::MultiTask(r) => self.multi_task.push(r),
        }
    }

    /// Merge recipes loaded from a secondary source (e.g. the user file).
    /// Invalid recipes and ids already present are skipped with a warning.
    pub fn extend(&mut self, recipes: Vec<AnyRecipe>) -> usize {
        let mut added = 0;
        for recipe in recipes {
            if self.get(recipe.id()).is_some() {
                tracing::warn!(recipe_id = recipe.id(), "skipping recipe with duplicate id");
                continue;
            }
            if let Err(e) = check(&recipe) {
                tracing::warn!(error = %e, "skipping invalid recipe");
                continue;
            }
            self.push(recipe);
            added += 1;
        }
        added
    }

    /// Pull from `source`, keeping the current contents on failure.
    pub async fn refresh<S: RecipeSource>(&mut self, source: &S) -> RefreshOutcome {
        let fetched = match source.fetch_recipes().await {
            Ok(recipes) => recipes,
            Err(e) => {
                tracing::warn!(source = source.name(), error = %e, "recipe source unavailable, keeping last known catalog");
                return RefreshOutcome::Unavailable;
            }
        };

        let mut simple = Vec::new();
        let mut multi_task = Vec::new();
        let mut rejected = 0;
        let mut seen = HashSet::new();
        for recipe in fetched {
            if !seen.insert(recipe.id()) {
                rejected += 1;
                continue;
            }
            if let Err(e) = check(&recipe) {
                tracing::warn!(source = source.name(), error = %e, "rejecting malformed recipe");
                rejected += 1;
                continue;
            }
            match recipe {
                AnyRecipe::Simple(r) => simple.push(r),
                AnyRecipe::MultiTask(r) => multi_task.push(r),
            }
        }

        // A shape the source did not deliver is kept, and so are its ids.
        if multi_task.is_empty() {
            let kept: HashSet<u32> = self.multi_task.iter().map(|r| r.id).collect();
            let before = simple.len();
            simple.retain(|r| !kept.contains(&r.id));
            rejected += before - simple.len();
        }
        if simple.is_empty() {
            let kept: HashSet<u32> = self.recipes.iter().map(|r| r.id).collect();
            let before = multi_task.len();
            multi_task.retain(|r| !kept.contains(&r.id));
            rejected += before - multi_task.len();
        }
        if rejected > 0 {
            tracing::warn!(source = source.name(), rejected, "some fetched recipes were dropped");
        }

        if simple.is_empty() && multi_task.is_empty() {
            tracing::info!(source = source.name(), rejected, "source returned no usable recipes");
            return RefreshOutcome::Empty;
        }

        let outcome = RefreshOutcome::Updated {
            simple: simple.len(),
            multi_task: multi_task.len(),
            rejected,
        };
        if !simple.is_empty() {
            self.recipes = simple;
        }
        if !multi_task.is_empty() {
            self.multi_task = multi_task;
        }
        tracing::info!(source = source.name(), ?outcome, "catalog refreshed");
        outcome
    }

    /// Look up a photo for every simple recipe whose image is not a URL
    /// (an emoji or nothing). Returns how many images were replaced.
    pub async fn enrich_images(&mut self, provider: &ImageProvider, language: Language) -> usize {
        let mut replaced = 0;
        for recipe in self.recipes.iter_mut().filter(|r| !r.image.starts_with("http")) {
            if let Some(url) = provider.find(&recipe.title, language).await {
                recipe.image = url;
                replaced += 1;
            }
        }
        tracing::debug!(replaced, "recipe images enriched");
        replaced
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn multi_task_recipes(&self) -> &[MultiTaskRecipe] {
        &self.multi_task
    }

    pub fn len(&self) -> usize {
        self.recipes.len() + self.multi_task.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Simple recipes first, then multi-block ones.
    pub fn all(&self) -> Vec<AnyRecipe> {
        self.recipes
            .iter()
            .cloned()
            .map(AnyRecipe::Simple)
            .chain(self.multi_task.iter().cloned().map(AnyRecipe::MultiTask))
            .collect()
    }

    pub fn get(&self, id: u32) -> Option<AnyRecipe> {
        self.recipe(id)
            .cloned()
            .map(AnyRecipe::Simple)
            .or_else(|| self.multi_task_recipe(id).cloned().map(AnyRecipe::MultiTask))
    }

    pub fn recipe(&self, id: u32) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn multi_task_recipe(&self, id: u32) -> Option<&MultiTaskRecipe> {
        self.multi_task.iter().find(|r| r.id == id)
    }
}

fn check(recipe: &AnyRecipe) -> Result<(), CatalogError> {
    let result = match recipe {
        AnyRecipe::Simple(r) => validate_recipe(r),
        AnyRecipe::MultiTask(r) => validate_multi_task(r),
    };
    result.map_err(|reason| CatalogError::InvalidRecipe {
        recipe_id: recipe.id(),
        reason,
    })
}
