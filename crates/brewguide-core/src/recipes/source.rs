//! Recipe sources.
//!
//! A source hands the catalog a list of recipes or fails. The built-in
//! table is compiled in; user recipes live in `recipes.toml` in the data
//! directory; remote recipes come from [`super::sample_api`].

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::storage::data_dir;

use super::{AnyRecipe, MultiTaskRecipe, Recipe};

const BUILTIN_RECIPES: &str = include_str!("../../data/builtin_recipes.toml");

/// Anything the catalog can refresh itself from.
pub trait RecipeSource {
    /// Short label used in log lines.
    fn name(&self) -> &str;

    fn fetch_recipes(&self) -> impl Future<Output = Result<Vec<AnyRecipe>, CatalogError>> + Send;
}

/// On-disk catalog layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub multi_task: Vec<MultiTaskRecipe>,
}

impl CatalogFile {
    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(content)?)
    }

    pub fn into_recipes(self) -> Vec<AnyRecipe> {
        self.recipes
            .into_iter()
            .map(AnyRecipe::Simple)
            .chain(self.multi_task.into_iter().map(AnyRecipe::MultiTask))
            .collect()
    }
}

/// The compiled-in recipe table.
#[derive(Debug, Clone, Default)]
pub struct StaticSource;

impl StaticSource {
    pub fn builtin_file() -> Result<CatalogFile, CatalogError> {
        CatalogFile::parse(BUILTIN_RECIPES)
    }
}

impl RecipeSource for StaticSource {
    fn name(&self) -> &str {
        "builtin"
    }

    async fn fetch_recipes(&self) -> Result<Vec<AnyRecipe>, CatalogError> {
        Ok(Self::builtin_file()?.into_recipes())
    }
}

/// User recipes stored as TOML.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// `<data_dir>/recipes.toml`.
    pub fn open() -> Result<Self, CatalogError> {
        let dir = data_dir().map_err(|e| CatalogError::DataDir(e.to_string()))?;
        Ok(Self {
            path: dir.join("recipes.toml"),
        })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file reads as an empty catalog; a malformed one is an error.
    pub fn load(&self) -> Result<CatalogFile, CatalogError> {
        if !self.path.exists() {
            return Ok(CatalogFile::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        CatalogFile::parse(&content)
    }

    pub fn save(&self, file: &CatalogFile) -> Result<(), CatalogError> {
        let content = toml::to_string_pretty(file)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl RecipeSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_recipes(&self) -> Result<Vec<AnyRecipe>, CatalogError> {
        Ok(self.load()?.into_recipes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_parses() {
        let file = StaticSource::builtin_file().unwrap();
        assert!(!file.recipes.is_empty());
        assert!(!file.multi_task.is_empty());
        let meatballs = &file.multi_task[0];
        assert!(meatballs.has_block("sauce"));
        assert!(meatballs.has_block("assembly"));
    }

    #[tokio::test]
    async fn missing_file_is_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::with_path(dir.path().join("recipes.toml"));
        let recipes = source.fetch_recipes().await.unwrap();
        assert!(recipes.is_empty());
    }

    #[tokio::test]
    async fn file_roundtrip_keeps_both_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::with_path(dir.path().join("recipes.toml"));
        source.save(&StaticSource::builtin_file().unwrap()).unwrap();

        let recipes = source.fetch_recipes().await.unwrap();
        assert!(recipes.iter().any(|r| matches!(r, AnyRecipe::Simple(_))));
        assert!(recipes.iter().any(|r| matches!(r, AnyRecipe::MultiTask(_))));
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.toml");
        std::fs::write(&path, "[[recipes]]\nid = \"not a number\"").unwrap();
        let source = FileSource::with_path(path);
        assert!(matches!(
            source.fetch_recipes().await,
            Err(CatalogError::Parse(_))
        ));
    }
}
