//! Simple (linear) recipe definitions.

use serde::{Deserialize, Serialize};

use super::block::MultiTaskRecipe;

/// An ingredient shown on an ingredients step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,
    /// Quantity, when the recipe cares about it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    pub icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Ingredients,
    #[serde(rename = "step", alias = "instruction")]
    Instruction,
    Parallel,
}

/// One step of a simple recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub id: u32,
    pub kind: StepKind,
    pub text: String,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    /// Countdown length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_seconds: Option<u64>,
    /// Burner level 1..=9.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fire_level: Option<u8>,
    #[serde(default)]
    pub buttons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_group: Option<u32>,
    /// Start the timer as soon as the step is shown instead of on button press.
    #[serde(default)]
    pub auto_start_timer: bool,
}

impl Step {
    /// Number of confirmable actions on this step. A step without
    /// buttons still counts as one.
    pub fn action_count(&self) -> usize {
        self.buttons.len().max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub image: String,
    pub steps: Vec<Step>,
}

impl Recipe {
    /// Total confirmable actions across all steps.
    pub fn total_actions(&self) -> usize {
        self.steps.iter().map(Step::action_count).sum()
    }

    /// Sum of all step timers in seconds.
    pub fn total_timer_secs(&self) -> u64 {
        self.steps.iter().filter_map(|s| s.timer_seconds).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecipeKind {
    Simple,
    MultiTask,
}

/// Either recipe shape.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyRecipe {
    Simple(Recipe),
    MultiTask(MultiTaskRecipe),
}

impl AnyRecipe {
    pub fn id(&self) -> u32 {
        match self {
            AnyRecipe::Simple(r) => r.id,
            AnyRecipe::MultiTask(r) => r.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            AnyRecipe::Simple(r) => &r.title,
            AnyRecipe::MultiTask(r) => &r.title,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            AnyRecipe::Simple(r) => &r.description,
            AnyRecipe::MultiTask(r) => &r.description,
        }
    }

    pub fn kind(&self) -> RecipeKind {
        match self {
            AnyRecipe::Simple(_) => RecipeKind::Simple,
            AnyRecipe::MultiTask(_) => RecipeKind::MultiTask,
        }
    }
}

impl From<Recipe> for AnyRecipe {
    fn from(recipe: Recipe) -> Self {
        AnyRecipe::Simple(recipe)
    }
}

impl From<MultiTaskRecipe> for AnyRecipe {
    fn from(recipe: MultiTaskRecipe) -> Self {
        AnyRecipe::MultiTask(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_kind_accepts_canonical_and_alias_names() {
        let step: Step = toml::from_str(
            r#"
            kind = "step"
            text = "Boil"
            "#,
        )
        .unwrap();
        assert_eq!(step.kind, StepKind::Instruction);

        let step: Step = toml::from_str(
            r#"
            kind = "instruction"
            text = "Boil"
            "#,
        )
        .unwrap();
        assert_eq!(step.kind, StepKind::Instruction);
    }

    #[test]
    fn total_actions_counts_parallel_buttons() {
        let step = |buttons: &[&str]| Step {
            id: 0,
            kind: StepKind::Parallel,
            text: String::new(),
            ingredients: vec![],
            timer_seconds: None,
            fire_level: None,
            buttons: buttons.iter().map(|b| b.to_string()).collect(),
            parallel_group: None,
            auto_start_timer: false,
        };
        let recipe = Recipe {
            id: 1,
            title: "t".into(),
            description: String::new(),
            image: String::new(),
            steps: vec![step(&["a", "b"]), step(&[])],
        };
        assert_eq!(recipe.total_actions(), 3);
    }
}
