//! Multi-block recipe definitions.
//!
//! A multi-block recipe splits cooking into independent tracks
//! ("sauce", "meatballs"). Each block gates on other blocks through
//! `depends_on` and carries its own step list.

use serde::{Deserialize, Serialize};

use super::recipe::{RecipeIngredient, StepKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NextAction {
    Continue,
    CompleteBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    /// The user watches this countdown.
    Active,
    /// Runs unattended (simmering) while the user works elsewhere.
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionKind {
    SuggestStart,
    AutoStart,
    Notification,
}

/// Hint to move over to another block, due `trigger_after` seconds after
/// the owning step became active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTransition {
    pub trigger_after: u64,
    pub target_block: String,
    pub message: String,
    #[serde(default)]
    pub reasoning: String,
    pub action_type: TransitionKind,
}

/// In-block reminder, due `trigger_after` seconds after step start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleAction {
    pub trigger_after: u64,
    pub action_type: String,
    pub message: String,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnCompletion {
    pub instruction: String,
    pub wait_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStep {
    pub id: u32,
    pub kind: StepKind,
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_kind: Option<TimerKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fire_level: Option<u8>,
    pub estimated_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default = "default_next_action")]
    pub next_action: NextAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_transition: Option<ScheduleTransition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_action: Option<ScheduleAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_completion: Option<OnCompletion>,
}

fn default_next_action() -> NextAction {
    NextAction::Continue
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookingBlock {
    pub id: String,
    pub title: String,
    pub icon: String,
    #[serde(default)]
    pub description: String,
    pub estimated_minutes: u32,
    /// Ignore `depends_on` and allow starting right away.
    #[serde(default)]
    pub can_start_immediately: bool,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// AND semantics over `depends_on` when true, OR otherwise.
    #[serde(default)]
    pub requires_all_dependencies: bool,
    pub steps: Vec<BlockStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTaskRecipe {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub image: String,
    pub total_time: String,
    pub active_time: String,
    pub difficulty: String,
    pub servings: String,
    pub blocks: Vec<CookingBlock>,
}

impl MultiTaskRecipe {
    pub fn block(&self, block_id: &str) -> Option<&CookingBlock> {
        self.blocks.iter().find(|b| b.id == block_id)
    }

    pub fn has_block(&self, block_id: &str) -> bool {
        self.block(block_id).is_some()
    }

    pub fn total_steps(&self) -> usize {
        self.blocks.iter().map(|b| b.steps.len()).sum()
    }
}

/// Action identifier for a block step: `"<block>:<step id>"`.
pub fn block_step_action_id(block_id: &str, step: &BlockStep) -> String {
    format!("{block_id}:{}", step.id)
}
