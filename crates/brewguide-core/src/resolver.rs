//! Block dependency resolution.
//!
//! Eligibility is a pure function of the recipe and the set of completed
//! blocks, so it is recomputed on every query instead of being cached.
//!
//! Per block:
//! 1. `can_start_immediately` -> eligible.
//! 2. no dependencies -> eligible.
//! 3. `requires_all_dependencies` -> every dependency completed.
//! 4. otherwise -> at least one dependency completed.

use std::collections::BTreeSet;

use crate::recipes::{CookingBlock, MultiTaskRecipe};

pub fn is_eligible(block: &CookingBlock, completed: &BTreeSet<String>) -> bool {
    if block.can_start_immediately || block.depends_on.is_empty() {
        return true;
    }
    if block.requires_all_dependencies {
        block.depends_on.iter().all(|dep| completed.contains(dep))
    } else {
        block.depends_on.iter().any(|dep| completed.contains(dep))
    }
}

/// Startable blocks, in recipe order.
pub fn eligible_blocks<'a>(
    recipe: &'a MultiTaskRecipe,
    completed: &BTreeSet<String>,
) -> Vec<&'a CookingBlock> {
    recipe
        .blocks
        .iter()
        .filter(|b| is_eligible(b, completed))
        .collect()
}

pub fn eligible_ids(recipe: &MultiTaskRecipe, completed: &BTreeSet<String>) -> Vec<String> {
    eligible_blocks(recipe, completed)
        .into_iter()
        .map(|b| b.id.clone())
        .collect()
}

pub fn is_block_eligible(
    recipe: &MultiTaskRecipe,
    completed: &BTreeSet<String>,
    block_id: &str,
) -> bool {
    recipe
        .block(block_id)
        .map(|b| is_eligible(b, completed))
        .unwrap_or(false)
}

/// Blocks eligible under `after` that were not eligible under `before`.
pub fn newly_unlocked(
    recipe: &MultiTaskRecipe,
    before: &BTreeSet<String>,
    after: &BTreeSet<String>,
) -> Vec<String> {
    recipe
        .blocks
        .iter()
        .filter(|b| !is_eligible(b, before) && is_eligible(b, after))
        .map(|b| b.id.clone())
        .collect()
}

/// Blocks that still wait on dependencies.
pub fn locked_ids(recipe: &MultiTaskRecipe, completed: &BTreeSet<String>) -> Vec<String> {
    recipe
        .blocks
        .iter()
        .filter(|b| !is_eligible(b, completed))
        .map(|b| b.id.clone())
        .collect()
}
