//! Property tests for block eligibility.
//!
//! Recipes are generated with up to six blocks whose dependencies only
//! point at earlier blocks, and an arbitrary completed set.

use std::collections::BTreeSet;

use brewguide_core::recipes::{CookingBlock, MultiTaskRecipe};
use brewguide_core::resolver::{eligible_ids, is_eligible, newly_unlocked};
use proptest::prelude::*;

fn block(index: usize, immediate: bool, all: bool, deps: Vec<usize>) -> CookingBlock {
    CookingBlock {
        id: format!("b{index}"),
        title: format!("Block {index}"),
        icon: "🍳".into(),
        description: String::new(),
        estimated_minutes: 5,
        can_start_immediately: immediate,
        depends_on: deps.into_iter().map(|d| format!("b{d}")).collect(),
        requires_all_dependencies: all,
        steps: Vec::new(),
    }
}

fn arb_recipe() -> impl Strategy<Value = MultiTaskRecipe> {
    prop::collection::vec((any::<bool>(), any::<bool>(), prop::collection::vec(0usize..6, 0..4)), 1..6)
        .prop_map(|specs| {
            let blocks = specs
                .into_iter()
                .enumerate()
                .map(|(i, (immediate, all, deps))| {
                    let deps: BTreeSet<usize> = deps.into_iter().filter(|d| *d < i).collect();
                    block(i, immediate, all, deps.into_iter().collect())
                })
                .collect();
            MultiTaskRecipe {
                id: 500,
                title: "Generated".into(),
                description: String::new(),
                image: String::new(),
                total_time: String::new(),
                active_time: String::new(),
                difficulty: String::new(),
                servings: String::new(),
                blocks,
            }
        })
}

fn arb_completed() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set((0usize..6).prop_map(|i| format!("b{i}")), 0..6)
}

proptest! {
    #[test]
    fn immediate_blocks_are_always_eligible(recipe in arb_recipe(), completed in arb_completed()) {
        for b in recipe.blocks.iter().filter(|b| b.can_start_immediately) {
            prop_assert!(is_eligible(b, &completed));
        }
    }

    #[test]
    fn and_blocks_need_a_subset(recipe in arb_recipe(), completed in arb_completed()) {
        for b in recipe.blocks.iter().filter(|b| !b.can_start_immediately && b.requires_all_dependencies) {
            let subset = b.depends_on.iter().all(|d| completed.contains(d));
            prop_assert_eq!(is_eligible(b, &completed), subset);
        }
    }

    #[test]
    fn or_blocks_need_an_intersection(recipe in arb_recipe(), completed in arb_completed()) {
        for b in recipe
            .blocks
            .iter()
            .filter(|b| !b.can_start_immediately && !b.requires_all_dependencies && !b.depends_on.is_empty())
        {
            let overlap = b.depends_on.iter().any(|d| completed.contains(d));
            prop_assert_eq!(is_eligible(b, &completed), overlap);
        }
    }

    #[test]
    fn eligible_ids_keep_recipe_order(recipe in arb_recipe(), completed in arb_completed()) {
        let ids = eligible_ids(&recipe, &completed);
        let order: Vec<String> = recipe
            .blocks
            .iter()
            .map(|b| b.id.clone())
            .filter(|id| ids.contains(id))
            .collect();
        prop_assert_eq!(ids, order);
    }

    #[test]
    fn completing_never_locks_a_block(recipe in arb_recipe(), completed in arb_completed(), extra in 0usize..6) {
        let mut after = completed.clone();
        after.insert(format!("b{extra}"));
        let before_ids = eligible_ids(&recipe, &completed);
        let after_ids = eligible_ids(&recipe, &after);
        for id in &before_ids {
            prop_assert!(after_ids.contains(id));
        }
        for id in newly_unlocked(&recipe, &completed, &after) {
            prop_assert!(!before_ids.contains(&id));
            prop_assert!(after_ids.contains(&id));
        }
    }
}
