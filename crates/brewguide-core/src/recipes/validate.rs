//! Load-time recipe validation.
//!
//! Multi-block recipes are checked for unique block ids, dangling
//! dependency and transition references, fire levels and dependency
//! cycles. A cycle only matters among blocks that actually wait on their
//! dependencies; a block flagged `can_start_immediately` breaks it.

use std::collections::{HashMap, HashSet};

use crate::error::InvalidRecipe;

use super::block::MultiTaskRecipe;
use super::recipe::Recipe;

const FIRE_LEVELS: std::ops::RangeInclusive<u8> = 1..=9;

pub fn validate_recipe(recipe: &Recipe) -> Result<(), InvalidRecipe> {
    for step in &recipe.steps {
        check_fire_level(step.fire_level)?;
    }
    Ok(())
}

pub fn validate_multi_task(recipe: &MultiTaskRecipe) -> Result<(), InvalidRecipe> {
    let mut ids = HashSet::new();
    for block in &recipe.blocks {
        if !ids.insert(block.id.as_str()) {
            return Err(InvalidRecipe::DuplicateBlock(block.id.clone()));
        }
    }

    for block in &recipe.blocks {
        for dep in &block.depends_on {
            if !ids.contains(dep.as_str()) {
                return Err(InvalidRecipe::UnknownDependency {
                    block: block.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }
        for step in &block.steps {
            check_fire_level(step.fire_level)?;
            if let Some(transition) = &step.schedule_transition {
                if !ids.contains(transition.target_block.as_str()) {
                    return Err(InvalidRecipe::UnknownTransitionTarget {
                        block: block.id.clone(),
                        target: transition.target_block.clone(),
                    });
                }
            }
        }
    }

    if let Some(cycle) = find_cycle(recipe) {
        return Err(InvalidRecipe::DependencyCycle(cycle));
    }
    Ok(())
}

fn check_fire_level(level: Option<u8>) -> Result<(), InvalidRecipe> {
    match level {
        Some(level) if !FIRE_LEVELS.contains(&level) => {
            Err(InvalidRecipe::FireLevelOutOfRange { level })
        }
        _ => Ok(()),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first search over the "waits on" edges. Returns the blocks of the
/// first cycle found, in dependency order.
fn find_cycle(recipe: &MultiTaskRecipe) -> Option<Vec<String>> {
    let edges: HashMap<&str, Vec<&str>> = recipe
        .blocks
        .iter()
        .map(|b| {
            let deps = if b.can_start_immediately {
                Vec::new()
            } else {
                b.depends_on.iter().map(String::as_str).collect()
            };
            (b.id.as_str(), deps)
        })
        .collect();

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut path: Vec<&str> = Vec::new();

    fn visit<'a>(
        node: &'a str,
        edges: &HashMap<&'a str, Vec<&'a str>>,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        match marks.get(node) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                let start = path.iter().position(|n| *n == node).unwrap_or(0);
                return Some(path[start..].iter().map(|s| s.to_string()).collect());
            }
            None => {}
        }
        marks.insert(node, Mark::Visiting);
        path.push(node);
        for &next in edges.get(node).map(Vec::as_slice).unwrap_or(&[]) {
            if let Some(cycle) = visit(next, edges, marks, path) {
                return Some(cycle);
            }
        }
        path.pop();
        marks.insert(node, Mark::Done);
        None
    }

    for block in &recipe.blocks {
        if let Some(cycle) = visit(block.id.as_str(), &edges, &mut marks, &mut path) {
            return Some(cycle);
        }
    }
    None
}
