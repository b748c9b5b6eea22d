//! Catalog browsing commands.

use std::collections::BTreeSet;

use brewguide_core::i18n::{count_label, Locales, Localization};
use brewguide_core::recipes::{MultiTaskRecipe, Recipe};
use brewguide_core::resolver;
use brewguide_core::timer::format_clock;
use brewguide_core::{AnyRecipe, Config, Language};
use serde_json::json;

use crate::common;

fn summary_json(recipe: &AnyRecipe) -> serde_json::Value {
    match recipe {
        AnyRecipe::Simple(r) => json!({
            "id": r.id,
            "kind": "simple",
            "title": r.title,
            "steps": r.steps.len(),
        }),
        AnyRecipe::MultiTask(r) => json!({
            "id": r.id,
            "kind": "multi-task",
            "title": r.title,
            "blocks": r.blocks.len(),
            "total_time": r.total_time,
        }),
    }
}

pub async fn list(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let settings = common::load_settings(&config);
    let catalog = common::load_catalog(&config, &settings).await?;
    let all = catalog.all();

    if json {
        let items: Vec<_> = all.iter().map(summary_json).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    let l10n = Locales::embedded();
    let lang = settings.language();
    for recipe in &all {
        let size = match recipe {
            AnyRecipe::Simple(r) => count_label(&l10n, lang, r.steps.len() as u64, "recipes.steps"),
            AnyRecipe::MultiTask(r) => format!(
                "{}, {}",
                l10n.translate("recipes.multiTaskRecipe", lang),
                count_label(&l10n, lang, r.blocks.len() as u64, "recipes.blocks")
            ),
        };
        println!("{:>5}  {}  ({size})", recipe.id(), recipe.title());
    }
    Ok(())
}

pub async fn show(id: u32, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let settings = common::load_settings(&config);
    let catalog = common::load_catalog(&config, &settings).await?;
    let recipe = catalog
        .get(id)
        .ok_or_else(|| format!("recipe {id} not found"))?;

    if json {
        let value = match &recipe {
            AnyRecipe::Simple(r) => serde_json::to_value(r)?,
            AnyRecipe::MultiTask(r) => serde_json::to_value(r)?,
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let l10n = Locales::embedded();
    let lang = settings.language();
    match &recipe {
        AnyRecipe::Simple(r) => print_simple(r, &l10n, lang),
        AnyRecipe::MultiTask(r) => print_multi_task(r, &l10n, lang),
    }
    Ok(())
}

fn print_simple(recipe: &Recipe, l10n: &Locales, lang: Language) {
    println!("{}", recipe.title);
    if !recipe.description.is_empty() {
        println!("{}", recipe.description);
    }
    println!("{}", count_label(l10n, lang, recipe.steps.len() as u64, "recipes.steps"));
    println!();
    for (i, step) in recipe.steps.iter().enumerate() {
        let mut line = format!("{:>3}. {}", i + 1, step.text);
        if let Some(secs) = step.timer_seconds {
            line.push_str(&format!("  ⏱ {}", format_clock(secs)));
        }
        if let Some(level) = step.fire_level {
            line.push_str(&format!("  🔥 {level}"));
        }
        println!("{line}");
        for ingredient in &step.ingredients {
            match &ingredient.amount {
                Some(amount) => println!("       {} {} ({amount})", ingredient.icon, ingredient.name),
                None => println!("       {} {}", ingredient.icon, ingredient.name),
            }
        }
        if !step.buttons.is_empty() {
            println!("       [{}]", step.buttons.join("] ["));
        }
    }
}

fn print_multi_task(recipe: &MultiTaskRecipe, l10n: &Locales, lang: Language) {
    println!("{} {}", recipe.image, recipe.title);
    if !recipe.description.is_empty() {
        println!("{}", recipe.description);
    }
    println!(
        "{} · {} · {}",
        recipe.total_time,
        recipe.difficulty,
        count_label(l10n, lang, recipe.blocks.len() as u64, "recipes.blocks")
    );
    println!();
    for block in &recipe.blocks {
        let gate = if block.can_start_immediately || block.depends_on.is_empty() {
            String::new()
        } else {
            let joiner = if block.requires_all_dependencies { " + " } else { " | " };
            format!("  ⇐ {}", block.depends_on.join(joiner))
        };
        println!(
            "{} {} [{}] {} {}{gate}",
            block.icon,
            block.title,
            block.id,
            block.estimated_minutes,
            l10n.translate("recipes.minutes", lang)
        );
        for (i, step) in block.steps.iter().enumerate() {
            let timer = step
                .timer_seconds
                .map(|s| format!("  ⏱ {}", format_clock(s)))
                .unwrap_or_default();
            println!("   {:>2}. {}{timer}", i + 1, step.title);
        }
    }
}

pub async fn blocks(id: u32, completed: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let settings = common::load_settings(&config);
    let catalog = common::load_catalog(&config, &settings).await?;
    let recipe = catalog
        .multi_task_recipe(id)
        .ok_or_else(|| format!("multi-block recipe {id} not found"))?;

    let completed: BTreeSet<String> = completed
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if let Some(unknown) = completed.iter().find(|b| !recipe.has_block(b)) {
        return Err(format!("recipe {id} has no block '{unknown}'").into());
    }

    let out = json!({
        "recipe_id": id,
        "completed": completed,
        "eligible": resolver::eligible_ids(recipe, &completed),
        "locked": resolver::locked_ids(recipe, &completed),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
