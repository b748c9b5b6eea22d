//! End-to-end session scenarios against small hand-written catalogs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use brewguide_core::recipes::{CatalogFile, RecipeCatalog};
use brewguide_core::{
    CatalogError, Event, InvalidRecipe, Locales, MemoryPreferences, NoHost, NotificationKind,
    SessionController, SessionPhase,
};

// ============================================================================
// Test Helpers
// ============================================================================

const TWO_BLOCKS: &str = r#"
[[multi_task]]
id = 7
title = "A then B"
description = ""
image = ""
total_time = ""
active_time = ""
difficulty = ""
servings = ""

[[multi_task.blocks]]
id = "A"
title = "First"
icon = "1️⃣"
estimated_minutes = 5
can_start_immediately = true

[[multi_task.blocks.steps]]
id = 1
kind = "step"
title = "Do A"
estimated_minutes = 3

[[multi_task.blocks.steps]]
id = 2
kind = "step"
title = "Finish A"
estimated_minutes = 2
timer_seconds = 3
next_action = "complete-block"

[multi_task.blocks.steps.schedule_transition]
trigger_after = 2
target_block = "B"
message = "B is next"
action_type = "notification"

[[multi_task.blocks]]
id = "B"
title = "Second"
icon = "2️⃣"
estimated_minutes = 5
depends_on = ["A"]
requires_all_dependencies = true

[[multi_task.blocks.steps]]
id = 1
kind = "step"
title = "Do B"
estimated_minutes = 5
next_action = "complete-block"
"#;

const SIMPLE: &str = r#"
[[recipes]]
id = 3
title = "Tea"
description = ""
image = ""

[[recipes.steps]]
kind = "step"
text = "Boil"
buttons = ["Boiled"]
timer_seconds = 3

[[recipes.steps]]
kind = "step"
text = "Pour"
buttons = ["Poured"]
"#;

fn catalog(toml: &str) -> RecipeCatalog {
    RecipeCatalog::from_recipes(CatalogFile::parse(toml).unwrap().into_recipes()).unwrap()
}

fn session(toml: &str) -> SessionController {
    SessionController::new(
        catalog(toml),
        Box::new(MemoryPreferences::new()),
        Box::new(Locales::embedded()),
        Box::new(NoHost),
    )
}

fn ticks(s: &mut SessionController, n: usize) -> Vec<Event> {
    (0..n).flat_map(|_| s.tick()).collect()
}

// ============================================================================
// Block dependencies
// ============================================================================

#[test]
fn test_completing_a_unlocks_b() {
    let mut s = session(TWO_BLOCKS);
    s.select_recipe_by_id(7).unwrap();
    assert_eq!(s.eligible_blocks(), vec!["A"]);
    assert!(s.enter_block("B").is_none());

    match s.complete_block("A") {
        Some(Event::BlockCompleted { unlocked, .. }) => assert_eq!(unlocked, vec!["B"]),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(s.eligible_blocks(), vec!["A", "B"]);
    assert!(s.enter_block("B").is_some());
}

#[test]
fn test_reset_multi_task_restores_fresh_eligibility() {
    let mut s = session(TWO_BLOCKS);
    s.select_recipe_by_id(7).unwrap();
    let fresh = s.eligible_blocks();

    s.enter_block("A").unwrap();
    s.start_timer("A:2", 10);
    s.complete_block("A").unwrap();
    assert_ne!(s.eligible_blocks(), fresh);

    assert!(s.reset_multi_task().is_some());
    assert_eq!(s.phase(), SessionPhase::BlockSelect);
    assert_eq!(s.eligible_blocks(), fresh);
    assert_eq!(s.timers().time_left("A:2"), 0);
    assert!(s.completed_blocks().is_empty());

    s.select_recipe_by_id(7).unwrap();
    assert_eq!(s.eligible_blocks(), fresh);
}

#[test]
fn test_reset_recipe_returns_to_idle() {
    let mut s = session(TWO_BLOCKS);
    s.select_recipe_by_id(7).unwrap();
    s.enter_block("A").unwrap();
    assert!(matches!(
        s.reset_recipe(),
        Event::SessionReset { phase: SessionPhase::Idle, .. }
    ));
    assert!(s.current_recipe().is_none());
    assert!(s.eligible_blocks().is_empty());
    assert!(s.reset_multi_task().is_none());
}

#[test]
fn test_finishing_every_block_completes_recipe() {
    let mut s = session(TWO_BLOCKS);
    s.select_recipe_by_id(7).unwrap();
    s.enter_block("A").unwrap();
    s.advance_block().unwrap();
    assert!(matches!(s.advance_block(), Some(Event::BlockCompleted { .. })));
    s.enter_block("B").unwrap();
    s.advance_block().unwrap();
    assert_eq!(s.phase(), SessionPhase::Completed);
    assert_eq!(s.progress_percent(), 100);
}

// ============================================================================
// Timers and confirmations
// ============================================================================

#[test]
fn test_timer_expires_after_three_ticks() {
    let mut s = session(SIMPLE);
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    s.on_timer_complete(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    s.start_timer("t1", 3);
    let events = ticks(&mut s, 3);
    assert!(matches!(&events[..], [Event::TimerCompleted { action_id, .. }] if action_id == "t1"));
    assert!(s.timers().is_completed("t1"));
    assert!(!s.timers().is_active("t1"));

    ticks(&mut s, 2);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn test_stopped_timer_keeps_remaining() {
    let mut s = session(SIMPLE);
    s.start_timer("t1", 3);
    ticks(&mut s, 1);
    assert!(matches!(
        s.stop_timer("t1"),
        Some(Event::TimerStopped { remaining_secs: 2, .. })
    ));
    ticks(&mut s, 5);
    assert_eq!(s.timers().time_left("t1"), 2);
    assert!(!s.timers().is_completed("t1"));
    assert!(s.stop_timer("t1").is_none());
}

#[test]
fn test_simple_flow_buttons_and_progress() {
    let mut s = session(SIMPLE);
    s.select_recipe_by_id(3).unwrap();
    assert_eq!(s.phase(), SessionPhase::SimpleFlow);

    s.press_button("Boiled");
    s.press_button("Boiled");
    assert_eq!(s.tracker().completed_count(), 1);
    assert_eq!(s.progress_percent(), 50);

    s.next_step().unwrap();
    assert!(s.next_step().is_none());
    assert_eq!(s.step_index(), 1);
    s.press_button("Poured");
    assert_eq!(s.progress_percent(), 100);

    // The boil timer kept running across navigation.
    let events = ticks(&mut s, 3);
    assert!(events.iter().any(|e| matches!(e, Event::TimerCompleted { .. })));

    assert!(matches!(s.reset_progress(), Event::TimersReset { .. }));
    assert_eq!(s.tracker().completed_count(), 0);
    assert_eq!(s.timers().time_left("1:Boiled"), 0);
    assert_eq!(s.step_index(), 1);
}

const REPEATED_LABELS: &str = r#"
[[recipes]]
id = 4
title = "Drip"
description = ""
image = ""

[[recipes.steps]]
kind = "ingredients"
text = "Beans"
buttons = ["OK"]

[[recipes.steps]]
kind = "step"
text = "Grind"

[[recipes.steps]]
kind = "step"
text = "Brew"
buttons = ["OK"]
timer_seconds = 2

[[recipes.steps]]
kind = "step"
text = "Serve"
"#;

#[test]
fn test_repeated_labels_count_per_step() {
    let mut s = session(REPEATED_LABELS);
    s.select_recipe_by_id(4).unwrap();

    let mut pressed = Vec::new();
    for i in 0..4 {
        let label = if i % 2 == 0 { "OK" } else { "step:0" };
        pressed.push(s.press_button(label).len());
        s.next_step();
    }
    assert!(pressed.iter().all(|n| *n > 0), "{pressed:?}");
    assert_eq!(s.tracker().completed_count(), 4);
    assert_eq!(s.progress_percent(), 100);
    assert!(s.timers().is_active("3:OK"));
    assert!(!s.timers().is_active("1:OK"));
}

#[test]
fn test_selecting_again_clears_progress() {
    let mut s = session(SIMPLE);
    s.select_recipe_by_id(3).unwrap();
    s.press_button("Boiled");
    s.select_recipe_by_id(3).unwrap();
    assert_eq!(s.tracker().completed_count(), 0);
    assert!(!s.timers().is_active("1:Boiled"));
}

// ============================================================================
// Scheduled notifications
// ============================================================================

#[test]
fn test_notification_fires_while_step_is_current() {
    let mut s = session(TWO_BLOCKS);
    s.select_recipe_by_id(7).unwrap();
    s.enter_block("A").unwrap();
    s.next_block_step().unwrap();
    assert_eq!(s.pending_notifications(), 1);

    let events = ticks(&mut s, 2);
    match &events[..] {
        [Event::ScheduledNotification { kind, source_block, target_block, message, .. }] => {
            assert_eq!(*kind, NotificationKind::Notification);
            assert_eq!(source_block, "A");
            assert_eq!(target_block.as_deref(), Some("B"));
            assert_eq!(message, "B is next");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_stale_notification_is_suppressed() {
    let mut s = session(TWO_BLOCKS);
    s.select_recipe_by_id(7).unwrap();
    s.enter_block("A").unwrap();
    s.next_block_step().unwrap();
    ticks(&mut s, 1);

    // Leave and come back to the same step: the first countdown is stale.
    s.previous_block_step().unwrap();
    s.next_block_step().unwrap();
    let first = ticks(&mut s, 1);
    assert!(first.is_empty());

    let second = ticks(&mut s, 1);
    assert_eq!(second.len(), 1);
    assert!(ticks(&mut s, 5).is_empty());
}

#[test]
fn test_notification_dropped_after_leaving_block() {
    let mut s = session(TWO_BLOCKS);
    s.select_recipe_by_id(7).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    s.subscribe(move |e| sink.lock().unwrap().push(e.name()));

    s.enter_block("A").unwrap();
    s.next_block_step().unwrap();
    s.leave_block().unwrap();
    ticks(&mut s, 3);
    assert!(!seen.lock().unwrap().contains(&"scheduled_notification"));
    assert_eq!(s.pending_notifications(), 0);
}

#[test]
fn test_zero_delay_notification_fires_on_activation() {
    let mut s = session(&TWO_BLOCKS.replace("trigger_after = 2", "trigger_after = 0"));
    s.select_recipe_by_id(7).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    s.subscribe(move |e| sink.lock().unwrap().push(e.name()));

    s.enter_block("A").unwrap();
    s.next_block_step().unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["block_entered", "block_step_changed", "scheduled_notification"]
    );
    assert_eq!(s.pending_notifications(), 0);
    assert!(ticks(&mut s, 3).is_empty());
}

#[test]
fn test_stale_countdown_is_dropped_on_next_tick() {
    let mut s = session(&TWO_BLOCKS.replace("trigger_after = 2", "trigger_after = 600"));
    s.select_recipe_by_id(7).unwrap();
    s.enter_block("A").unwrap();
    s.next_block_step().unwrap();
    assert_eq!(s.pending_notifications(), 1);

    s.previous_block_step().unwrap();
    ticks(&mut s, 1);
    assert_eq!(s.pending_notifications(), 0);
}

// ============================================================================
// Catalog validation
// ============================================================================

#[test]
fn test_cyclic_catalog_is_rejected() {
    let cyclic = TWO_BLOCKS
        .replace("can_start_immediately = true", "depends_on = [\"B\"]");
    let recipes = CatalogFile::parse(&cyclic).unwrap().into_recipes();
    match RecipeCatalog::from_recipes(recipes) {
        Err(CatalogError::InvalidRecipe {
            recipe_id: 7,
            reason: InvalidRecipe::DependencyCycle(cycle),
        }) => {
            assert!(cycle.contains(&"A".to_string()));
            assert!(cycle.contains(&"B".to_string()));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_extend_skips_invalid_recipes() {
    let mut catalog = catalog(SIMPLE);
    let cyclic = TWO_BLOCKS
        .replace("can_start_immediately = true", "depends_on = [\"B\"]");
    let mut recipes = CatalogFile::parse(&cyclic).unwrap().into_recipes();
    recipes.extend(CatalogFile::parse(SIMPLE).unwrap().into_recipes());
    assert_eq!(catalog.extend(recipes), 0);
    assert_eq!(catalog.len(), 1);
}
