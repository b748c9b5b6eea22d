use std::collections::BTreeSet;

use chrono::Utc;
use uuid::Uuid;

use super::schedule::{Anchor, DueNotification, NotificationScheduler};
use super::SessionPhase;
use crate::events::{Event, EventBus, NotificationKind};
use crate::host::{HapticStyle, HostCapabilities, UserProfile};
use crate::i18n::{count_label, Language, Localization};
use crate::progress::StepTracker;
use crate::recipes::{
    block_step_action_id, AnyRecipe, BlockStep, CookingBlock, MultiTaskRecipe, NextAction,
    Recipe, RecipeCatalog, RecipeSource, RefreshOutcome, Step,
};
use crate::resolver;
use crate::settings::{Settings, ThemeName};
use crate::storage::PreferenceStore;
use crate::timer::TimerEngine;

/// Label a press on `step` defaults to: its first button, or `step:<id>`
/// when it has none.
pub fn default_step_label(step: &Step) -> String {
    step.buttons
        .first()
        .cloned()
        .unwrap_or_else(|| format!("step:{}", step.id))
}

/// Action id of a press on the simple step at `step_index`. Labels repeat
/// across steps ("OK"), so the 1-based step number is part of the id.
pub fn simple_action_id(step_index: usize, label: &str) -> String {
    format!("{}:{label}", step_index + 1)
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64 * 100.0).round()).min(100.0) as u8
}

/// Drives one user through one recipe at a time.
///
/// All mutation goes through `&mut self`; every state change is returned
/// to the caller and published on the event bus. Commands that make no
/// sense in the current phase return `None` (or an empty list) and change
/// nothing.
pub struct SessionController {
    id: Uuid,
    catalog: RecipeCatalog,
    settings: Settings,
    l10n: Box<dyn Localization>,
    host: Box<dyn HostCapabilities>,
    timers: TimerEngine,
    tracker: StepTracker,
    schedules: NotificationScheduler,
    bus: EventBus,
    phase: SessionPhase,
    recipe: Option<AnyRecipe>,
    step_index: usize,
    active_block: Option<String>,
    block_step_index: usize,
    completed_blocks: BTreeSet<String>,
    preferred_block: Option<String>,
    epoch: u64,
}

impl SessionController {
    /// Build a session, resolving language and theme from `prefs`, the
    /// host and the process locale.
    pub fn new(
        catalog: RecipeCatalog,
        prefs: Box<dyn PreferenceStore>,
        l10n: Box<dyn Localization>,
        host: Box<dyn HostCapabilities>,
    ) -> Self {
        let settings = Settings::load(prefs, host.as_ref());
        Self::with_settings(catalog, settings, l10n, host)
    }

    pub fn with_settings(
        catalog: RecipeCatalog,
        settings: Settings,
        l10n: Box<dyn Localization>,
        host: Box<dyn HostCapabilities>,
    ) -> Self {
        host.expand_view();
        let id = Uuid::new_v4();
        tracing::info!(session_id = %id, language = %settings.language(), recipes = catalog.len(), "session created");
        Self {
            id,
            catalog,
            settings,
            l10n,
            host,
            timers: TimerEngine::new(),
            tracker: StepTracker::new(),
            schedules: NotificationScheduler::new(),
            bus: EventBus::new(),
            phase: SessionPhase::Idle,
            recipe: None,
            step_index: 0,
            active_block: None,
            block_step_index: 0,
            completed_blocks: BTreeSet::new(),
            preferred_block: None,
            epoch: 0,
        }
    }

    fn publish(&mut self, event: Event) -> Event {
        self.bus.emit(&event);
        event
    }

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&Event) + Send + 'static,
    {
        self.bus.subscribe(observer);
    }

    /// Run `callback` once for each timer that reaches zero.
    pub fn on_timer_complete<F>(&mut self, callback: F)
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.timers.on_complete(callback);
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn session_id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }

    pub fn timers(&self) -> &TimerEngine {
        &self.timers
    }

    pub fn tracker(&self) -> &StepTracker {
        &self.tracker
    }

    pub fn pending_notifications(&self) -> usize {
        self.schedules.pending_count()
    }

    pub fn current_recipe(&self) -> Option<&AnyRecipe> {
        self.recipe.as_ref()
    }

    pub fn simple_recipe(&self) -> Option<&Recipe> {
        match &self.recipe {
            Some(AnyRecipe::Simple(r)) => Some(r),
            _ => None,
        }
    }

    pub fn multi_task_recipe(&self) -> Option<&MultiTaskRecipe> {
        match &self.recipe {
            Some(AnyRecipe::MultiTask(r)) => Some(r),
            _ => None,
        }
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.simple_recipe()?.steps.get(self.step_index)
    }

    pub fn active_block_id(&self) -> Option<&str> {
        self.active_block.as_deref()
    }

    pub fn block_step_index(&self) -> usize {
        self.block_step_index
    }

    pub fn current_block(&self) -> Option<&CookingBlock> {
        self.multi_task_recipe()?.block(self.active_block.as_deref()?)
    }

    pub fn current_block_step(&self) -> Option<&BlockStep> {
        self.current_block()?.steps.get(self.block_step_index)
    }

    pub fn completed_blocks(&self) -> &BTreeSet<String> {
        &self.completed_blocks
    }

    pub fn is_block_completed(&self, block_id: &str) -> bool {
        self.completed_blocks.contains(block_id)
    }

    /// Block suggested by an `auto-start` notification, until entered
    /// or completed.
    pub fn preferred_block(&self) -> Option<&str> {
        self.preferred_block.as_deref()
    }

    pub fn eligible_blocks(&self) -> Vec<String> {
        self.multi_task_recipe()
            .map(|r| resolver::eligible_ids(r, &self.completed_blocks))
            .unwrap_or_default()
    }

    pub fn is_block_eligible(&self, block_id: &str) -> bool {
        self.multi_task_recipe()
            .map(|r| resolver::is_block_eligible(r, &self.completed_blocks, block_id))
            .unwrap_or(false)
    }

    // ── Catalog ──────────────────────────────────────────────────────

    pub async fn refresh_catalog<S: RecipeSource>(&mut self, source: &S) -> RefreshOutcome {
        self.catalog.refresh(source).await
    }

    // ── Selection ────────────────────────────────────────────────────

    fn clear_transient(&mut self) {
        let _ = self.timers.reset();
        self.tracker.reset();
        self.schedules.clear();
        self.completed_blocks.clear();
        self.preferred_block = None;
        self.active_block = None;
        self.step_index = 0;
        self.block_step_index = 0;
        self.epoch += 1;
    }

    pub fn select_recipe(&mut self, recipe: AnyRecipe) -> Event {
        self.clear_transient();
        self.phase = match &recipe {
            AnyRecipe::MultiTask(m) if !m.blocks.is_empty() => SessionPhase::BlockSelect,
            _ => SessionPhase::SimpleFlow,
        };
        tracing::info!(recipe_id = recipe.id(), phase = ?self.phase, "recipe selected");
        let event = Event::RecipeSelected {
            recipe_id: recipe.id(),
            kind: recipe.kind(),
            at: Utc::now(),
        };
        self.recipe = Some(recipe);
        let event = self.publish(event);
        self.auto_start_step_timer();
        event
    }

    /// Select from the catalog. Unknown ids change nothing.
    pub fn select_recipe_by_id(&mut self, recipe_id: u32) -> Option<Event> {
        let Some(recipe) = self.catalog.get(recipe_id) else {
            tracing::warn!(recipe_id, "recipe not found");
            return None;
        };
        Some(self.select_recipe(recipe))
    }

    // ── Simple flow ──────────────────────────────────────────────────

    fn simple_len(&self) -> Option<usize> {
        if self.phase != SessionPhase::SimpleFlow {
            return None;
        }
        self.simple_recipe().map(|r| r.steps.len())
    }

    fn move_to_step(&mut self, index: usize, total: usize) -> Event {
        self.step_index = index;
        let event = self.publish(Event::StepChanged {
            step_index: index,
            total_steps: total,
            at: Utc::now(),
        });
        self.auto_start_step_timer();
        event
    }

    fn auto_start_step_timer(&mut self) {
        let Some(step) = self.current_step() else {
            return;
        };
        let (true, Some(secs)) = (step.auto_start_timer, step.timer_seconds) else {
            return;
        };
        let action_id = simple_action_id(self.step_index, &default_step_label(step));
        if self.timers.get(&action_id).is_some() {
            return;
        }
        let event = self.timers.start(&action_id, secs);
        self.publish(event);
    }

    pub fn next_step(&mut self) -> Option<Event> {
        let total = self.simple_len()?;
        if self.step_index + 1 >= total {
            return None;
        }
        Some(self.move_to_step(self.step_index + 1, total))
    }

    pub fn previous_step(&mut self) -> Option<Event> {
        let total = self.simple_len()?;
        if self.step_index == 0 {
            return None;
        }
        Some(self.move_to_step(self.step_index - 1, total))
    }

    pub fn go_to_step(&mut self, index: usize) -> Option<Event> {
        let total = self.simple_len()?;
        if index >= total || index == self.step_index {
            return None;
        }
        Some(self.move_to_step(index, total))
    }

    pub fn confirm_step(&mut self, action_id: &str) -> Option<Event> {
        if !self.tracker.confirm(action_id) {
            return None;
        }
        tracing::debug!(action_id, "step confirmed");
        Some(self.publish(Event::StepConfirmed {
            action_id: action_id.to_string(),
            completed_count: self.tracker.completed_count(),
            at: Utc::now(),
        }))
    }

    fn confirm_and_time(&mut self, action_id: &str, timer: Option<u64>) -> Vec<Event> {
        let mut events: Vec<Event> = self.confirm_step(action_id).into_iter().collect();
        if let Some(secs) = timer {
            if self.timers.get(action_id).is_none() {
                let started = self.timers.start(action_id, secs);
                events.push(self.publish(started));
            }
        }
        self.host.haptic_pulse(HapticStyle::Light);
        events
    }

    /// Press a button of the current simple step: confirm it and start
    /// the step timer under the same action id (see [`simple_action_id`]).
    /// Steps without buttons accept their `step:<id>` label.
    pub fn press_button(&mut self, label: &str) -> Vec<Event> {
        if self.phase != SessionPhase::SimpleFlow {
            return Vec::new();
        }
        let Some(step) = self.current_step() else {
            return Vec::new();
        };
        let accepted = if step.buttons.is_empty() {
            label == default_step_label(step)
        } else {
            step.buttons.iter().any(|b| b == label)
        };
        if !accepted {
            tracing::debug!(label, "button is not on the current step");
            return Vec::new();
        }
        let timer = step.timer_seconds;
        let action_id = simple_action_id(self.step_index, label);
        self.confirm_and_time(&action_id, timer)
    }

    pub fn finish_recipe(&mut self) -> Option<Event> {
        let total = self.simple_len()?;
        if self.step_index + 1 < total {
            return None;
        }
        let recipe_id = self.simple_recipe()?.id;
        self.phase = SessionPhase::Completed;
        self.host.haptic_pulse(HapticStyle::Heavy);
        tracing::info!(recipe_id, "recipe completed");
        Some(self.publish(Event::RecipeCompleted {
            recipe_id,
            at: Utc::now(),
        }))
    }

    // ── Blocks ───────────────────────────────────────────────────────

    fn current_anchor(&self) -> Option<Anchor> {
        if self.phase != SessionPhase::InBlock {
            return None;
        }
        Some(Anchor {
            block_id: self.active_block.clone()?,
            step_index: self.block_step_index,
            epoch: self.epoch,
        })
    }

    /// New activation of the current block step: bump the epoch and arm
    /// the step's schedules. Returns the ones due right away.
    fn activate_block_step(&mut self) -> Vec<DueNotification> {
        self.epoch += 1;
        let (Some(anchor), Some(step)) = (self.current_anchor(), self.current_block_step().cloned())
        else {
            return Vec::new();
        };
        self.schedules.arm(&anchor, &step)
    }

    /// Publish notifications armed with no delay, after the event that
    /// activated their step.
    fn publish_immediate(&mut self, due: Vec<DueNotification>) {
        for event in self.notification_events(due) {
            self.bus.emit(&event);
        }
    }

    fn notification_events(&mut self, due: Vec<DueNotification>) -> Vec<Event> {
        let mut events = Vec::with_capacity(due.len());
        for due in due {
            if due.kind == NotificationKind::AutoStart {
                if let Some(target) = due.target_block.as_deref() {
                    if self.is_block_eligible(target) && !self.is_block_completed(target) {
                        self.preferred_block = Some(target.to_string());
                    }
                }
            }
            tracing::info!(source = %due.source_block, target = ?due.target_block, "scheduled notification");
            events.push(Event::ScheduledNotification {
                kind: due.kind,
                source_block: due.source_block,
                target_block: due.target_block,
                message: due.message,
                reasoning: due.reasoning,
                at: Utc::now(),
            });
        }
        events
    }

    pub fn enter_block(&mut self, block_id: &str) -> Option<Event> {
        if !matches!(self.phase, SessionPhase::BlockSelect | SessionPhase::InBlock) {
            return None;
        }
        if !self.is_block_eligible(block_id) {
            tracing::debug!(block_id, "block is locked or unknown");
            return None;
        }
        self.phase = SessionPhase::InBlock;
        self.active_block = Some(block_id.to_string());
        self.block_step_index = 0;
        if self.preferred_block.as_deref() == Some(block_id) {
            self.preferred_block = None;
        }
        let due = self.activate_block_step();
        tracing::info!(block_id, "block entered");
        let event = self.publish(Event::BlockEntered {
            block_id: block_id.to_string(),
            at: Utc::now(),
        });
        self.publish_immediate(due);
        Some(event)
    }

    fn move_to_block_step(&mut self, index: usize, total: usize) -> Option<Event> {
        let block_id = self.active_block.clone()?;
        self.block_step_index = index;
        let due = self.activate_block_step();
        let event = self.publish(Event::BlockStepChanged {
            block_id,
            step_index: index,
            total_steps: total,
            at: Utc::now(),
        });
        self.publish_immediate(due);
        Some(event)
    }

    fn block_len(&self) -> Option<usize> {
        if self.phase != SessionPhase::InBlock {
            return None;
        }
        self.current_block().map(|b| b.steps.len())
    }

    pub fn next_block_step(&mut self) -> Option<Event> {
        let total = self.block_len()?;
        if self.block_step_index + 1 >= total {
            return None;
        }
        self.move_to_block_step(self.block_step_index + 1, total)
    }

    pub fn previous_block_step(&mut self) -> Option<Event> {
        let total = self.block_len()?;
        if self.block_step_index == 0 {
            return None;
        }
        self.move_to_block_step(self.block_step_index - 1, total)
    }

    /// Finish the active block on a `complete-block` step, otherwise move
    /// to the next step.
    pub fn advance_block(&mut self) -> Option<Event> {
        if self.phase != SessionPhase::InBlock {
            return None;
        }
        if self.current_block_step()?.next_action == NextAction::CompleteBlock {
            let block_id = self.active_block.clone()?;
            self.complete_block(&block_id)
        } else {
            self.next_block_step()
        }
    }

    /// Confirm the current block step and start its timer, if any.
    pub fn confirm_block_step(&mut self) -> Vec<Event> {
        let (Some(block_id), Some(step)) = (self.active_block.as_deref(), self.current_block_step())
        else {
            return Vec::new();
        };
        if self.phase != SessionPhase::InBlock {
            return Vec::new();
        }
        let action_id = block_step_action_id(block_id, step);
        let timer = step.timer_seconds;
        self.confirm_and_time(&action_id, timer)
    }

    pub fn leave_block(&mut self) -> Option<Event> {
        if self.phase != SessionPhase::InBlock {
            return None;
        }
        let block_id = self.active_block.take()?;
        self.phase = SessionPhase::BlockSelect;
        self.block_step_index = 0;
        self.epoch += 1;
        tracing::debug!(block_id = %block_id, "block left");
        Some(self.publish(Event::BlockLeft {
            block_id,
            at: Utc::now(),
        }))
    }

    /// Mark `block_id` done. Returns `None` for unknown or already
    /// completed blocks.
    pub fn complete_block(&mut self, block_id: &str) -> Option<Event> {
        if !matches!(self.phase, SessionPhase::BlockSelect | SessionPhase::InBlock) {
            return None;
        }
        let recipe = self.multi_task_recipe()?;
        if !recipe.has_block(block_id) || self.completed_blocks.contains(block_id) {
            return None;
        }
        let mut after = self.completed_blocks.clone();
        after.insert(block_id.to_string());
        let unlocked = resolver::newly_unlocked(recipe, &self.completed_blocks, &after);
        let all_done = recipe.blocks.iter().all(|b| after.contains(&b.id));
        let recipe_id = recipe.id;

        self.completed_blocks = after;
        if self.active_block.as_deref() == Some(block_id) {
            self.active_block = None;
            self.block_step_index = 0;
            self.phase = SessionPhase::BlockSelect;
            self.epoch += 1;
        }
        if self.preferred_block.as_deref() == Some(block_id) {
            self.preferred_block = None;
        }
        self.host.haptic_pulse(HapticStyle::Medium);
        tracing::info!(block_id, ?unlocked, "block completed");

        let event = self.publish(Event::BlockCompleted {
            block_id: block_id.to_string(),
            unlocked,
            at: Utc::now(),
        });
        if all_done {
            self.phase = SessionPhase::Completed;
            self.active_block = None;
            self.epoch += 1;
            tracing::info!(recipe_id, "recipe completed");
            self.publish(Event::RecipeCompleted {
                recipe_id,
                at: Utc::now(),
            });
        }
        Some(event)
    }

    // ── Resets ───────────────────────────────────────────────────────

    /// Back to `Idle` with nothing selected.
    pub fn reset_recipe(&mut self) -> Event {
        self.clear_transient();
        self.recipe = None;
        self.phase = SessionPhase::Idle;
        tracing::info!("session reset");
        self.publish(Event::SessionReset {
            phase: SessionPhase::Idle,
            at: Utc::now(),
        })
    }

    /// Restart the current multi-block recipe from block selection.
    pub fn reset_multi_task(&mut self) -> Option<Event> {
        self.multi_task_recipe()?;
        self.clear_transient();
        self.phase = SessionPhase::BlockSelect;
        tracing::info!("multi-block progress reset");
        Some(self.publish(Event::SessionReset {
            phase: SessionPhase::BlockSelect,
            at: Utc::now(),
        }))
    }

    /// Clear timers and confirmations, keeping position.
    pub fn reset_progress(&mut self) -> Event {
        self.tracker.reset();
        let event = self.timers.reset();
        self.publish(event)
    }

    // ── Timers ───────────────────────────────────────────────────────

    pub fn start_timer(&mut self, action_id: &str, seconds: u64) -> Event {
        let event = self.timers.start(action_id, seconds);
        self.publish(event)
    }

    pub fn stop_timer(&mut self, action_id: &str) -> Option<Event> {
        let event = self.timers.stop(action_id)?;
        Some(self.publish(event))
    }

    /// Advance timers and scheduled notifications by one second.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = self.timers.tick();
        let anchor = self.current_anchor();
        let due = self.schedules.tick(anchor.as_ref());
        events.extend(self.notification_events(due));
        for event in &events {
            self.bus.emit(event);
        }
        events
    }

    // ── Derived views ────────────────────────────────────────────────

    pub fn progress_percent(&self) -> u8 {
        match &self.recipe {
            None => 0,
            Some(_) if self.phase == SessionPhase::Completed => 100,
            Some(AnyRecipe::Simple(r)) => self.tracker.progress_percent(r.total_actions()),
            Some(AnyRecipe::MultiTask(m)) => percent(self.completed_blocks.len(), m.blocks.len()),
        }
    }

    /// Share of a block's steps behind the user, 0..=100.
    pub fn block_progress(&self, block_id: &str) -> u8 {
        let Some(block) = self.multi_task_recipe().and_then(|r| r.block(block_id)) else {
            return 0;
        };
        if self.is_block_completed(block_id) {
            100
        } else if self.active_block.as_deref() == Some(block_id) {
            percent(self.block_step_index, block.steps.len())
        } else {
            0
        }
    }

    /// Rough minutes left. Multi-block recipes use step estimates, simple
    /// recipes their remaining timers.
    pub fn remaining_minutes(&self) -> u32 {
        if self.phase == SessionPhase::Completed {
            return 0;
        }
        match &self.recipe {
            None => 0,
            Some(AnyRecipe::Simple(r)) => {
                let secs: u64 = r
                    .steps
                    .iter()
                    .skip(self.step_index)
                    .filter_map(|s| s.timer_seconds)
                    .sum();
                secs.div_ceil(60) as u32
            }
            Some(AnyRecipe::MultiTask(m)) => m
                .blocks
                .iter()
                .filter(|b| !self.completed_blocks.contains(&b.id))
                .map(|b| {
                    if self.active_block.as_deref() == Some(b.id.as_str()) {
                        b.steps
                            .iter()
                            .skip(self.block_step_index)
                            .map(|s| s.estimated_minutes)
                            .sum::<u32>()
                    } else {
                        b.estimated_minutes
                    }
                })
                .sum(),
        }
    }

    /// Localized "Step N of M" for the step in view.
    pub fn step_caption(&self) -> Option<String> {
        let (index, total) = match self.phase {
            SessionPhase::SimpleFlow => (self.step_index, self.simple_recipe()?.steps.len()),
            SessionPhase::InBlock => (self.block_step_index, self.current_block()?.steps.len()),
            _ => return None,
        };
        if total == 0 {
            return None;
        }
        Some(format!(
            "{} {} {} {}",
            self.translate("recipe.step"),
            index + 1,
            self.translate("recipe.of"),
            total
        ))
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            session_id: self.id.to_string(),
            phase: self.phase,
            recipe_id: self.recipe.as_ref().map(AnyRecipe::id),
            step_index: self.step_index,
            block_id: self.active_block.clone(),
            block_step_index: self.block_step_index,
            completed_blocks: self.completed_blocks.iter().cloned().collect(),
            eligible_blocks: self.eligible_blocks(),
            preferred_block: self.preferred_block.clone(),
            progress_pct: self.progress_percent(),
            timers: self.timers.snapshots(),
            at: Utc::now(),
        }
    }

    // ── Language, theme, host ────────────────────────────────────────

    pub fn language(&self) -> Language {
        self.settings.language()
    }

    pub fn set_language(&mut self, language: Language) {
        if let Err(e) = self.settings.set_language(language) {
            tracing::warn!(error = %e, "language not persisted");
        }
    }

    pub fn theme(&self) -> ThemeName {
        self.settings.theme()
    }

    pub fn set_theme(&mut self, theme: ThemeName) {
        if let Err(e) = self.settings.set_theme(theme) {
            tracing::warn!(error = %e, "theme not persisted");
        }
    }

    pub fn theme_class(&self) -> String {
        self.settings.theme_class()
    }

    pub fn translate(&self, key: &str) -> String {
        self.l10n.translate(key, self.settings.language())
    }

    /// `"<n> <noun>"` with the noun inflected for the current language.
    pub fn count_label(&self, count: u64, base_key: &str) -> String {
        count_label(self.l10n.as_ref(), self.settings.language(), count, base_key)
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.host.user()
    }

    pub fn host(&self) -> &dyn HostCapabilities {
        self.host.as_ref()
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("recipe", &self.recipe.as_ref().map(AnyRecipe::id))
            .field("step_index", &self.step_index)
            .field("active_block", &self.active_block)
            .field("completed_blocks", &self.completed_blocks)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
