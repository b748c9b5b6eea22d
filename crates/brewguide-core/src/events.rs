use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recipes::{RecipeKind, TransitionKind};
use crate::session::SessionPhase;

/// Every state change in a cooking session produces an Event.
/// Front ends render from events; observers subscribe through [`EventBus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    RecipeSelected {
        recipe_id: u32,
        kind: RecipeKind,
        at: DateTime<Utc>,
    },
    StepChanged {
        step_index: usize,
        total_steps: usize,
        at: DateTime<Utc>,
    },
    StepConfirmed {
        action_id: String,
        completed_count: usize,
        at: DateTime<Utc>,
    },
    RecipeCompleted {
        recipe_id: u32,
        at: DateTime<Utc>,
    },
    BlockEntered {
        block_id: String,
        at: DateTime<Utc>,
    },
    BlockStepChanged {
        block_id: String,
        step_index: usize,
        total_steps: usize,
        at: DateTime<Utc>,
    },
    BlockLeft {
        block_id: String,
        at: DateTime<Utc>,
    },
    /// A block was completed; `unlocked` lists blocks that became
    /// eligible because of it.
    BlockCompleted {
        block_id: String,
        unlocked: Vec<String>,
        at: DateTime<Utc>,
    },
    TimerStarted {
        action_id: String,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        action_id: String,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        action_id: String,
        at: DateTime<Utc>,
    },
    TimersReset {
        at: DateTime<Utc>,
    },
    /// A scheduled cross-block hint came due while its step was still active.
    ScheduledNotification {
        kind: NotificationKind,
        source_block: String,
        target_block: Option<String>,
        message: String,
        reasoning: String,
        at: DateTime<Utc>,
    },
    SessionReset {
        phase: SessionPhase,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        session_id: String,
        phase: SessionPhase,
        recipe_id: Option<u32>,
        step_index: usize,
        block_id: Option<String>,
        block_step_index: usize,
        completed_blocks: Vec<String>,
        eligible_blocks: Vec<String>,
        preferred_block: Option<String>,
        progress_pct: u8,
        timers: Vec<TimerSnapshot>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short machine name of the variant, used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Event::RecipeSelected { .. } => "recipe_selected",
            Event::StepChanged { .. } => "step_changed",
            Event::StepConfirmed { .. } => "step_confirmed",
            Event::RecipeCompleted { .. } => "recipe_completed",
            Event::BlockEntered { .. } => "block_entered",
            Event::BlockStepChanged { .. } => "block_step_changed",
            Event::BlockLeft { .. } => "block_left",
            Event::BlockCompleted { .. } => "block_completed",
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerStopped { .. } => "timer_stopped",
            Event::TimerCompleted { .. } => "timer_completed",
            Event::TimersReset { .. } => "timers_reset",
            Event::ScheduledNotification { .. } => "scheduled_notification",
            Event::SessionReset { .. } => "session_reset",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }
}

/// What a scheduled notification asks the front end to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "action", rename_all = "kebab-case")]
pub enum NotificationKind {
    SuggestStart,
    AutoStart,
    Notification,
    /// A free-form in-block action (`schedule_action`).
    Action(String),
}

impl From<TransitionKind> for NotificationKind {
    fn from(kind: TransitionKind) -> Self {
        match kind {
            TransitionKind::SuggestStart => NotificationKind::SuggestStart,
            TransitionKind::AutoStart => NotificationKind::AutoStart,
            TransitionKind::Notification => NotificationKind::Notification,
        }
    }
}

/// Timer view included in state snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub action_id: String,
    pub remaining_secs: u64,
    pub running: bool,
    pub display: String,
}

type Observer = Box<dyn FnMut(&Event) + Send>;

/// Observer list. Mutations publish here instead of swapping containers.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Observer>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&Event) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn emit(&mut self, event: &Event) {
        tracing::trace!(event = event.name(), "emit");
        for observer in &mut self.observers {
            observer(event);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn bus_delivers_to_every_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        for _ in 0..2 {
            let seen = Arc::clone(&seen);
            bus.subscribe(move |e| seen.lock().unwrap().push(e.name()));
        }

        bus.emit(&Event::TimersReset { at: Utc::now() });
        assert_eq!(*seen.lock().unwrap(), vec!["timers_reset", "timers_reset"]);
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = Event::TimerCompleted {
            action_id: "sauce:2".into(),
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TimerCompleted");
        assert_eq!(json["action_id"], "sauce:2");
    }

    #[test]
    fn notification_kind_uses_kebab_case() {
        let json = serde_json::to_value(NotificationKind::SuggestStart).unwrap();
        assert_eq!(json["kind"], "suggest-start");
    }
}
