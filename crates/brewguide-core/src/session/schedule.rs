//! One-shot cross-block notifications.
//!
//! A block step may carry a `schedule_transition` (hint about another
//! block) and a `schedule_action` (reminder inside the same block). Both
//! are armed when the step becomes active and count down with the session
//! ticker. A countdown belongs to the [`Anchor`] it was armed under and
//! is dropped silently on the first tick after the user moves on.

use crate::events::NotificationKind;
use crate::recipes::BlockStep;

/// The step activation a countdown belongs to. `epoch` changes on every
/// activation, so revisiting the same step yields a new anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub block_id: String,
    pub step_index: usize,
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueNotification {
    pub kind: NotificationKind,
    pub source_block: String,
    pub target_block: Option<String>,
    pub message: String,
    pub reasoning: String,
}

#[derive(Debug, Clone)]
struct Pending {
    anchor: Anchor,
    remaining_secs: u64,
    due: DueNotification,
}

#[derive(Debug, Default)]
pub struct NotificationScheduler {
    pending: Vec<Pending>,
}

impl NotificationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm every schedule `step` carries under `anchor`, which must be the
    /// activation happening now. Schedules with `trigger_after = 0` are
    /// due at once and returned instead of being queued.
    pub fn arm(&mut self, anchor: &Anchor, step: &BlockStep) -> Vec<DueNotification> {
        let mut schedules = Vec::new();
        if let Some(transition) = &step.schedule_transition {
            schedules.push((
                transition.trigger_after,
                DueNotification {
                    kind: transition.action_type.into(),
                    source_block: anchor.block_id.clone(),
                    target_block: Some(transition.target_block.clone()),
                    message: transition.message.clone(),
                    reasoning: transition.reasoning.clone(),
                },
            ));
        }
        if let Some(action) = &step.schedule_action {
            schedules.push((
                action.trigger_after,
                DueNotification {
                    kind: NotificationKind::Action(action.action_type.clone()),
                    source_block: anchor.block_id.clone(),
                    target_block: None,
                    message: action.message.clone(),
                    reasoning: action.reasoning.clone(),
                },
            ));
        }
        if schedules.is_empty() {
            return Vec::new();
        }

        let armed = schedules.len();
        let mut immediate = Vec::new();
        for (remaining_secs, due) in schedules {
            if remaining_secs == 0 {
                immediate.push(due);
            } else {
                self.pending.push(Pending {
                    anchor: anchor.clone(),
                    remaining_secs,
                    due,
                });
            }
        }
        tracing::debug!(block = %anchor.block_id, step = anchor.step_index, armed, immediate = immediate.len(), "schedules armed");
        immediate
    }

    /// Drop countdowns whose anchor is no longer `current`, advance the
    /// rest by one second and return those that came due.
    pub fn tick(&mut self, current: Option<&Anchor>) -> Vec<DueNotification> {
        self.pending.retain(|p| {
            let live = current == Some(&p.anchor);
            if !live {
                tracing::debug!(block = %p.anchor.block_id, step = p.anchor.step_index, "stale notification dropped");
            }
            live
        });

        let mut due = Vec::new();
        let mut keep = Vec::with_capacity(self.pending.len());
        for mut p in self.pending.drain(..) {
            p.remaining_secs = p.remaining_secs.saturating_sub(1);
            if p.remaining_secs > 0 {
                keep.push(p);
            } else {
                due.push(p.due);
            }
        }
        self.pending = keep;
        due
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
