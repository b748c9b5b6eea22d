//! Countdown timer engine.
//!
//! Holds any number of countdowns keyed by an action identifier. It does
//! not use internal threads - the caller is responsible for calling
//! `tick()` once per second.
//!
//! ## Timer lifecycle
//!
//! ```text
//! (absent) -> Running -> Expired        (reached zero, callback fired)
//!                     -> Stopped        (stopped early, remaining kept)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timers = TimerEngine::new();
//! timers.on_complete(|action| println!("{action} done"));
//! timers.start("Спагетти готовы", 300);
//! // Once per second:
//! let events = timers.tick();
//! ```

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::{Event, TimerSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Running,
    /// Stopped by the user before reaching zero.
    Stopped,
    /// Reached zero on its own.
    Expired,
}

/// One countdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTimer {
    pub duration_secs: u64,
    pub remaining_secs: u64,
    pub running: bool,
}

impl ActionTimer {
    pub fn state(&self) -> TimerState {
        if self.running {
            TimerState::Running
        } else if self.remaining_secs == 0 {
            TimerState::Expired
        } else {
            TimerState::Stopped
        }
    }
}

type CompletionCallback = Box<dyn FnMut(&str) + Send>;

/// Independent countdown timers keyed by action id.
#[derive(Default)]
pub struct TimerEngine {
    timers: BTreeMap<String, ActionTimer>,
    on_complete: Option<CompletionCallback>,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the callback run once when a timer reaches zero
    /// (e.g. play a sound). Replaces any previous callback.
    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get(&self, action_id: &str) -> Option<&ActionTimer> {
        self.timers.get(action_id)
    }

    /// Remaining seconds, 0 for unknown ids.
    pub fn time_left(&self, action_id: &str) -> u64 {
        self.get(action_id).map(|t| t.remaining_secs).unwrap_or(0)
    }

    pub fn is_active(&self, action_id: &str) -> bool {
        self.get(action_id)
            .map(|t| t.running && t.remaining_secs > 0)
            .unwrap_or(false)
    }

    /// True only for timers that ran out on their own.
    pub fn is_completed(&self, action_id: &str) -> bool {
        self.get(action_id)
            .map(|t| t.remaining_secs == 0 && !t.running)
            .unwrap_or(false)
    }

    /// `M:SS`, minutes not wrapped at 60.
    pub fn format_time(&self, action_id: &str) -> String {
        format_clock(self.time_left(action_id))
    }

    pub fn running_count(&self) -> usize {
        self.timers.values().filter(|t| t.running).count()
    }

    pub fn snapshots(&self) -> Vec<TimerSnapshot> {
        self.timers
            .iter()
            .map(|(id, t)| TimerSnapshot {
                action_id: id.clone(),
                remaining_secs: t.remaining_secs,
                running: t.running,
                display: format_clock(t.remaining_secs),
            })
            .collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or restart) the countdown for `action_id`.
    pub fn start(&mut self, action_id: &str, seconds: u64) -> Event {
        let replaced = self
            .timers
            .insert(
                action_id.to_string(),
                ActionTimer {
                    duration_secs: seconds,
                    remaining_secs: seconds,
                    running: true,
                },
            )
            .is_some();
        tracing::debug!(action_id, seconds, replaced, "timer started");
        Event::TimerStarted {
            action_id: action_id.to_string(),
            duration_secs: seconds,
            at: Utc::now(),
        }
    }

    /// Halt a running timer, keeping its remaining time.
    pub fn stop(&mut self, action_id: &str) -> Option<Event> {
        let timer = self.timers.get_mut(action_id)?;
        if !timer.running {
            return None;
        }
        timer.running = false;
        tracing::debug!(action_id, remaining = timer.remaining_secs, "timer stopped");
        Some(Event::TimerStopped {
            action_id: action_id.to_string(),
            remaining_secs: timer.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Advance every running timer by one second. Timers that reach zero
    /// stop, fire the completion callback once and yield `TimerCompleted`.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut finished = Vec::new();
        for (id, timer) in self.timers.iter_mut().filter(|(_, t)| t.running) {
            timer.remaining_secs = timer.remaining_secs.saturating_sub(1);
            if timer.remaining_secs == 0 {
                timer.running = false;
                finished.push(id.clone());
            }
        }

        finished
            .into_iter()
            .map(|action_id| {
                tracing::debug!(action_id = %action_id, "timer completed");
                if let Some(callback) = self.on_complete.as_mut() {
                    callback(&action_id);
                }
                Event::TimerCompleted {
                    action_id,
                    at: Utc::now(),
                }
            })
            .collect()
    }

    /// Stop and forget every timer. Ticks afterwards are no-ops.
    pub fn reset(&mut self) -> Event {
        let dropped = self.timers.len();
        self.timers.clear();
        tracing::debug!(dropped, "timers reset");
        Event::TimersReset { at: Utc::now() }
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("timers", &self.timers)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Render seconds as `M:SS`.
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
