//! Step confirmation tracking.
//!
//! Records the action ids the user explicitly acknowledged and derives
//! completion figures from them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTracker {
    confirmed: BTreeSet<String>,
}

impl StepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `action_id` was not confirmed before.
    pub fn confirm(&mut self, action_id: &str) -> bool {
        self.confirmed.insert(action_id.to_string())
    }

    pub fn is_confirmed(&self, action_id: &str) -> bool {
        self.confirmed.contains(action_id)
    }

    pub fn completed_count(&self) -> usize {
        self.confirmed.len()
    }

    pub fn all_completed(&self, total_steps: usize) -> bool {
        self.completed_count() >= total_steps
    }

    /// Rounded percentage, 0..=100. Zero steps count as done.
    pub fn progress_percent(&self, total_steps: usize) -> u8 {
        if total_steps == 0 {
            return 100;
        }
        let pct = (self.completed_count() as f64 / total_steps as f64 * 100.0).round();
        pct.min(100.0) as u8
    }

    pub fn confirmed(&self) -> impl Iterator<Item = &str> {
        self.confirmed.iter().map(String::as_str)
    }

    pub fn reset(&mut self) {
        self.confirmed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_is_complete() {
        let tracker = StepTracker::new();
        assert_eq!(tracker.progress_percent(0), 100);
        assert!(tracker.all_completed(0));
    }

    #[test]
    fn confirm_is_idempotent() {
        let mut tracker = StepTracker::new();
        assert!(tracker.confirm("Смешано"));
        assert!(!tracker.confirm("Смешано"));
        assert_eq!(tracker.completed_count(), 1);
        assert!(tracker.is_confirmed("Смешано"));
    }

    #[test]
    fn percent_rounds_to_nearest() {
        let mut tracker = StepTracker::new();
        tracker.confirm("a");
        assert_eq!(tracker.progress_percent(3), 33);
        tracker.confirm("b");
        assert_eq!(tracker.progress_percent(3), 67);
        tracker.confirm("c");
        tracker.confirm("d");
        assert_eq!(tracker.progress_percent(3), 100);
        assert!(tracker.all_completed(3));
    }

    #[test]
    fn reset_clears_everything() {
        let mut tracker = StepTracker::new();
        tracker.confirm("a");
        tracker.reset();
        assert_eq!(tracker.completed_count(), 0);
        assert!(!tracker.is_confirmed("a"));
    }
}
