mod engine;

pub use engine::{format_clock, ActionTimer, TimerEngine, TimerState};
