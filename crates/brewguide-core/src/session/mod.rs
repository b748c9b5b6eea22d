//! Cooking session state machine.
//!
//! ```text
//! Idle --select simple--> SimpleFlow --finish--> Completed
//!   \--select multi--> BlockSelect <--leave/complete-- InBlock
//!                          \--enter------------------>/
//!                          all blocks complete --> Completed
//! ```

mod controller;
pub mod schedule;

pub use controller::{default_step_label, simple_action_id, SessionController};
pub use schedule::{Anchor, DueNotification, NotificationScheduler};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPhase {
    #[default]
    Idle,
    SimpleFlow,
    BlockSelect,
    InBlock,
    Completed,
}
