//! Per-feature state machines.
//!
//! Each machine is a plain value. Transitions consume the old value and hand
//! back the new one, plus whatever timer handle the caller now has to cancel.
//! None of them schedule anything themselves; the coordinator owns the timer
//! actor and threads handles through.

pub mod active_delay;
pub mod auto_close;
pub mod countdown;
pub mod cycle;
pub mod mouse;
pub mod move_timer;
pub mod pick_mode;

use std::fmt;

pub use active_delay::ActiveDelay;
pub use auto_close::AutoClose;
pub use countdown::Countdown;
pub use cycle::{Cycle, Direction};
pub use mouse::MouseTracker;
pub use move_timer::MoveTimer;
pub use pick_mode::PickMode;
use serde::{Deserialize, Serialize};

/// Identifies one scheduled timer. Handles are never reused, so a fire whose
/// handle no longer matches the live state is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub const fn new(raw: u64) -> Self { Self(raw) }

    pub const fn get(self) -> u64 { self.0 }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "timer#{}", self.0) }
}

/// Which machine a timer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    MoveTimer,
    ActiveDelay,
    PickTimeout,
    CycleTimeout,
    CountdownTick,
}
