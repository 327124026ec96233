use serde::{Deserialize, Serialize};

use super::TimerHandle;

/// Whether titles carry a live auto-close countdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Countdown {
    #[default]
    Off,
    On { handle: TimerHandle },
}

impl Countdown {
    pub fn is_on(&self) -> bool { matches!(self, Countdown::On { .. }) }

    pub fn is_current(&self, handle: TimerHandle) -> bool {
        matches!(*self, Countdown::On { handle: live } if live == handle)
    }

    pub fn turn_off(self) -> (Self, Option<TimerHandle>) {
        match self {
            Countdown::On { handle } => (Countdown::Off, Some(handle)),
            Countdown::Off => (Countdown::Off, None),
        }
    }
}
