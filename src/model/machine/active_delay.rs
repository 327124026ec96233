use serde::{Deserialize, Serialize};

use super::TimerHandle;
use crate::model::TabId;

/// Debounce between a tab activation and committing it to history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ActiveDelay {
    #[default]
    Idle,
    Pending { handle: TimerHandle, tab_id: TabId },
}

impl ActiveDelay {
    pub fn cancel(self) -> (Self, Option<TimerHandle>) { (ActiveDelay::Idle, self.handle()) }

    /// Consumes the pending activation if `handle` is the one that is waiting.
    pub fn fire(self, handle: TimerHandle) -> (Self, Option<TabId>) {
        match self {
            ActiveDelay::Pending { handle: live, tab_id } if live == handle => {
                (ActiveDelay::Idle, Some(tab_id))
            }
            other => (other, None),
        }
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        match *self {
            ActiveDelay::Pending { handle, .. } => Some(handle),
            ActiveDelay::Idle => None,
        }
    }

    pub fn tab_id(&self) -> Option<TabId> {
        match *self {
            ActiveDelay::Pending { tab_id, .. } => Some(tab_id),
            ActiveDelay::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_fire_is_ignored() {
        let delay = ActiveDelay::Pending { handle: TimerHandle::new(2), tab_id: TabId::new(9) };
        let (still, committed) = delay.fire(TimerHandle::new(1));
        assert_eq!(still, delay);
        assert_eq!(committed, None);
        let (idle, committed) = delay.fire(TimerHandle::new(2));
        assert_eq!(idle, ActiveDelay::Idle);
        assert_eq!(committed, Some(TabId::new(9)));
    }
}
