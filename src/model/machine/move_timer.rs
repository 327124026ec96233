use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::TimerHandle;
use crate::model::{TabId, Timestamp};

/// The dwell timer that moves the active tab to the front of its window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MoveTimer {
    #[default]
    Idle,
    Running {
        tab_id: TabId,
        initial_duration: Duration,
        handle: TimerHandle,
        started_at: Timestamp,
    },
    Paused {
        tab_id: TabId,
        remaining: Duration,
        initial_duration: Duration,
        paused_at: Timestamp,
    },
}

impl MoveTimer {
    pub fn running(tab_id: TabId, duration: Duration, handle: TimerHandle, now: Timestamp) -> Self {
        MoveTimer::Running {
            tab_id,
            initial_duration: duration,
            handle,
            started_at: now,
        }
    }

    /// A timer that waits for the pointer before it starts counting.
    pub fn paused(tab_id: TabId, duration: Duration, now: Timestamp) -> Self {
        MoveTimer::Paused {
            tab_id,
            remaining: duration,
            initial_duration: duration,
            paused_at: now,
        }
    }

    /// Stops the clock on a running timer. Returns the handle to cancel.
    pub fn pause(self, now: Timestamp) -> (Self, Option<TimerHandle>) {
        match self {
            MoveTimer::Running {
                tab_id,
                initial_duration,
                handle,
                started_at,
            } => {
                let elapsed = Duration::from_millis(u64::try_from(now - started_at).unwrap_or(0));
                let paused = MoveTimer::Paused {
                    tab_id,
                    remaining: initial_duration.saturating_sub(elapsed),
                    initial_duration,
                    paused_at: now,
                };
                (paused, Some(handle))
            }
            other => (other, None),
        }
    }

    /// What a resume would restart, if anything is left to wait for.
    pub fn resumable(&self) -> Option<(TabId, Duration)> {
        match *self {
            MoveTimer::Paused { tab_id, remaining, .. } if !remaining.is_zero() => {
                Some((tab_id, remaining))
            }
            _ => None,
        }
    }

    pub fn cancel(self) -> (Self, Option<TimerHandle>) { (MoveTimer::Idle, self.handle()) }

    pub fn handle(&self) -> Option<TimerHandle> {
        match *self {
            MoveTimer::Running { handle, .. } => Some(handle),
            _ => None,
        }
    }

    pub fn tab_id(&self) -> Option<TabId> {
        match *self {
            MoveTimer::Idle => None,
            MoveTimer::Running { tab_id, .. } | MoveTimer::Paused { tab_id, .. } => Some(tab_id),
        }
    }

    /// True only for the running timer that was scheduled with `handle`.
    pub fn is_current(&self, handle: TimerHandle) -> bool { self.handle() == Some(handle) }

    pub fn is_idle(&self) -> bool { matches!(self, MoveTimer::Idle) }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const TAB: TabId = TabId::new(7);

    #[test]
    fn pause_keeps_the_unspent_duration() {
        let timer = MoveTimer::running(TAB, Duration::from_millis(5000), TimerHandle::new(1), 1000);
        let (paused, cancel) = timer.pause(3000);
        assert_eq!(cancel, Some(TimerHandle::new(1)));
        assert_eq!(
            paused,
            MoveTimer::Paused {
                tab_id: TAB,
                remaining: Duration::from_millis(3000),
                initial_duration: Duration::from_millis(5000),
                paused_at: 3000,
            }
        );
        assert_eq!(paused.resumable(), Some((TAB, Duration::from_millis(3000))));
    }

    #[test]
    fn pause_after_expiry_clamps_to_zero() {
        let timer = MoveTimer::running(TAB, Duration::from_millis(500), TimerHandle::new(1), 0);
        let (paused, _) = timer.pause(9000);
        assert_eq!(paused.resumable(), None);
        assert_eq!(paused.tab_id(), Some(TAB));
    }

    #[test]
    fn pausing_a_paused_timer_changes_nothing() {
        let timer = MoveTimer::paused(TAB, Duration::from_secs(5), 0);
        assert_eq!(timer.pause(100), (timer, None));
    }

    #[test]
    fn only_the_live_handle_is_current() {
        let timer = MoveTimer::running(TAB, Duration::from_secs(1), TimerHandle::new(4), 0);
        assert!(timer.is_current(TimerHandle::new(4)));
        assert!(!timer.is_current(TimerHandle::new(3)));
        let (idle, cancel) = timer.cancel();
        assert_eq!(cancel, Some(TimerHandle::new(4)));
        assert!(!idle.is_current(TimerHandle::new(4)));
        assert!(idle.is_idle());
    }
}
