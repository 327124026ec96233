use serde::{Deserialize, Serialize};

use super::TimerHandle;
use crate::common::collections::BTreeMap;
use crate::model::TabId;

/// A keyboard tab-selection session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PickMode {
    #[default]
    Idle,
    Active {
        close_mode: bool,
        handle: TimerHandle,
        /// Identifies the session across re-arms; replies from an older
        /// session are dropped.
        session: u64,
        labels: BTreeMap<TabId, String>,
    },
}

impl PickMode {
    /// Enters pick mode, or re-arms the inactivity timeout of the running
    /// session. Returns the timeout handle the caller must cancel.
    pub fn start(
        self,
        close_mode: bool,
        handle: TimerHandle,
        new_session: u64,
    ) -> (Self, Option<TimerHandle>) {
        match self {
            PickMode::Active {
                close_mode: live_mode,
                handle: old,
                session,
                labels,
            } => (
                PickMode::Active {
                    close_mode: live_mode,
                    handle,
                    session,
                    labels,
                },
                Some(old),
            ),
            PickMode::Idle => (
                PickMode::Active {
                    close_mode,
                    handle,
                    session: new_session,
                    labels: BTreeMap::new(),
                },
                None,
            ),
        }
    }

    pub fn end(self) -> (Self, Option<TimerHandle>) { (PickMode::Idle, self.handle()) }

    pub fn handle(&self) -> Option<TimerHandle> {
        match self {
            PickMode::Active { handle, .. } => Some(*handle),
            PickMode::Idle => None,
        }
    }

    pub fn session(&self) -> Option<u64> {
        match self {
            PickMode::Active { session, .. } => Some(*session),
            PickMode::Idle => None,
        }
    }

    pub fn close_mode(&self) -> bool { matches!(self, PickMode::Active { close_mode: true, .. }) }

    pub fn is_active(&self) -> bool { matches!(self, PickMode::Active { .. }) }

    pub fn is_current(&self, handle: TimerHandle) -> bool { self.handle() == Some(handle) }

    pub fn label(&self, tab: TabId) -> Option<&str> {
        match self {
            PickMode::Active { labels, .. } => labels.get(&tab).map(String::as_str),
            PickMode::Idle => None,
        }
    }

    pub fn set_labels(&mut self, assigned: BTreeMap<TabId, String>) {
        if let PickMode::Active { labels, .. } = self {
            *labels = assigned;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rearm_keeps_session_identity() {
        let (active, old) = PickMode::Idle.start(true, TimerHandle::new(1), 10);
        assert_eq!(old, None);
        assert_eq!(active.session(), Some(10));

        let (rearmed, old) = active.start(false, TimerHandle::new(2), 11);
        assert_eq!(old, Some(TimerHandle::new(1)));
        assert_eq!(rearmed.session(), Some(10));
        assert!(rearmed.close_mode());
        assert!(rearmed.is_current(TimerHandle::new(2)));
        assert!(!rearmed.is_current(TimerHandle::new(1)));
    }

    #[test]
    fn end_returns_the_timeout_to_cancel() {
        let (mut active, _) = PickMode::Idle.start(false, TimerHandle::new(3), 1);
        active.set_labels(BTreeMap::from([(TabId::new(4), "a".to_string())]));
        assert_eq!(active.label(TabId::new(4)), Some("a"));
        let (idle, cancel) = active.end();
        assert_eq!(cancel, Some(TimerHandle::new(3)));
        assert!(!idle.is_active());
        assert_eq!(idle.label(TabId::new(4)), None);
    }
}
