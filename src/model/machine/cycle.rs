use serde::{Deserialize, Serialize};

use super::TimerHandle;
use crate::common::collections::BTreeSet;
use crate::model::{TabHistory, TabId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward older tabs.
    Backward,
    /// Toward more recent tabs.
    Forward,
}

impl Direction {
    fn step(self) -> isize {
        match self {
            Direction::Backward => 1,
            Direction::Forward => -1,
        }
    }
}

/// A timed walk through recency history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Cycle {
    #[default]
    Idle,
    Active {
        original_tab: TabId,
        current_index: usize,
        handle: TimerHandle,
        /// Tabs this session asked the host to activate. Their activation
        /// events belong to the session, however late they arrive.
        requested: BTreeSet<TabId>,
    },
}

impl Cycle {
    pub fn start(original_tab: TabId, index: usize, target: TabId, handle: TimerHandle) -> Self {
        Cycle::Active {
            original_tab,
            current_index: index,
            handle,
            requested: BTreeSet::from([target]),
        }
    }

    /// Moves an active session to `index`. Returns the timeout to cancel.
    pub fn advance(
        &mut self,
        index: usize,
        target: TabId,
        new_handle: TimerHandle,
    ) -> Option<TimerHandle> {
        match self {
            Cycle::Active {
                current_index,
                handle,
                requested,
                ..
            } => {
                *current_index = index;
                requested.insert(target);
                Some(std::mem::replace(handle, new_handle))
            }
            Cycle::Idle => None,
        }
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        match *self {
            Cycle::Active { handle, .. } => Some(handle),
            Cycle::Idle => None,
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        match *self {
            Cycle::Active { current_index, .. } => Some(current_index),
            Cycle::Idle => None,
        }
    }

    pub fn is_current(&self, handle: TimerHandle) -> bool { self.handle() == Some(handle) }

    pub fn is_active(&self) -> bool { matches!(self, Cycle::Active { .. }) }

    pub fn original_tab(&self) -> Option<TabId> {
        match *self {
            Cycle::Active { original_tab, .. } => Some(original_tab),
            Cycle::Idle => None,
        }
    }

    pub fn was_requested(&self, tab: TabId) -> bool {
        matches!(self, Cycle::Active { requested, .. } if requested.contains(&tab))
    }

    pub fn end(self) -> (Self, Option<TimerHandle>) { (Cycle::Idle, self.handle()) }
}

/// The next history index for a cycle step. Skips `original` unless it is the
/// only candidate.
pub fn next_index(
    current: usize,
    direction: Direction,
    history: &TabHistory,
    original: TabId,
) -> usize {
    let len = history.len();
    if len < 2 {
        return current;
    }
    let len = len as isize;
    let step = |from: isize| (from + direction.step()).rem_euclid(len);
    let mut probe = current as isize;
    for _ in 0..len {
        probe = step(probe);
        if history.get(probe as usize) != Some(original) {
            return probe as usize;
        }
    }
    step(current as isize) as usize
}
