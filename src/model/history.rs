use serde::{Deserialize, Serialize};

use super::{TabId, Timestamp};
use crate::common::collections::BTreeMap;

/// Tabs ordered most recently activated first. Never holds duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabHistory(Vec<TabId>);

impl TabHistory {
    pub fn new() -> Self { Self::default() }

    /// Seeds history from recorded activation times. Tabs with no record sort
    /// last; ties keep the order they were given in.
    pub fn from_recency(
        tabs: impl IntoIterator<Item = TabId>,
        last_activated: &BTreeMap<TabId, Timestamp>,
    ) -> Self {
        let mut ids: Vec<TabId> = Vec::new();
        for id in tabs {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids.sort_by_key(|id| std::cmp::Reverse(last_activated.get(id).copied().unwrap_or(0)));
        Self(ids)
    }

    pub fn touch(&mut self, tab: TabId) { self.insert_at(0, tab); }

    /// Moves `tab` to `pos`, dropping any earlier occurrence first.
    pub fn insert_at(&mut self, pos: usize, tab: TabId) {
        self.remove(tab);
        let pos = pos.min(self.0.len());
        self.0.insert(pos, tab);
    }

    pub fn remove(&mut self, tab: TabId) -> bool {
        let before = self.0.len();
        self.0.retain(|id| *id != tab);
        self.0.len() != before
    }

    pub fn position(&self, tab: TabId) -> Option<usize> { self.0.iter().position(|id| *id == tab) }

    pub fn contains(&self, tab: TabId) -> bool { self.0.contains(&tab) }

    pub fn get(&self, index: usize) -> Option<TabId> { self.0.get(index).copied() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn as_slice(&self) -> &[TabId] { &self.0 }
}

impl From<Vec<TabId>> for TabHistory {
    fn from(ids: Vec<TabId>) -> Self {
        let mut history = TabHistory::new();
        for id in ids.into_iter().rev() {
            history.touch(id);
        }
        history
    }
}
