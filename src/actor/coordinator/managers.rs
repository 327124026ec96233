use serde::Serialize;
use tracing::trace;

use super::SweepId;
use super::replay::Record;
use crate::actor::{host_bridge, timer};
use crate::common::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use crate::common::config::Settings;
use crate::model::machine::{
    ActiveDelay, AutoClose, Countdown, Cycle, MouseTracker, MoveTimer, PickMode, TimerHandle,
};
use crate::model::{Tab, TabHistory, TabId, Timestamp};
use crate::sys::host::NotificationItem;

/// Activation times, recency order and the new-tab pages still waiting for a
/// real URL.
pub struct ActivityManager {
    pub last_activated: BTreeMap<TabId, Timestamp>,
    pub history: TabHistory,
    pub new_tabs: BTreeSet<TabId>,
}

impl ActivityManager {
    pub fn new(last_activated: BTreeMap<TabId, Timestamp>) -> Self {
        ActivityManager {
            last_activated,
            history: TabHistory::new(),
            new_tabs: BTreeSet::new(),
        }
    }

    pub fn seed_history(&mut self, tabs: impl IntoIterator<Item = TabId>) {
        self.history = TabHistory::from_recency(tabs, &self.last_activated);
    }

    /// Drops everything known about a closed tab. Returns whether persisted
    /// state changed.
    pub fn forget(&mut self, tab_id: TabId) -> bool {
        self.history.remove(tab_id);
        self.new_tabs.remove(&tab_id);
        self.last_activated.remove(&tab_id).is_some()
    }
}

/// Soft pins live here; native pins are owned by the host and only cached.
#[derive(Default)]
pub struct PinManager {
    soft: BTreeSet<TabId>,
    native: HashSet<TabId>,
}

impl PinManager {
    pub fn new(soft: BTreeSet<TabId>) -> Self {
        PinManager { soft, native: HashSet::default() }
    }

    pub fn soft(&self) -> &BTreeSet<TabId> { &self.soft }

    pub fn is_pinned(&self, tab_id: TabId) -> bool {
        self.soft.contains(&tab_id) || self.native.contains(&tab_id)
    }

    /// Records the native flag from a host snapshot. Returns true when that
    /// evicted a soft pin.
    pub fn observe(&mut self, tab: &Tab) -> bool { self.set_native(tab.id, tab.pinned) }

    pub fn set_native(&mut self, tab_id: TabId, pinned: bool) -> bool {
        if pinned {
            self.native.insert(tab_id);
            self.soft.remove(&tab_id)
        } else {
            self.native.remove(&tab_id);
            false
        }
    }

    /// Flips the soft pin and returns the new value.
    pub fn toggle_soft(&mut self, tab_id: TabId) -> bool {
        if self.soft.remove(&tab_id) {
            false
        } else {
            self.soft.insert(tab_id);
            true
        }
    }

    /// Returns true when a soft pin was dropped.
    pub fn forget(&mut self, tab_id: TabId) -> bool {
        self.native.remove(&tab_id);
        self.soft.remove(&tab_id)
    }
}

/// The unannotated title of every tab whose title this crate has touched.
#[derive(Default)]
pub struct TitleManager {
    pub originals: HashMap<TabId, String>,
}

impl TitleManager {
    pub fn original(&self, tab_id: TabId) -> Option<&str> {
        self.originals.get(&tab_id).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Machines {
    pub mouse: MouseTracker,
    pub move_timer: MoveTimer,
    pub active_delay: ActiveDelay,
    pub pick_mode: PickMode,
    pub cycle: Cycle,
    pub countdown: Countdown,
    pub auto_close: AutoClose,
}

impl Machines {
    pub fn new(settings: &Settings) -> Self {
        Machines {
            auto_close: AutoClose::from_enabled(settings.auto_close_enabled),
            ..Machines::default()
        }
    }
}

/// One pass of the idle-tab sweeper. It finishes when every candidate has
/// been probed and, where needed, closed.
#[derive(Default)]
struct Sweep {
    pending: usize,
    closed: Vec<NotificationItem>,
}

#[derive(Default)]
pub struct SweepManager {
    next: u64,
    active: BTreeMap<SweepId, Sweep>,
}

impl SweepManager {
    pub fn begin(&mut self) -> SweepId {
        self.next += 1;
        let id = SweepId::new(self.next);
        self.active.insert(id, Sweep::default());
        id
    }

    /// Counts one more candidate still in flight.
    pub fn expect(&mut self, sweep: SweepId) {
        if let Some(sweep) = self.active.get_mut(&sweep) {
            sweep.pending += 1;
        }
    }

    pub fn record_closed(&mut self, sweep: SweepId, item: NotificationItem) {
        if let Some(sweep) = self.active.get_mut(&sweep) {
            sweep.closed.push(item);
        }
    }

    /// Resolves one candidate. Returns the closed tabs once the whole sweep
    /// is done.
    pub fn settle(&mut self, sweep: SweepId) -> Option<Vec<NotificationItem>> {
        let state = self.active.get_mut(&sweep)?;
        state.pending = state.pending.saturating_sub(1);
        if state.pending > 0 {
            return None;
        }
        self.finish(sweep)
    }

    pub fn finish(&mut self, sweep: SweepId) -> Option<Vec<NotificationItem>> {
        let state = self.active.remove(&sweep)?;
        trace!(sweep = sweep.get(), closed = state.closed.len(), "sweep finished");
        Some(state.closed)
    }

    pub fn is_idle(&self, sweep: SweepId) -> bool {
        self.active.get(&sweep).is_some_and(|s| s.pending == 0)
    }

    pub fn in_flight(&self) -> usize { self.active.len() }
}

/// Outbound channels and the counters behind fresh handles.
pub struct CommunicationManager {
    pub host_tx: host_bridge::Sender,
    pub timer_tx: timer::Sender,
    next_timer: u64,
    next_pick_session: u64,
}

impl CommunicationManager {
    pub fn new(host_tx: host_bridge::Sender, timer_tx: timer::Sender) -> Self {
        CommunicationManager {
            host_tx,
            timer_tx,
            next_timer: 0,
            next_pick_session: 0,
        }
    }

    pub fn next_timer_handle(&mut self) -> TimerHandle {
        self.next_timer += 1;
        TimerHandle::new(self.next_timer)
    }

    pub fn next_pick_session(&mut self) -> u64 {
        self.next_pick_session += 1;
        self.next_pick_session
    }
}

pub struct RecordingManager {
    pub record: Record,
}
