use std::sync::Arc;
use std::time::Duration;

use super::{Coordinator, Event, Record, Snapshot};
use crate::actor::{self, host_bridge, timer};
use crate::common::collections::BTreeSet;
use crate::common::config::Settings;
use crate::model::machine::{TimerHandle, TimerKind};
use crate::model::{Tab, TabId, TabUpdate, Timestamp};
use crate::sys::clock::ManualClock;
use crate::sys::host::{Notification, Script, TabPosition};
use crate::sys::store::LocalState;

pub const START: Timestamp = 1_700_000_000_000;

pub fn tab(id: u32, index: usize) -> Tab {
    Tab {
        id: TabId::new(id),
        index,
        url: Some(format!("https://{id}.test/")),
        title: format!("Tab {id}"),
        ..Tab::default()
    }
}

/// A window holding `ids` in order with `active` selected.
pub fn window(ids: &[u32], active: u32) -> Vec<Tab> {
    ids.iter()
        .enumerate()
        .map(|(index, &id)| Tab { active: id == active, ..tab(id, index) })
        .collect()
}

pub fn id(raw: u32) -> TabId { TabId::new(raw) }

/// Drives a coordinator synchronously. Host calls are answered from
/// `window` as soon as they are made, and their effects applied to it.
pub struct Harness {
    pub coordinator: Coordinator,
    pub clock: ManualClock,
    pub window: Vec<Tab>,
    pub unsaved: BTreeSet<TabId>,
    /// Parks `UnsavedChecked` replies until `release_unsaved_checks`.
    pub hold_unsaved_checks: bool,
    held: Vec<Event>,
    pub requests: Vec<host_bridge::Request>,
    pub timers: Vec<timer::Request>,
    host_rx: host_bridge::Receiver,
    timer_rx: timer::Receiver,
}

impl Harness {
    pub fn new(settings: Settings, window: Vec<Tab>) -> Self {
        Self::with_state(settings, LocalState::default(), window)
    }

    pub fn with_state(settings: Settings, state: LocalState, window: Vec<Tab>) -> Self {
        let clock = ManualClock::new(START);
        let (host_tx, host_rx) = actor::channel();
        let (timer_tx, timer_rx) = actor::channel();
        let coordinator = Coordinator::new(
            settings,
            state,
            Arc::new(clock.clone()),
            host_tx,
            timer_tx,
            Record::disabled(),
        );
        Harness {
            coordinator,
            clock,
            window,
            unsaved: BTreeSet::new(),
            hold_unsaved_checks: false,
            held: Vec::new(),
            requests: Vec::new(),
            timers: Vec::new(),
            host_rx,
            timer_rx,
        }
    }

    /// Sends `Startup` and lets history seed from the window.
    pub fn started(mut self) -> Self {
        self.send(Event::Startup);
        self.requests.clear();
        self
    }

    pub fn send(&mut self, event: Event) {
        self.coordinator.handle_event(event);
        self.settle();
    }

    pub fn advance(&mut self, millis: u64) { self.clock.advance(Duration::from_millis(millis)); }

    pub fn snapshot(&self) -> Snapshot { self.coordinator.snapshot() }

    pub fn history(&self) -> Vec<TabId> { self.snapshot().history }

    fn settle(&mut self) {
        loop {
            while let Ok((_, request)) = self.timer_rx.try_recv() {
                self.timers.push(request);
            }
            let Ok((_, request)) = self.host_rx.try_recv() else {
                break;
            };
            let reply = self.answer(&request);
            self.requests.push(request);
            match reply {
                Some(reply @ Event::UnsavedChecked { .. }) if self.hold_unsaved_checks => {
                    self.held.push(reply)
                }
                Some(reply) => self.coordinator.handle_event(reply),
                None => {}
            }
        }
    }

    /// Delivers the parked unsaved-check replies in order.
    pub fn release_unsaved_checks(&mut self) {
        for reply in std::mem::take(&mut self.held) {
            self.coordinator.handle_event(reply);
            self.settle();
        }
    }

    fn answer(&mut self, request: &host_bridge::Request) -> Option<Event> {
        use host_bridge::Request::*;
        match request {
            QueryTabs { query, then } => Some(Event::TabsQueried {
                then: then.clone(),
                tabs: self.window.iter().filter(|t| query.matches(t)).cloned().collect(),
            }),
            GetTab { tab_id, then } => Some(Event::TabFetched {
                then: then.clone(),
                tab_id: *tab_id,
                tab: self.find(*tab_id).cloned(),
            }),
            RemoveTabs { tabs, then } => {
                let removed = tabs.iter().all(|id| self.find(*id).is_some());
                self.window.retain(|t| !tabs.contains(&t.id));
                self.reindex();
                then.clone().map(|then| Event::TabsRemoved { then, removed })
            }
            CheckUnsaved { sweep, tab } => Some(Event::UnsavedChecked {
                sweep: *sweep,
                tab: tab.clone(),
                has_unsaved_changes: self.unsaved.contains(&tab.id),
            }),
            MoveTab { tab_id, position } => {
                if let Some(from) = self.window.iter().position(|t| t.id == *tab_id) {
                    let moved = self.window.remove(from);
                    let to = match *position {
                        TabPosition::Index(index) => index.min(self.window.len()),
                        TabPosition::End => self.window.len(),
                    };
                    self.window.insert(to, moved);
                    self.reindex();
                }
                None
            }
            UpdateTab { tab_id, update } if update.active => {
                for tab in &mut self.window {
                    tab.active = tab.id == *tab_id;
                }
                None
            }
            Inject { tab_id, script: Script::SetTitle { title }, .. } => {
                if let Some(tab) = self.window.iter_mut().find(|t| t.id == *tab_id) {
                    tab.title = title.clone();
                }
                None
            }
            _ => None,
        }
    }

    fn find(&self, id: TabId) -> Option<&Tab> { self.window.iter().find(|t| t.id == id) }

    fn reindex(&mut self) {
        for (index, tab) in self.window.iter_mut().enumerate() {
            tab.index = index;
        }
    }

    pub fn title_of(&self, raw: u32) -> String {
        self.find(id(raw)).map(|t| t.title.clone()).unwrap_or_default()
    }

    /// Most recent timer of `kind`.
    pub fn last_timer(&self, kind: TimerKind) -> TimerHandle {
        self.timers
            .iter()
            .rev()
            .find_map(|request| match *request {
                timer::Request::Once { handle, kind: k, .. }
                | timer::Request::Every { handle, kind: k, .. }
                    if k == kind =>
                {
                    Some(handle)
                }
                _ => None,
            })
            .unwrap_or_else(|| panic!("no {kind:?} timer was scheduled"))
    }

    pub fn timer_delay(&self, handle: TimerHandle) -> Duration {
        self.timers
            .iter()
            .find_map(|request| match *request {
                timer::Request::Once { handle: h, after, .. } if h == handle => Some(after),
                timer::Request::Every { handle: h, period, .. } if h == handle => Some(period),
                _ => None,
            })
            .unwrap_or_else(|| panic!("{handle} was never scheduled"))
    }

    pub fn was_cancelled(&self, handle: TimerHandle) -> bool {
        self.timers
            .iter()
            .any(|request| matches!(request, timer::Request::Cancel(h) if *h == handle))
    }

    pub fn scheduled(&self, kind: TimerKind) -> usize {
        self.timers
            .iter()
            .filter(|request| {
                matches!(request,
                    timer::Request::Once { kind: k, .. } | timer::Request::Every { kind: k, .. }
                    if *k == kind)
            })
            .count()
    }

    pub fn fire(&mut self, handle: TimerHandle) {
        let kind = self
            .timers
            .iter()
            .find_map(|request| match *request {
                timer::Request::Once { handle: h, kind, .. }
                | timer::Request::Every { handle: h, kind, .. }
                    if h == handle =>
                {
                    Some(kind)
                }
                _ => None,
            })
            .unwrap_or_else(|| panic!("{handle} was never scheduled"));
        self.send(Event::TimerFired { handle, kind });
    }

    pub fn moves(&self) -> Vec<(TabId, TabPosition)> {
        self.requests
            .iter()
            .filter_map(|request| match *request {
                host_bridge::Request::MoveTab { tab_id, position } => Some((tab_id, position)),
                _ => None,
            })
            .collect()
    }

    pub fn activations(&self) -> Vec<(TabId, TabUpdate)> {
        self.requests
            .iter()
            .filter_map(|request| match *request {
                host_bridge::Request::UpdateTab { tab_id, update } => Some((tab_id, update)),
                _ => None,
            })
            .collect()
    }

    pub fn removals(&self) -> Vec<Vec<TabId>> {
        self.requests
            .iter()
            .filter_map(|request| match request {
                host_bridge::Request::RemoveTabs { tabs, .. } => Some(tabs.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.requests
            .iter()
            .filter_map(|request| match request {
                host_bridge::Request::Notify(notification) => Some(notification.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_persisted(&self) -> Option<LocalState> {
        self.requests.iter().rev().find_map(|request| match request {
            host_bridge::Request::PersistLocal(state) => Some(state.clone()),
            _ => None,
        })
    }
}
