//! The coordinator owns every piece of tab-orchestration state.
//!
//! It takes events from the browser, the page scripts, its own timers and the
//! replies to its own host calls, one at a time, and never waits on anything.
//! Work that needs the host is sent to the host bridge tagged with a
//! [`Continuation`]; the answer comes back later as an ordinary event and
//! picks up where the tag says. Timers are keyed by [`TimerHandle`], and every
//! fire is checked against the live state before it is allowed to act.

mod auto_close;
mod countdown;
mod cycle;
mod events;
mod managers;
mod navigation;
mod pick;
mod query;
mod reorder;
mod replay;
mod titles;

#[cfg(test)]
mod testing;


use std::sync::Arc;
use std::time::Duration;

use events::command::CommandEventHandler;
use events::message::MessageEventHandler;
use events::reply::ReplyEventHandler;
use events::settings::SettingsEventHandler;
use events::tab::TabEventHandler;
use events::timer::TimerEventHandler;
pub use query::{CoordinatorQueryHandle, QueryRequest, Snapshot};
pub use replay::{Record, ReplayError, ReplayOutput, replay};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info_span, instrument, trace};

use crate::actor::{self, host_bridge, timer};
use crate::common::config::{Settings, SettingsPatch};
use crate::model::machine::{Direction, TimerHandle, TimerKind};
use crate::model::{Command, InboundMessage, Tab, TabChange, TabId, TabQuery, Timestamp};
use crate::sys::clock::Clock;
use crate::sys::host::TabHost;
use crate::sys::store::LocalState;

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

/// Identifies one auto-close sweep while its page probes are in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SweepId(u64);

impl SweepId {
    pub const fn new(raw: u64) -> Self { Self(raw) }

    pub const fn get(self) -> u64 { self.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Navigation {
    First,
    LastInList,
    Following,
    Preceding,
    /// Zero-based.
    Index(usize),
    MoveToFirst,
    MoveLeft,
    MoveRight,
    MoveToEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseScope {
    Preceding,
    Following,
    ExceptCurrent,
}

/// What to do with the answer to a host call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Continuation {
    SeedHistory,
    StartPickMode { session: u64 },
    ResolvePickKey { position: usize, close: bool },
    RestoreTitles { cleanup_pick_mode: bool },
    StartCycle { direction: Direction },
    FinishCycle { original: TabId },
    TogglePin,
    MoveTimerFired { handle: TimerHandle },
    CountdownTick { handle: TimerHandle },
    Sweep,
    VerifyBeforeClose { sweep: SweepId },
    SweepRemoval { sweep: SweepId, title: String, url: Option<String> },
    Navigate(Navigation),
    CloseRelative(CloseScope),
}

#[derive(Serialize, Deserialize, Debug)]
pub enum Event {
    /// Sent once when the coordinator is spawned, before anything else.
    Startup,

    TabCreated(Tab),
    TabRemoved(TabId),
    /// `change` holds only the fields that changed; `tab` is the full
    /// snapshot after the change.
    TabUpdated {
        tab_id: TabId,
        change: TabChange,
        tab: Tab,
    },
    TabActivated(TabId),

    SettingsChanged(SettingsPatch),
    Command(Command),
    Message(InboundMessage),
    /// A recurring host alarm went off.
    Alarm(String),
    TimerFired {
        handle: TimerHandle,
        kind: TimerKind,
    },

    TabsQueried {
        then: Continuation,
        tabs: Vec<Tab>,
    },
    TabFetched {
        then: Continuation,
        tab_id: TabId,
        tab: Option<Tab>,
    },
    TabsRemoved {
        then: Continuation,
        removed: bool,
    },
    UnsavedChecked {
        sweep: SweepId,
        tab: Tab,
        has_unsaved_changes: bool,
    },

    #[serde(skip)]
    Query(QueryRequest),
}

pub struct Coordinator {
    settings: Settings,
    clock: Arc<dyn Clock>,
    activity: managers::ActivityManager,
    pins: managers::PinManager,
    titles: managers::TitleManager,
    machines: managers::Machines,
    sweeps: managers::SweepManager,
    communication: managers::CommunicationManager,
    recording: managers::RecordingManager,
}

#[derive(Clone)]
pub struct CoordinatorHandle {
    sender: Sender,
    queries: CoordinatorQueryHandle,
}

impl CoordinatorHandle {
    pub fn sender(&self) -> Sender { self.sender.clone() }

    pub fn send(&self, event: Event) { self.sender.send(event) }
}

impl std::ops::Deref for CoordinatorHandle {
    type Target = CoordinatorQueryHandle;

    fn deref(&self) -> &Self::Target { &self.queries }
}

impl Coordinator {
    /// Starts the coordinator, its timer service and a host bridge over
    /// `host` on the current tokio runtime.
    pub fn spawn<H: TabHost>(
        settings: Settings,
        state: LocalState,
        host: Arc<H>,
        clock: Arc<dyn Clock>,
        record: Record,
    ) -> CoordinatorHandle {
        let (events_tx, events_rx) = actor::channel();
        let (host_tx, host_rx) = actor::channel();
        let (timer_tx, timer_rx) = actor::channel();

        let coordinator = Coordinator::new(settings, state, clock, host_tx, timer_tx, record);
        let bridge = host_bridge::HostBridge::new(host, events_tx.clone(), host_rx);
        let timers = timer::TimerService::new(events_tx.clone(), timer_rx);

        tokio::spawn(bridge.run().instrument(info_span!("host_bridge")));
        tokio::spawn(timers.run().instrument(info_span!("timers")));
        tokio::spawn(Coordinator::run(coordinator, events_rx));

        events_tx.send(Event::Startup);
        CoordinatorHandle {
            queries: CoordinatorQueryHandle::new(events_tx.clone()),
            sender: events_tx,
        }
    }

    pub fn new(
        settings: Settings,
        state: LocalState,
        clock: Arc<dyn Clock>,
        host_tx: host_bridge::Sender,
        timer_tx: timer::Sender,
        record: Record,
    ) -> Coordinator {
        Coordinator {
            machines: managers::Machines::new(&settings),
            settings,
            clock,
            activity: managers::ActivityManager::new(state.tab_last_activated),
            pins: managers::PinManager::new(state.pinned_tabs),
            titles: managers::TitleManager::default(),
            sweeps: managers::SweepManager::default(),
            communication: managers::CommunicationManager::new(host_tx, timer_tx),
            recording: managers::RecordingManager { record },
        }
    }

    pub async fn run(mut coordinator: Coordinator, mut events: Receiver) {
        while let Some((span, event)) = events.recv().await {
            span.in_scope(|| coordinator.handle_loop_event(event));
        }
        debug!("coordinator stopped");
    }

    fn handle_loop_event(&mut self, event: Event) {
        if let Event::Query(request) = event {
            self.handle_query_request(request);
            return;
        }
        self.handle_event(event);
    }

    fn log_event(&self, event: &Event) {
        match event {
            Event::TimerFired { kind: TimerKind::CountdownTick, .. }
            | Event::TabsQueried { then: Continuation::CountdownTick { .. }, .. }
            | Event::Message(InboundMessage::MouseEnter | InboundMessage::MouseLeave) => {
                trace!(?event, "Event")
            }
            _ => debug!(?event, "Event"),
        }
    }

    #[instrument(name = "coordinator::handle_event", skip(self, event))]
    pub fn handle_event(&mut self, event: Event) {
        self.log_event(&event);
        let now = self.now();
        self.recording.record.on_event(now, &event);

        match event {
            Event::Startup => self.startup(),
            Event::TabCreated(tab) => TabEventHandler::handle_tab_created(self, tab),
            Event::TabRemoved(tab_id) => TabEventHandler::handle_tab_removed(self, tab_id),
            Event::TabUpdated { tab_id, change, tab } => {
                TabEventHandler::handle_tab_updated(self, tab_id, change, tab)
            }
            Event::TabActivated(tab_id) => TabEventHandler::handle_tab_activated(self, tab_id),
            Event::SettingsChanged(patch) => {
                SettingsEventHandler::handle_settings_changed(self, patch)
            }
            Event::Command(command) => CommandEventHandler::handle_command(self, command),
            Event::Message(message) => MessageEventHandler::handle_message(self, message),
            Event::Alarm(name) => self.on_alarm(&name),
            Event::TimerFired { handle, kind } => {
                TimerEventHandler::handle_timer_fired(self, handle, kind)
            }
            Event::TabsQueried { then, tabs } => {
                ReplyEventHandler::handle_tabs_queried(self, then, tabs)
            }
            Event::TabFetched { then, tab_id, tab } => {
                ReplyEventHandler::handle_tab_fetched(self, then, tab_id, tab)
            }
            Event::TabsRemoved { then, removed } => {
                ReplyEventHandler::handle_tabs_removed(self, then, removed)
            }
            Event::UnsavedChecked { sweep, tab, has_unsaved_changes } => {
                ReplyEventHandler::handle_unsaved_checked(self, sweep, tab, has_unsaved_changes)
            }
            Event::Query(request) => self.handle_query_request(request),
        }
    }

    fn startup(&mut self) {
        if self.machines.auto_close.is_enabled() {
            self.arm_auto_close_alarm();
        }
        self.query_tabs(TabQuery::window(), Continuation::SeedHistory);
    }

    fn seed_history(&mut self, tabs: &[Tab]) {
        self.observe_tabs(tabs);
        self.activity.seed_history(tabs.iter().map(|t| t.id));
        debug!(history = ?self.activity.history.as_slice(), "seeded tab history");
    }

    fn now(&self) -> Timestamp { self.clock.now() }

    fn send_host(&self, request: host_bridge::Request) {
        self.communication.host_tx.send(request);
    }

    fn query_tabs(&self, query: TabQuery, then: Continuation) {
        self.send_host(host_bridge::Request::QueryTabs { query, then });
    }

    fn fetch_tab(&self, tab_id: TabId, then: Continuation) {
        self.send_host(host_bridge::Request::GetTab { tab_id, then });
    }

    fn schedule_once(&mut self, after: Duration, kind: TimerKind) -> TimerHandle {
        let handle = self.communication.next_timer_handle();
        self.communication.timer_tx.send(timer::Request::Once { handle, after, kind });
        handle
    }

    fn schedule_every(&mut self, period: Duration, kind: TimerKind) -> TimerHandle {
        let handle = self.communication.next_timer_handle();
        self.communication.timer_tx.send(timer::Request::Every { handle, period, kind });
        handle
    }

    fn cancel_timer(&self, handle: Option<TimerHandle>) {
        if let Some(handle) = handle {
            self.communication.timer_tx.send(timer::Request::Cancel(handle));
        }
    }

    fn persist_local(&self) {
        let state = LocalState {
            pinned_tabs: self.pins.soft().clone(),
            tab_last_activated: self.activity.last_activated.clone(),
        };
        self.send_host(host_bridge::Request::PersistLocal(state));
    }

    /// Stamps `tab_id` as active now.
    fn touch_activity(&mut self, tab_id: TabId) {
        let now = self.now();
        self.activity.last_activated.insert(tab_id, now);
        self.persist_local();
    }

    /// Folds a host snapshot into the native-pin cache. A natively pinned tab
    /// loses any soft pin.
    fn observe_tab(&mut self, tab: &Tab) {
        if self.pins.observe(tab) {
            debug!(tab_id = %tab.id, "native pin replaced soft pin");
            self.persist_local();
        }
    }

    fn observe_tabs(&mut self, tabs: &[Tab]) {
        for tab in tabs {
            self.observe_tab(tab);
        }
    }

    fn is_pinned(&self, tab: &Tab) -> bool { tab.pinned || self.pins.is_pinned(tab.id) }
}
