use std::time::Duration;

use tracing::{debug, trace};

use super::{Continuation, Coordinator};
use crate::actor::host_bridge::Request;
use crate::common::collections::BTreeMap;
use crate::model::machine::{TimerHandle, TimerKind};
use crate::model::{Tab, TabQuery, TabUpdate, keys};
use crate::sys::host::{PageMessage, Script};

/// How long a pick session waits for a key.
pub const PICK_TIMEOUT: Duration = Duration::from_secs(5);

impl Coordinator {
    /// Enters pick mode, or extends the running session.
    pub(super) fn start_pick_mode(&mut self, close_mode: bool) {
        self.clear_move_timer();
        let handle = self.schedule_once(PICK_TIMEOUT, TimerKind::PickTimeout);
        let session = self.communication.next_pick_session();
        let (pick_mode, stale) =
            std::mem::take(&mut self.machines.pick_mode).start(close_mode, handle, session);
        self.machines.pick_mode = pick_mode;
        self.cancel_timer(stale);

        if let Some(session) = self.machines.pick_mode.session() {
            self.query_tabs(TabQuery::window(), Continuation::StartPickMode { session });
        }
    }

    pub(super) fn label_pick_targets(&mut self, session: u64, tabs: Vec<Tab>) {
        if self.machines.pick_mode.session() != Some(session) {
            trace!(session, "pick session ended before its tabs arrived");
            return;
        }
        self.observe_tabs(&tabs);
        let targets: Vec<Tab> = tabs.into_iter().filter(|t| !t.is_restricted()).collect();

        let mut labels = BTreeMap::new();
        for (position, tab) in targets.iter().enumerate() {
            self.capture_original_title(tab);
            labels.insert(tab.id, keys::label_for(position));
        }
        self.machines.pick_mode.set_labels(labels);

        for tab in &targets {
            self.send_host(Request::Inject {
                tab_id: tab.id,
                script: Script::InstallPickListener { focus_capture: tab.active },
                all_frames: false,
            });
            self.render_title(tab, true);
        }
    }

    pub(super) fn on_pick_key(&mut self, key: &str, shift_key: bool) {
        if !self.machines.pick_mode.is_active() {
            trace!(key, "key press outside pick mode");
            return;
        }
        self.clear_move_timer();
        let close = shift_key || self.machines.pick_mode.close_mode();
        let position = keys::index_of(key);
        self.end_pick_mode();
        match position {
            Some(position) => self.query_tabs(
                TabQuery::window(),
                Continuation::ResolvePickKey { position, close },
            ),
            None => debug!(key, "key does not name a tab"),
        }
    }

    pub(super) fn resolve_pick_key(&mut self, position: usize, close: bool, tabs: Vec<Tab>) {
        let Some(target) = tabs.into_iter().filter(|t| !t.is_restricted()).nth(position) else {
            debug!(position, "no tab behind that key");
            return;
        };
        if close {
            self.send_host(Request::RemoveTabs { tabs: vec![target.id], then: None });
        } else {
            self.send_host(Request::UpdateTab {
                tab_id: target.id,
                update: TabUpdate::activate_and_highlight(),
            });
        }
    }

    pub(super) fn end_pick_mode(&mut self) {
        let (idle, handle) = std::mem::take(&mut self.machines.pick_mode).end();
        self.machines.pick_mode = idle;
        self.cancel_timer(handle);
        self.query_tabs(
            TabQuery::window(),
            Continuation::RestoreTitles { cleanup_pick_mode: true },
        );
    }

    pub(super) fn on_pick_timeout(&mut self, handle: TimerHandle) {
        if !self.machines.pick_mode.is_current(handle) {
            trace!(%handle, "stale pick timeout");
            return;
        }
        debug!("pick mode timed out");
        self.end_pick_mode();
    }

    /// Re-renders every title from state, optionally telling pages to drop
    /// their pick listeners.
    pub(super) fn restore_titles(&mut self, cleanup_pick_mode: bool, tabs: Vec<Tab>) {
        self.observe_tabs(&tabs);
        for tab in tabs.iter().filter(|t| !t.is_restricted()) {
            if cleanup_pick_mode {
                self.send_host(Request::SendMessage {
                    tab_id: tab.id,
                    message: PageMessage::CleanupPickMode,
                });
            }
            if self.titles.originals.contains_key(&tab.id) {
                self.render_title(tab, true);
            }
        }
    }
}
