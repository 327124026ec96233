use tracing::{debug, trace};

use super::{Continuation, Coordinator};
use crate::actor::host_bridge::Request;
use crate::model::machine::cycle::next_index;
use crate::model::machine::{Cycle, Direction, TimerHandle, TimerKind};
use crate::model::{Tab, TabId, TabQuery, TabUpdate};

impl Coordinator {
    pub(super) fn cycle(&mut self, direction: Direction) {
        if self.activity.history.len() < 2 {
            debug!("not enough history to cycle");
            return;
        }
        if self.machines.cycle.is_active() {
            self.advance_cycle(direction);
            return;
        }
        self.clear_move_timer();
        self.clear_active_delay();
        self.query_tabs(TabQuery::active(), Continuation::StartCycle { direction });
    }

    pub(super) fn start_cycle(&mut self, direction: Direction, tabs: Vec<Tab>) {
        // a second command may have started the session while we waited
        if self.machines.cycle.is_active() {
            self.advance_cycle(direction);
            return;
        }
        let Some(active) = tabs.into_iter().next() else {
            debug!("no active tab to cycle from");
            return;
        };
        self.observe_tab(&active);

        let original = active.id;
        let current = self.activity.history.position(original).unwrap_or(0);
        let index = next_index(current, direction, &self.activity.history, original);
        let Some(target) = self.activity.history.get(index) else {
            return;
        };
        let handle = self.schedule_once(self.settings.cycle_timeout(), TimerKind::CycleTimeout);
        self.machines.cycle = Cycle::start(original, index, target, handle);
        debug!(%original, %target, index, "cycle started");
        self.activate(target);
    }

    fn advance_cycle(&mut self, direction: Direction) {
        let (Some(original), Some(current)) =
            (self.machines.cycle.original_tab(), self.machines.cycle.current_index())
        else {
            return;
        };
        let index = next_index(current, direction, &self.activity.history, original);
        let Some(target) = self.activity.history.get(index) else {
            return;
        };
        let handle = self.schedule_once(self.settings.cycle_timeout(), TimerKind::CycleTimeout);
        let stale = self.machines.cycle.advance(index, target, handle);
        self.cancel_timer(stale);
        trace!(%target, index, "cycle advanced");
        self.activate(target);
    }

    pub(super) fn on_cycle_timeout(&mut self, handle: TimerHandle) {
        if !self.machines.cycle.is_current(handle) {
            trace!(%handle, "stale cycle timeout");
            return;
        }
        let Some(original) = self.machines.cycle.original_tab() else {
            return;
        };
        self.end_cycle();
        self.clear_move_timer();
        self.query_tabs(TabQuery::active(), Continuation::FinishCycle { original });
    }

    pub(super) fn finish_cycle(&mut self, original: TabId, tabs: Vec<Tab>) {
        let Some(last) = tabs.into_iter().next() else {
            return;
        };
        self.observe_tab(&last);
        self.commit_cycle(original, last.id);
        if self.should_reorder(&last) {
            self.start_move_timer(last.id, self.settings.reorder_delay());
        }
    }

    /// A tab the cycle never asked for was activated: the user moved on.
    pub(super) fn interrupt_cycle(&mut self, tab_id: TabId) {
        let Some(original) = self.machines.cycle.original_tab() else {
            return;
        };
        debug!(%tab_id, "activation ended the cycle");
        self.end_cycle();
        self.commit_cycle(original, tab_id);
    }

    fn end_cycle(&mut self) {
        let (idle, handle) = std::mem::take(&mut self.machines.cycle).end();
        self.machines.cycle = idle;
        self.cancel_timer(handle);
    }

    /// The tab the session ended on goes first, the one it started from
    /// right behind it.
    fn commit_cycle(&mut self, original: TabId, last: TabId) {
        self.touch_activity(last);
        self.activity.history.touch(last);
        if original != last && self.activity.history.contains(original) {
            self.activity.history.insert_at(1, original);
        }
        debug!(history = ?self.activity.history.as_slice(), "cycle committed");
    }

    pub(super) fn activate(&self, tab_id: TabId) {
        self.send_host(Request::UpdateTab { tab_id, update: TabUpdate::activate() });
    }
}
