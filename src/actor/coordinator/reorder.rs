use std::time::Duration;

use tracing::{debug, trace};

use super::{Continuation, Coordinator};
use crate::actor::host_bridge::Request;
use crate::model::machine::{ActiveDelay, MoveTimer, TimerHandle, TimerKind};
use crate::model::{Tab, TabId};
use crate::sys::host::TabPosition;

impl Coordinator {
    pub(super) fn on_tab_activated(&mut self, tab_id: TabId) {
        if self.machines.cycle.was_requested(tab_id) {
            trace!(%tab_id, "activation belongs to the running cycle");
            return;
        }
        if self.machines.cycle.is_active() {
            self.interrupt_cycle(tab_id);
        }

        self.clear_move_timer();
        self.clear_active_delay();

        let delay = self.settings.active_delay();
        if delay.is_zero() {
            self.commit_activation(tab_id);
        } else {
            let handle = self.schedule_once(delay, TimerKind::ActiveDelay);
            self.machines.active_delay = ActiveDelay::Pending { handle, tab_id };
        }
    }

    pub(super) fn on_active_delay_fired(&mut self, handle: TimerHandle) {
        let (delay, committed) = self.machines.active_delay.fire(handle);
        self.machines.active_delay = delay;
        match committed {
            Some(tab_id) => self.commit_activation(tab_id),
            None => trace!(%handle, "stale activation debounce"),
        }
    }

    fn commit_activation(&mut self, tab_id: TabId) {
        self.touch_activity(tab_id);
        self.activity.history.touch(tab_id);
        self.start_move_timer(tab_id, self.settings.reorder_delay());
    }

    /// Starts the dwell timer for `tab_id`, paused if the pointer is away.
    pub(super) fn start_move_timer(&mut self, tab_id: TabId, duration: Duration) {
        self.clear_move_timer();
        if self.pins.is_pinned(tab_id) {
            debug!(%tab_id, "pinned tabs are never reordered");
            return;
        }
        if self.machines.mouse.is_inside() {
            self.arm_move_timer(tab_id, duration);
        } else {
            self.machines.move_timer = MoveTimer::paused(tab_id, duration, self.now());
        }
    }

    fn arm_move_timer(&mut self, tab_id: TabId, duration: Duration) {
        let handle = self.schedule_once(duration, TimerKind::MoveTimer);
        self.machines.move_timer = MoveTimer::running(tab_id, duration, handle, self.now());
    }

    pub(super) fn clear_move_timer(&mut self) {
        let (idle, handle) = self.machines.move_timer.cancel();
        self.machines.move_timer = idle;
        self.cancel_timer(handle);
    }

    /// Drops the move timer only if it is waiting on `tab_id`.
    pub(super) fn clear_move_timer_for(&mut self, tab_id: TabId) {
        if self.machines.move_timer.tab_id() == Some(tab_id) {
            self.clear_move_timer();
        }
    }

    pub(super) fn clear_active_delay(&mut self) {
        let (idle, handle) = self.machines.active_delay.cancel();
        self.machines.active_delay = idle;
        self.cancel_timer(handle);
    }

    pub(super) fn on_mouse_enter(&mut self) {
        self.machines.mouse = self.machines.mouse.enter();
        if let Some((tab_id, remaining)) = self.machines.move_timer.resumable() {
            trace!(%tab_id, ?remaining, "resuming move timer");
            self.arm_move_timer(tab_id, remaining);
        }
    }

    pub(super) fn on_mouse_leave(&mut self) {
        self.machines.mouse = self.machines.mouse.leave();
        let (paused, handle) = self.machines.move_timer.pause(self.now());
        self.machines.move_timer = paused;
        self.cancel_timer(handle);
    }

    pub(super) fn on_move_timer_fired(&mut self, handle: TimerHandle) {
        if !self.machines.move_timer.is_current(handle) {
            trace!(%handle, "stale move timer");
            return;
        }
        if let Some(tab_id) = self.machines.move_timer.tab_id() {
            self.fetch_tab(tab_id, Continuation::MoveTimerFired { handle });
        }
    }

    pub(super) fn finish_move_timer(&mut self, handle: TimerHandle, tab: Option<Tab>) {
        if !self.machines.move_timer.is_current(handle) {
            trace!(%handle, "move timer superseded while the tab was fetched");
            return;
        }
        self.machines.move_timer = MoveTimer::Idle;
        let Some(tab) = tab else {
            return;
        };
        self.observe_tab(&tab);
        if !self.should_reorder(&tab) {
            debug!(tab_id = %tab.id, "not reordering");
            return;
        }
        if tab.index != 0 {
            self.move_tab(tab.id, TabPosition::Index(0));
        }
    }

    pub(super) fn should_reorder(&self, tab: &Tab) -> bool {
        self.machines.mouse.is_inside() && !tab.is_restricted() && !self.is_pinned(tab)
    }

    pub(super) fn move_tab(&self, tab_id: TabId, position: TabPosition) {
        self.send_host(Request::MoveTab { tab_id, position });
    }
}
