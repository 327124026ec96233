use std::time::Duration;

use tracing::{info, trace};

use super::{Continuation, Coordinator};
use crate::model::machine::{Countdown, TimerHandle, TimerKind};
use crate::model::{Tab, TabQuery};

const TICK: Duration = Duration::from_secs(1);

impl Coordinator {
    pub(super) fn toggle_countdown(&mut self) {
        if self.machines.countdown.is_on() {
            self.stop_countdown();
            return;
        }
        if !self.machines.auto_close.is_enabled() {
            info!("countdown timers need auto-close to be enabled");
            return;
        }
        let handle = self.schedule_every(TICK, TimerKind::CountdownTick);
        self.machines.countdown = Countdown::On { handle };
        self.query_tabs(TabQuery::window(), Continuation::CountdownTick { handle });
    }

    pub(super) fn stop_countdown(&mut self) {
        let (off, handle) = self.machines.countdown.turn_off();
        self.machines.countdown = off;
        self.cancel_timer(handle);
        self.query_tabs(
            TabQuery::window(),
            Continuation::RestoreTitles { cleanup_pick_mode: false },
        );
    }

    pub(super) fn on_countdown_tick(&mut self, handle: TimerHandle) {
        if !self.machines.countdown.is_current(handle) {
            trace!(%handle, "stale countdown tick");
            self.cancel_timer(Some(handle));
            return;
        }
        self.query_tabs(TabQuery::window(), Continuation::CountdownTick { handle });
    }

    pub(super) fn render_countdowns(&mut self, handle: TimerHandle, tabs: Vec<Tab>) {
        if !self.machines.countdown.is_current(handle) {
            return;
        }
        self.observe_tabs(&tabs);
        for tab in tabs.iter().filter(|t| !t.is_restricted()) {
            self.capture_original_title(tab);
            self.render_title(tab, false);
        }
    }
}
