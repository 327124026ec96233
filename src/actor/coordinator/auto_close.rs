//! The idle-tab sweeper. Once a minute every tab in the window is checked;
//! the ones idle past the threshold are asked about unsaved work, re-fetched
//! to make sure they are still in the background, and closed.

use tracing::{debug, info, trace};
use url::Url;

use super::{Continuation, Coordinator, SweepId};
use crate::actor::host_bridge::Request;
use crate::model::machine::AutoClose;
use crate::model::machine::auto_close::{ALARM_NAME, ALARM_PERIOD};
use crate::model::title::strip_annotations;
use crate::model::{Tab, TabQuery};
use crate::sys::host::{Notification, NotificationItem};

const NO_URL: &str = "No URL available";

impl Coordinator {
    pub(super) fn set_auto_close(&mut self, enabled: bool) {
        self.machines.auto_close = AutoClose::from_enabled(enabled);
        if enabled {
            self.arm_auto_close_alarm();
            return;
        }
        self.send_host(Request::ClearAlarm { name: ALARM_NAME.to_string() });
        if self.machines.countdown.is_on() {
            self.stop_countdown();
        }
    }

    pub(super) fn arm_auto_close_alarm(&self) {
        self.send_host(Request::SetAlarm {
            name: ALARM_NAME.to_string(),
            period: ALARM_PERIOD,
        });
    }

    pub(super) fn on_alarm(&mut self, name: &str) {
        if name != ALARM_NAME {
            trace!(name, "ignoring unknown alarm");
            return;
        }
        self.start_sweep();
    }

    pub(super) fn start_sweep(&mut self) {
        if !self.machines.auto_close.is_enabled() {
            debug!("auto-close is disabled");
            return;
        }
        self.query_tabs(TabQuery::window(), Continuation::Sweep);
    }

    pub(super) fn sweep(&mut self, tabs: Vec<Tab>) {
        self.observe_tabs(&tabs);
        let sweep = self.sweeps.begin();
        let now = self.now();
        let threshold =
            i64::try_from(self.settings.auto_close_time().as_millis()).unwrap_or(i64::MAX);

        for tab in tabs {
            if self.whitelisted(tab.url.as_deref()) || self.is_pinned(&tab) || tab.audible {
                continue;
            }
            let Some(&last) = self.activity.last_activated.get(&tab.id) else {
                self.touch_activity(tab.id);
                continue;
            };
            if now - last <= threshold {
                continue;
            }
            trace!(tab_id = %tab.id, idle_ms = now - last, "auto-close candidate");
            self.sweeps.expect(sweep);
            self.send_host(Request::CheckUnsaved { sweep, tab });
        }
        if self.sweeps.is_idle(sweep) {
            let closed = self.sweeps.finish(sweep);
            self.report_sweep(closed);
        }
    }

    /// True for tabs the whitelist protects. http(s) pages match by host,
    /// `file:` pages by their full URL. An http(s) URL that does not parse is
    /// protected as well.
    fn whitelisted(&self, url: Option<&str>) -> bool {
        let Some(url) = url else {
            return false;
        };
        let whitelist = &self.settings.auto_close_whitelist;
        if url.starts_with("http:") || url.starts_with("https:") {
            return match Url::parse(url) {
                Ok(parsed) => parsed
                    .host_str()
                    .is_some_and(|host| whitelist.iter().any(|entry| entry == host)),
                Err(_) => true,
            };
        }
        if url.starts_with("file:") {
            return whitelist.iter().any(|entry| entry == url);
        }
        false
    }

    pub(super) fn on_unsaved_checked(&mut self, sweep: SweepId, tab: Tab, has_unsaved: bool) {
        if has_unsaved {
            debug!(tab_id = %tab.id, "keeping tab with unsaved changes");
            self.resolve_candidate(sweep);
            return;
        }
        self.fetch_tab(tab.id, Continuation::VerifyBeforeClose { sweep });
    }

    pub(super) fn verify_before_close(&mut self, sweep: SweepId, tab: Option<Tab>) {
        match tab {
            Some(tab) if !tab.active => {
                let title = self
                    .titles
                    .original(tab.id)
                    .unwrap_or_else(|| strip_annotations(&tab.title))
                    .to_string();
                let then = Continuation::SweepRemoval { sweep, title, url: tab.url.clone() };
                self.send_host(Request::RemoveTabs { tabs: vec![tab.id], then: Some(then) });
            }
            Some(tab) => {
                debug!(tab_id = %tab.id, "tab became active; not closing");
                self.resolve_candidate(sweep);
            }
            None => self.resolve_candidate(sweep),
        }
    }

    pub(super) fn on_sweep_removal(
        &mut self,
        sweep: SweepId,
        title: String,
        url: Option<String>,
        removed: bool,
    ) {
        if removed {
            let message = url.unwrap_or_else(|| NO_URL.to_string());
            self.sweeps.record_closed(sweep, NotificationItem { title, message });
        }
        self.resolve_candidate(sweep);
    }

    fn resolve_candidate(&mut self, sweep: SweepId) {
        let closed = self.sweeps.settle(sweep);
        self.report_sweep(closed);
    }

    fn report_sweep(&self, closed: Option<Vec<NotificationItem>>) {
        let Some(closed) = closed.filter(|c| !c.is_empty()) else {
            return;
        };
        info!(count = closed.len(), "closed idle tabs");
        self.send_host(Request::Notify(Notification {
            title: format!("Closed {} old tab(s)", closed.len()),
            items: closed,
        }));
    }
}
