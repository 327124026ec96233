use tracing::trace;

use super::Coordinator;
use crate::actor::host_bridge::Request;
use crate::model::title::{CountdownLabel, TitleAnnotations, strip_annotations};
use crate::model::{Tab, TabId};
use crate::sys::host::Script;

impl Coordinator {
    /// Remembers the unannotated title of `tab`. An existing baseline is only
    /// overwritten while no feature is annotating titles.
    pub(super) fn capture_original_title(&mut self, tab: &Tab) {
        let quiet =
            !self.machines.pick_mode.is_active() && !self.machines.countdown.is_on();
        if quiet || !self.titles.originals.contains_key(&tab.id) {
            let original = strip_annotations(&tab.title).to_string();
            self.titles.originals.insert(tab.id, original);
        }
    }

    fn countdown_label(&self, tab: &Tab) -> Option<CountdownLabel> {
        if !self.machines.countdown.is_on() || tab.active || self.is_pinned(tab) {
            return None;
        }
        let last = *self.activity.last_activated.get(&tab.id)?;
        Some(CountdownLabel::compute(
            self.now(),
            last,
            millis(self.settings.auto_close_time()),
            millis(self.settings.warning_time()),
        ))
    }

    pub(super) fn desired_title(&self, tab: &Tab) -> String {
        let original = self
            .titles
            .original(tab.id)
            .unwrap_or_else(|| strip_annotations(&tab.title));
        TitleAnnotations {
            pick: self.machines.pick_mode.label(tab.id).map(str::to_string),
            countdown: self.countdown_label(tab),
            pinned: self.is_pinned(tab),
        }
        .render(original)
    }

    /// Writes the title `tab` should show now, if it differs.
    pub(super) fn render_title(&self, tab: &Tab, all_frames: bool) {
        if tab.is_restricted() {
            return;
        }
        let title = self.desired_title(tab);
        if title == tab.title {
            trace!(tab_id = %tab.id, "title already current");
            return;
        }
        self.set_title(tab.id, title, all_frames);
    }

    pub(super) fn set_title(&self, tab_id: TabId, title: String, all_frames: bool) {
        self.send_host(Request::Inject {
            tab_id,
            script: Script::SetTitle { title },
            all_frames,
        });
    }
}

fn millis(duration: std::time::Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
