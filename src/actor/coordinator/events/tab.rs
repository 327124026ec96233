use tracing::{debug, instrument};

use crate::actor::coordinator::Coordinator;
use crate::model::title::strip_annotations;
use crate::model::{LoadStatus, Tab, TabChange, TabId};
use crate::sys::host::TabPosition;

pub struct TabEventHandler;

impl TabEventHandler {
    pub fn handle_tab_created(coordinator: &mut Coordinator, tab: Tab) {
        coordinator.observe_tab(&tab);
        coordinator.touch_activity(tab.id);
        if tab.is_new_tab_page() {
            coordinator.activity.new_tabs.insert(tab.id);
            if !coordinator.is_pinned(&tab) {
                coordinator.move_tab(tab.id, TabPosition::Index(0));
            }
        }
    }

    pub fn handle_tab_removed(coordinator: &mut Coordinator, tab_id: TabId) {
        let forgot_activity = coordinator.activity.forget(tab_id);
        let forgot_pin = coordinator.pins.forget(tab_id);
        if forgot_activity || forgot_pin {
            coordinator.persist_local();
        }
        coordinator.titles.originals.remove(&tab_id);
        coordinator.clear_move_timer_for(tab_id);
        if coordinator.machines.active_delay.tab_id() == Some(tab_id) {
            coordinator.clear_active_delay();
        }
    }

    #[instrument(skip(coordinator, tab))]
    pub fn handle_tab_updated(
        coordinator: &mut Coordinator,
        tab_id: TabId,
        change: TabChange,
        tab: Tab,
    ) {
        if coordinator.activity.new_tabs.contains(&tab_id)
            && let Some(url) = &change.url
            && !url.starts_with("chrome://newtab")
        {
            if !coordinator.is_pinned(&tab) {
                coordinator.move_tab(tab_id, TabPosition::Index(0));
            }
            coordinator.activity.new_tabs.remove(&tab_id);
        }

        match change.pinned {
            Some(pinned) => {
                if coordinator.pins.set_native(tab_id, pinned) {
                    debug!(%tab_id, "native pin replaced soft pin");
                }
                coordinator.persist_local();
                if pinned {
                    coordinator.clear_move_timer_for(tab_id);
                }
                if !tab.is_restricted() {
                    coordinator.capture_original_title(&tab);
                    coordinator.render_title(&tab, false);
                }
            }
            None => coordinator.observe_tab(&tab),
        }

        if change.status == Some(LoadStatus::Complete) {
            coordinator.touch_activity(tab_id);
        }

        let quiet = !coordinator.machines.pick_mode.is_active()
            && !coordinator.machines.countdown.is_on();
        if let Some(title) = &change.title
            && quiet
        {
            let original = strip_annotations(title).to_string();
            coordinator.titles.originals.insert(tab_id, original);
            // a page that navigated drops the pin glyph with its old title
            if coordinator.is_pinned(&tab) {
                coordinator.render_title(&tab, false);
            }
        }
    }

    pub fn handle_tab_activated(coordinator: &mut Coordinator, tab_id: TabId) {
        coordinator.on_tab_activated(tab_id);
    }
}
