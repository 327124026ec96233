use tracing::{debug, info};

use super::{CloseScope, Continuation, Coordinator, Navigation};
use crate::actor::host_bridge::Request;
use crate::model::{Tab, TabQuery};
use crate::sys::host::TabPosition;

impl Coordinator {
    pub(super) fn navigate(&self, navigation: Navigation) {
        let query = match navigation {
            Navigation::First => TabQuery::at_index(0),
            Navigation::Index(index) => TabQuery::at_index(index),
            Navigation::MoveToFirst => TabQuery::active(),
            _ => TabQuery::window(),
        };
        self.query_tabs(query, Continuation::Navigate(navigation));
    }

    pub(super) fn finish_navigation(&mut self, navigation: Navigation, tabs: Vec<Tab>) {
        self.observe_tabs(&tabs);
        match navigation {
            Navigation::First | Navigation::Index(_) => {
                if let Some(tab) = tabs.first() {
                    self.activate(tab.id);
                }
            }
            Navigation::LastInList => {
                if let Some(tab) = tabs.iter().max_by_key(|t| t.index) {
                    self.activate(tab.id);
                }
            }
            Navigation::Following | Navigation::Preceding => {
                let Some(active) = tabs.iter().find(|t| t.active) else {
                    return;
                };
                let len = tabs.len();
                let index = match navigation {
                    Navigation::Following => (active.index + 1) % len,
                    _ => (active.index + len - 1) % len,
                };
                if let Some(tab) = tabs.iter().find(|t| t.index == index) {
                    self.activate(tab.id);
                }
            }
            Navigation::MoveToFirst => {
                if let Some(tab) = tabs.first() {
                    self.move_tab(tab.id, TabPosition::Index(0));
                }
            }
            Navigation::MoveLeft | Navigation::MoveRight | Navigation::MoveToEnd => {
                let Some(active) = tabs.iter().find(|t| t.active) else {
                    return;
                };
                let last = tabs.len() - 1;
                let position = match navigation {
                    Navigation::MoveLeft if active.index > 0 => TabPosition::Index(active.index - 1),
                    Navigation::MoveRight if active.index < last => {
                        TabPosition::Index(active.index + 1)
                    }
                    Navigation::MoveToEnd => TabPosition::End,
                    _ => return,
                };
                self.move_tab(active.id, position);
            }
        }
    }

    pub(super) fn go_to_last_tab(&self) {
        match self.activity.history.get(1) {
            Some(previous) => self.activate(previous),
            None => debug!("no previous tab in history"),
        }
    }

    pub(super) fn reopen_last_closed(&self) { self.send_host(Request::RestoreLastClosed); }

    pub(super) fn close_relative(&mut self, scope: CloseScope, tabs: Vec<Tab>) {
        self.observe_tabs(&tabs);
        let Some(active) = tabs.iter().find(|t| t.active) else {
            return;
        };
        let doomed: Vec<_> = tabs
            .iter()
            .filter(|t| match scope {
                CloseScope::Preceding => t.index < active.index,
                CloseScope::Following => t.index > active.index,
                CloseScope::ExceptCurrent => t.id != active.id,
            })
            .filter(|t| !self.settings.skip_pinned || !self.is_pinned(t))
            .map(|t| t.id)
            .collect();
        if doomed.is_empty() {
            return;
        }
        debug!(?scope, count = doomed.len(), "closing tabs");
        self.send_host(Request::RemoveTabs { tabs: doomed, then: None });
    }

    pub(super) fn toggle_pin(&mut self, tabs: Vec<Tab>) {
        let Some(tab) = tabs.into_iter().next() else {
            return;
        };
        self.observe_tab(&tab);
        if tab.pinned {
            info!(tab_id = %tab.id, "cannot soft-pin a natively pinned tab");
            return;
        }
        let pinned = self.pins.toggle_soft(tab.id);
        debug!(tab_id = %tab.id, pinned, "soft pin toggled");
        self.persist_local();
        if !tab.is_restricted() {
            self.capture_original_title(&tab);
            self.render_title(&tab, false);
        }
        self.clear_move_timer_for(tab.id);
    }
}
