use tracing::warn;

use crate::actor::coordinator::{Continuation, Coordinator, SweepId};
use crate::model::{Tab, TabId};

pub struct ReplyEventHandler;

impl ReplyEventHandler {
    pub fn handle_tabs_queried(coordinator: &mut Coordinator, then: Continuation, tabs: Vec<Tab>) {
        match then {
            Continuation::SeedHistory => coordinator.seed_history(&tabs),
            Continuation::StartPickMode { session } => {
                coordinator.label_pick_targets(session, tabs)
            }
            Continuation::ResolvePickKey { position, close } => {
                coordinator.resolve_pick_key(position, close, tabs)
            }
            Continuation::RestoreTitles { cleanup_pick_mode } => {
                coordinator.restore_titles(cleanup_pick_mode, tabs)
            }
            Continuation::StartCycle { direction } => coordinator.start_cycle(direction, tabs),
            Continuation::FinishCycle { original } => coordinator.finish_cycle(original, tabs),
            Continuation::TogglePin => coordinator.toggle_pin(tabs),
            Continuation::CountdownTick { handle } => coordinator.render_countdowns(handle, tabs),
            Continuation::Sweep => coordinator.sweep(tabs),
            Continuation::Navigate(navigation) => coordinator.finish_navigation(navigation, tabs),
            Continuation::CloseRelative(scope) => coordinator.close_relative(scope, tabs),
            other => warn!(?other, "continuation does not take a tab list"),
        }
    }

    pub fn handle_tab_fetched(
        coordinator: &mut Coordinator,
        then: Continuation,
        tab_id: TabId,
        tab: Option<Tab>,
    ) {
        match then {
            Continuation::MoveTimerFired { handle } => coordinator.finish_move_timer(handle, tab),
            Continuation::VerifyBeforeClose { sweep } => {
                coordinator.verify_before_close(sweep, tab)
            }
            Continuation::TogglePin => coordinator.toggle_pin(tab.into_iter().collect()),
            other => warn!(?other, %tab_id, "continuation does not take a single tab"),
        }
    }

    pub fn handle_tabs_removed(coordinator: &mut Coordinator, then: Continuation, removed: bool) {
        match then {
            Continuation::SweepRemoval { sweep, title, url } => {
                coordinator.on_sweep_removal(sweep, title, url, removed)
            }
            other => warn!(?other, "continuation does not follow a removal"),
        }
    }

    pub fn handle_unsaved_checked(
        coordinator: &mut Coordinator,
        sweep: SweepId,
        tab: Tab,
        has_unsaved_changes: bool,
    ) {
        coordinator.on_unsaved_checked(sweep, tab, has_unsaved_changes);
    }
}
