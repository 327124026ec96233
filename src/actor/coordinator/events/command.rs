use tracing::{debug, instrument};

use crate::actor::coordinator::{CloseScope, Continuation, Coordinator, Navigation};
use crate::model::machine::Direction;
use crate::model::{Command, TabQuery};

pub struct CommandEventHandler;

impl CommandEventHandler {
    #[instrument(skip(coordinator))]
    pub fn handle_command(coordinator: &mut Coordinator, command: Command) {
        match command {
            Command::GoToLastTab => coordinator.go_to_last_tab(),
            Command::CycleBackward => coordinator.cycle(Direction::Backward),
            Command::CycleForward => coordinator.cycle(Direction::Forward),
            Command::TogglePin => {
                coordinator.query_tabs(TabQuery::active(), Continuation::TogglePin)
            }
            Command::MoveToFirst => coordinator.navigate(Navigation::MoveToFirst),
            Command::CloseAllOldTabs => coordinator.start_sweep(),
            Command::ClearPickMode => coordinator.end_pick_mode(),
            Command::Pick => coordinator.start_pick_mode(false),
            Command::ClosePick => coordinator.start_pick_mode(true),
            Command::GoToFollowingTab => coordinator.navigate(Navigation::Following),
            Command::GoToPrecedingTab => coordinator.navigate(Navigation::Preceding),
            Command::GoToFirstTab => coordinator.navigate(Navigation::First),
            Command::GoToLastTabInList => coordinator.navigate(Navigation::LastInList),
            Command::ReopenLastClosedTab => coordinator.reopen_last_closed(),
            Command::CloseAllPrecedingTabs => close(coordinator, CloseScope::Preceding),
            Command::CloseAllFollowingTabs => close(coordinator, CloseScope::Following),
            Command::CloseAllExceptCurrent => close(coordinator, CloseScope::ExceptCurrent),
            Command::ToggleCountdownTimers => coordinator.toggle_countdown(),
            Command::MoveTabLeft => coordinator.navigate(Navigation::MoveLeft),
            Command::MoveTabRight => coordinator.navigate(Navigation::MoveRight),
            Command::MoveTabToEnd => coordinator.navigate(Navigation::MoveToEnd),
            Command::FocusTab(n) => match n.checked_sub(1) {
                Some(index) => coordinator.navigate(Navigation::Index(index)),
                None => debug!("focus-tab counts from 1"),
            },
        }
    }
}

fn close(coordinator: &Coordinator, scope: CloseScope) {
    coordinator.query_tabs(TabQuery::window(), Continuation::CloseRelative(scope));
}
