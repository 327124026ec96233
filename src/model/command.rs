//! What the outside world can ask of the coordinator: named keyboard commands
//! and messages posted by page scripts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Command {
    GoToLastTab,
    #[strum(serialize = "cycle-through-tabs")]
    #[serde(rename = "cycle-through-tabs")]
    CycleBackward,
    #[strum(serialize = "cycle-through-tabs-forward")]
    #[serde(rename = "cycle-through-tabs-forward")]
    CycleForward,
    TogglePin,
    MoveToFirst,
    CloseAllOldTabs,
    ClearPickMode,
    Pick,
    ClosePick,
    GoToFollowingTab,
    #[strum(to_string = "go-to-preceding-tab", serialize = "go-to-preceeding-tab")]
    GoToPrecedingTab,
    GoToFirstTab,
    GoToLastTabInList,
    ReopenLastClosedTab,
    CloseAllPrecedingTabs,
    CloseAllFollowingTabs,
    CloseAllExceptCurrent,
    ToggleCountdownTimers,
    MoveTabLeft,
    MoveTabRight,
    MoveTabToEnd,
    /// `focus-tab-N`, with N counted from 1.
    #[strum(disabled)]
    FocusTab(usize),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::FocusTab(n) => write!(f, "focus-tab-{n}"),
            named => f.write_str(<&'static str>::from(*named)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command `{0}`")]
pub struct ParseCommandError(pub String);

impl Command {
    pub fn parse(name: &str) -> Result<Command, ParseCommandError> {
        if let Some(n) = name.strip_prefix("focus-tab-") {
            return n
                .parse::<usize>()
                .ok()
                .filter(|n| *n >= 1)
                .map(Command::FocusTab)
                .ok_or_else(|| ParseCommandError(name.to_string()));
        }
        Command::from_str(name).map_err(|_| ParseCommandError(name.to_string()))
    }

    /// The command names a key binding can use. `focus-tab-N` is listed once
    /// as a pattern.
    pub fn vocabulary() -> Vec<String> {
        let mut names: Vec<String> = Command::iter()
            .filter(|c| !matches!(c, Command::FocusTab(_)))
            .map(|c| c.to_string())
            .collect();
        names.push("focus-tab-N".to_string());
        names
    }
}

/// Messages page scripts post to the background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    MouseEnter,
    MouseLeave,
    CancelPickMode,
    PickKey {
        key: String,
        #[serde(default, rename = "shiftKey")]
        shift_key: bool,
    },
}
