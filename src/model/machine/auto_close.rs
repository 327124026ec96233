use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const ALARM_NAME: &str = "autoCloseAlarm";
pub const ALARM_PERIOD: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoClose {
    #[default]
    Disabled,
    Enabled,
}

impl AutoClose {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled { AutoClose::Enabled } else { AutoClose::Disabled }
    }

    pub fn is_enabled(self) -> bool { self == AutoClose::Enabled }
}
