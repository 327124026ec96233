//! The title grammar: every annotation the coordinator adds to a page title,
//! and how to take them off again.
//!
//! A rendered title is `[pick ": "][countdown " "][pin]original`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Timestamp;

pub const PIN_MARKER: &str = "📌 ";

static TIMER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?:(?:WARN\s)?\d+:\d{2}|EXPIRED)\]\s").expect("timer prefix regex")
});

// Numbered pick labels are left alone: "404: Not Found" is a real title.
static PICK_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z;,.]:\s").expect("pick prefix regex"));

/// Removes every annotation prefix this crate knows how to produce, in any
/// stacking order. Anything else at the front of the title is left alone.
pub fn strip_annotations(title: &str) -> &str {
    let mut rest = title;
    loop {
        let before = rest.len();
        if let Some(m) = PICK_PREFIX.find(rest) {
            rest = &rest[m.end()..];
        }
        if let Some(m) = TIMER_PREFIX.find(rest) {
            rest = &rest[m.end()..];
        }
        if let Some(stripped) = rest.strip_prefix(PIN_MARKER) {
            rest = stripped;
        }
        if rest.len() == before {
            return rest;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountdownLabel {
    Remaining { minutes: i64, seconds: i64 },
    Warning { minutes: i64, seconds: i64 },
    Expired,
}

impl CountdownLabel {
    /// Label for a tab last active at `last_activated`, given the idle
    /// threshold and warning window in milliseconds.
    pub fn compute(now: Timestamp, last_activated: Timestamp, threshold: i64, warning: i64) -> Self {
        let remaining = threshold - (now - last_activated);
        if remaining <= 0 {
            return CountdownLabel::Expired;
        }
        let minutes = remaining / 60_000;
        let seconds = (remaining % 60_000) / 1000;
        if warning > 0 && remaining <= warning {
            CountdownLabel::Warning { minutes, seconds }
        } else {
            CountdownLabel::Remaining { minutes, seconds }
        }
    }
}

impl fmt::Display for CountdownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountdownLabel::Remaining { minutes, seconds } => {
                write!(f, "[{minutes:02}:{seconds:02}]")
            }
            CountdownLabel::Warning { minutes, seconds } => {
                write!(f, "[WARN {minutes:02}:{seconds:02}]")
            }
            CountdownLabel::Expired => f.write_str("[EXPIRED]"),
        }
    }
}

/// The annotations that apply to one tab right now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleAnnotations {
    pub pick: Option<String>,
    pub countdown: Option<CountdownLabel>,
    pub pinned: bool,
}

impl TitleAnnotations {
    pub fn render(&self, original: &str) -> String {
        let mut title = String::with_capacity(original.len() + 24);
        if let Some(label) = &self.pick {
            title.push_str(label);
            title.push_str(": ");
        }
        if let Some(countdown) = &self.countdown {
            title.push_str(&countdown.to_string());
            title.push(' ');
        }
        if self.pinned {
            title.push_str(PIN_MARKER);
        }
        title.push_str(original);
        title
    }
}
