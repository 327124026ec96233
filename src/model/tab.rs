use std::fmt;

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

pub const NEW_TAB_URL: &str = "chrome://newtab/";

const RESTRICTED_PREFIXES: [&str; 6] = [
    "chrome://",
    "edge://",
    "about:",
    "chrome-extension://",
    "edge-extension://",
    "https://chrome.google.com/webstore/",
];

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TabId(u32);

impl TabId {
    pub const fn new(id: u32) -> Self { Self(id) }

    pub const fn get(self) -> u32 { self.0 }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "tab#{}", self.0) }
}

/// A snapshot of a tab as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tab {
    pub id: TabId,
    pub index: usize,
    pub url: Option<String>,
    pub pending_url: Option<String>,
    pub title: String,
    pub active: bool,
    /// The host's native pin flag. Soft pins are tracked by the coordinator.
    pub pinned: bool,
    pub audible: bool,
}

impl Tab {
    pub fn is_restricted(&self) -> bool { is_url_restricted(self.url.as_deref()) }

    pub fn is_new_tab_page(&self) -> bool {
        self.pending_url.as_deref() == Some(NEW_TAB_URL) || self.url.as_deref() == Some(NEW_TAB_URL)
    }
}

/// Pages the host refuses to inject scripts into.
pub fn is_url_restricted(url: Option<&str>) -> bool {
    match url {
        None | Some("") => true,
        Some(url) => RESTRICTED_PREFIXES.iter().any(|prefix| url.starts_with(prefix)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Loading,
    Complete,
}

/// The "changeInfo" half of a tab-updated notification. Only fields that
/// changed are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabChange {
    pub url: Option<String>,
    pub status: Option<LoadStatus>,
    pub pinned: Option<bool>,
    pub title: Option<String>,
}

/// A tab query scoped to the current window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabQuery {
    pub active: Option<bool>,
    pub index: Option<usize>,
}

impl TabQuery {
    pub fn window() -> Self { Self::default() }

    pub fn active() -> Self { Self { active: Some(true), index: None } }

    pub fn at_index(index: usize) -> Self { Self { active: None, index: Some(index) } }

    pub fn matches(&self, tab: &Tab) -> bool {
        self.active.is_none_or(|active| tab.active == active)
            && self.index.is_none_or(|index| tab.index == index)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabUpdate {
    pub active: bool,
    pub highlighted: bool,
}

impl TabUpdate {
    pub fn activate() -> Self { Self { active: true, highlighted: false } }

    pub fn activate_and_highlight() -> Self { Self { active: true, highlighted: true } }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(url: Option<&str>) -> Tab {
        Tab {
            id: TabId::new(1),
            url: url.map(str::to_string),
            ..Tab::default()
        }
    }

    #[test]
    fn internal_and_store_pages_are_restricted() {
        assert!(tab(None).is_restricted());
        assert!(tab(Some("chrome://settings")).is_restricted());
        assert!(tab(Some("edge://flags")).is_restricted());
        assert!(tab(Some("about:blank")).is_restricted());
        assert!(tab(Some("chrome-extension://abc/options.html")).is_restricted());
        assert!(tab(Some("https://chrome.google.com/webstore/detail/x")).is_restricted());
        assert!(!tab(Some("https://example.com")).is_restricted());
        assert!(!tab(Some("file:///tmp/notes.txt")).is_restricted());
    }

    #[test]
    fn new_tab_page_is_detected_from_pending_url() {
        let mut t = tab(None);
        t.pending_url = Some(NEW_TAB_URL.to_string());
        assert!(t.is_new_tab_page());
        assert!(!tab(Some("https://example.com")).is_new_tab_page());
    }

    #[test]
    fn query_filters_on_present_fields_only() {
        let mut t = tab(Some("https://example.com"));
        t.index = 3;
        t.active = true;
        assert!(TabQuery::window().matches(&t));
        assert!(TabQuery::active().matches(&t));
        assert!(TabQuery::at_index(3).matches(&t));
        assert!(!TabQuery::at_index(0).matches(&t));
        t.active = false;
        assert!(!TabQuery::active().matches(&t));
    }
}
