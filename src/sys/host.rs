//! The contract with the browser-side collaborators: the tab directory,
//! script injection, page messaging, alarms, notifications and local storage.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::store::LocalState;
use crate::model::{Tab, TabId, TabQuery, TabUpdate};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("no tab with id {0}")]
    TabNotFound(TabId),
    #[error("cannot script restricted page in {0}")]
    Restricted(TabId),
    #[error("operation not allowed right now: {0}")]
    Disallowed(String),
    #[error("page in {0} did not respond")]
    NoResponse(TabId),
    #[error("{0}")]
    Other(String),
}

/// Where a moved tab should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabPosition {
    Index(usize),
    End,
}

/// A function run in a tab's page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "script", rename_all = "snake_case")]
pub enum Script {
    SetTitle { title: String },
    /// Installs the pick-mode key listener. `focus_capture` is set for the
    /// active tab, which grabs keyboard focus while the session lasts.
    InstallPickListener { focus_capture: bool },
}

/// One-shot messages sent to a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageMessage {
    CleanupPickMode,
    CheckUnsaved,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    pub has_unsaved_changes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub items: Vec<NotificationItem>,
}

pub trait TabHost: Send + Sync + 'static {
    /// Tabs of the current window matching `query`, in index order.
    fn query_tabs(
        &self,
        query: TabQuery,
    ) -> impl Future<Output = Result<Vec<Tab>, HostError>> + Send;

    fn get_tab(&self, tab: TabId) -> impl Future<Output = Result<Tab, HostError>> + Send;

    fn move_tab(
        &self,
        tab: TabId,
        position: TabPosition,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    fn update_tab(
        &self,
        tab: TabId,
        update: TabUpdate,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    fn remove_tabs(&self, tabs: Vec<TabId>) -> impl Future<Output = Result<(), HostError>> + Send;

    fn inject(
        &self,
        tab: TabId,
        script: Script,
        all_frames: bool,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    /// `Ok(None)` means the page had no listener for the message.
    fn send_message(
        &self,
        tab: TabId,
        message: PageMessage,
    ) -> impl Future<Output = Result<Option<PageResponse>, HostError>> + Send;

    fn set_alarm(
        &self,
        name: &str,
        period: Duration,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    fn clear_alarm(&self, name: &str) -> impl Future<Output = Result<(), HostError>> + Send;

    fn notify(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    fn persist_local(&self, state: LocalState)
    -> impl Future<Output = Result<(), HostError>> + Send;

    fn restore_last_closed(&self) -> impl Future<Output = Result<(), HostError>> + Send;
}
