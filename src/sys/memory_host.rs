//! A single-window browser kept in memory. It answers the same calls a real
//! host would and, once connected, reports activations, removals and restores
//! back to the coordinator the way the browser's own notifications do.

use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use super::host::{
    HostError, Notification, PageMessage, PageResponse, Script, TabHost, TabPosition,
};
use super::store::LocalState;
use crate::actor::coordinator::{self, Event};
use crate::common::collections::{BTreeMap, HashSet};
use crate::model::{Tab, TabId, TabQuery, TabUpdate};

#[derive(Default)]
struct Inner {
    tabs: Vec<Tab>,
    closed: Vec<Tab>,
    next_id: u32,
    alarms: BTreeMap<String, Duration>,
    notifications: Vec<Notification>,
    persisted: Option<LocalState>,
    unsaved: HashSet<TabId>,
    unresponsive: HashSet<TabId>,
    scripts: Vec<(TabId, Script)>,
    messages: Vec<(TabId, PageMessage)>,
    events: Option<coordinator::Sender>,
}

impl Inner {
    fn reindex(&mut self) {
        for (index, tab) in self.tabs.iter_mut().enumerate() {
            tab.index = index;
        }
    }

    fn find(&self, id: TabId) -> Result<usize, HostError> {
        self.tabs.iter().position(|t| t.id == id).ok_or(HostError::TabNotFound(id))
    }

    fn emit(&self, event: Event) {
        if let Some(events) = &self.events {
            events.send(event);
        }
    }
}

#[derive(Default)]
pub struct MemoryHost {
    inner: Mutex<Inner>,
}

impl MemoryHost {
    /// A window holding `tabs` in order. The first tab marked active wins;
    /// if none is, the first tab is active.
    pub fn new(tabs: impl IntoIterator<Item = Tab>) -> Self {
        let mut inner = Inner::default();
        inner.tabs = tabs.into_iter().collect();
        let active = inner.tabs.iter().position(|t| t.active).unwrap_or(0);
        for (index, tab) in inner.tabs.iter_mut().enumerate() {
            tab.active = index == active;
        }
        inner.next_id = inner.tabs.iter().map(|t| t.id.get()).max().unwrap_or(0) + 1;
        inner.reindex();
        MemoryHost { inner: Mutex::new(inner) }
    }

    pub fn connect(&self, events: coordinator::Sender) { self.inner.lock().events = Some(events); }

    pub fn tabs(&self) -> Vec<Tab> { self.inner.lock().tabs.clone() }

    pub fn tab_ids(&self) -> Vec<TabId> { self.inner.lock().tabs.iter().map(|t| t.id).collect() }

    pub fn title_of(&self, id: TabId) -> Option<String> {
        let inner = self.inner.lock();
        inner.tabs.iter().find(|t| t.id == id).map(|t| t.title.clone())
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.inner.lock().tabs.iter().find(|t| t.active).map(|t| t.id)
    }

    /// Activates a tab as if the user clicked it.
    pub fn activate(&self, id: TabId) {
        let mut inner = self.inner.lock();
        if Self::set_active(&mut inner, id) {
            inner.emit(Event::TabActivated(id));
        }
    }

    pub fn set_unsaved(&self, id: TabId) { self.inner.lock().unsaved.insert(id); }

    pub fn set_unresponsive(&self, id: TabId) { self.inner.lock().unresponsive.insert(id); }

    pub fn notifications(&self) -> Vec<Notification> { self.inner.lock().notifications.clone() }

    pub fn alarms(&self) -> BTreeMap<String, Duration> { self.inner.lock().alarms.clone() }

    pub fn persisted(&self) -> Option<LocalState> { self.inner.lock().persisted.clone() }

    pub fn scripts(&self) -> Vec<(TabId, Script)> { self.inner.lock().scripts.clone() }

    pub fn messages(&self) -> Vec<(TabId, PageMessage)> { self.inner.lock().messages.clone() }

    fn set_active(inner: &mut Inner, id: TabId) -> bool {
        if !inner.tabs.iter().any(|t| t.id == id) {
            return false;
        }
        let mut changed = false;
        for tab in &mut inner.tabs {
            let active = tab.id == id;
            changed |= active && !tab.active;
            tab.active = active;
        }
        changed
    }
}

impl TabHost for MemoryHost {
    async fn query_tabs(&self, query: TabQuery) -> Result<Vec<Tab>, HostError> {
        let inner = self.inner.lock();
        Ok(inner.tabs.iter().filter(|t| query.matches(t)).cloned().collect())
    }

    async fn get_tab(&self, tab: TabId) -> Result<Tab, HostError> {
        let inner = self.inner.lock();
        let index = inner.find(tab)?;
        Ok(inner.tabs[index].clone())
    }

    async fn move_tab(&self, tab: TabId, position: TabPosition) -> Result<(), HostError> {
        let mut inner = self.inner.lock();
        let from = inner.find(tab)?;
        let moved = inner.tabs.remove(from);
        let to = match position {
            TabPosition::Index(index) => index.min(inner.tabs.len()),
            TabPosition::End => inner.tabs.len(),
        };
        inner.tabs.insert(to, moved);
        inner.reindex();
        trace!(%tab, from, to, "moved");
        Ok(())
    }

    async fn update_tab(&self, tab: TabId, update: TabUpdate) -> Result<(), HostError> {
        let mut inner = self.inner.lock();
        inner.find(tab)?;
        if update.active && Self::set_active(&mut inner, tab) {
            inner.emit(Event::TabActivated(tab));
        }
        Ok(())
    }

    async fn remove_tabs(&self, tabs: Vec<TabId>) -> Result<(), HostError> {
        let mut inner = self.inner.lock();
        for id in &tabs {
            inner.find(*id)?;
        }
        let was_active = inner.tabs.iter().find(|t| t.active).map(|t| t.id);
        for id in tabs {
            let index = inner.find(id)?;
            let tab = inner.tabs.remove(index);
            inner.closed.push(tab);
            inner.emit(Event::TabRemoved(id));
        }
        inner.reindex();
        if was_active.is_some_and(|id| inner.find(id).is_err())
            && let Some(next) = inner.tabs.first().map(|t| t.id)
        {
            Self::set_active(&mut inner, next);
            inner.emit(Event::TabActivated(next));
        }
        Ok(())
    }

    async fn inject(&self, tab: TabId, script: Script, _all_frames: bool) -> Result<(), HostError> {
        let mut inner = self.inner.lock();
        let index = inner.find(tab)?;
        if inner.tabs[index].is_restricted() {
            return Err(HostError::Restricted(tab));
        }
        if let Script::SetTitle { title } = &script {
            inner.tabs[index].title = title.clone();
        }
        inner.scripts.push((tab, script));
        Ok(())
    }

    async fn send_message(
        &self,
        tab: TabId,
        message: PageMessage,
    ) -> Result<Option<PageResponse>, HostError> {
        let mut inner = self.inner.lock();
        inner.find(tab)?;
        inner.messages.push((tab, message));
        if inner.unresponsive.contains(&tab) {
            return Err(HostError::NoResponse(tab));
        }
        Ok(match message {
            PageMessage::CheckUnsaved => Some(PageResponse {
                has_unsaved_changes: inner.unsaved.contains(&tab),
            }),
            PageMessage::CleanupPickMode => None,
        })
    }

    async fn set_alarm(&self, name: &str, period: Duration) -> Result<(), HostError> {
        self.inner.lock().alarms.insert(name.to_string(), period);
        Ok(())
    }

    async fn clear_alarm(&self, name: &str) -> Result<(), HostError> {
        self.inner.lock().alarms.remove(name);
        Ok(())
    }

    async fn notify(&self, notification: Notification) -> Result<(), HostError> {
        self.inner.lock().notifications.push(notification);
        Ok(())
    }

    async fn persist_local(&self, state: LocalState) -> Result<(), HostError> {
        self.inner.lock().persisted = Some(state);
        Ok(())
    }

    async fn restore_last_closed(&self) -> Result<(), HostError> {
        let mut inner = self.inner.lock();
        let Some(mut tab) = inner.closed.pop() else {
            return Err(HostError::Other("nothing to restore".into()));
        };
        tab.id = TabId::new(inner.next_id);
        inner.next_id += 1;
        tab.active = false;
        inner.tabs.push(tab.clone());
        inner.reindex();
        let id = tab.id;
        let restored = inner.tabs.last().cloned().unwrap_or(tab);
        inner.emit(Event::TabCreated(restored));
        if Self::set_active(&mut inner, id) {
            inner.emit(Event::TabActivated(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn tab(id: u32, url: &str) -> Tab {
        Tab {
            id: TabId::new(id),
            url: Some(url.to_string()),
            title: format!("tab {id}"),
            ..Tab::default()
        }
    }

    fn ids(raw: &[u32]) -> Vec<TabId> { raw.iter().copied().map(TabId::new).collect() }

    #[tokio::test]
    async fn moves_keep_indices_dense() {
        let host = MemoryHost::new([
            tab(1, "https://a.test"),
            tab(2, "https://b.test"),
            tab(3, "https://c.test"),
        ]);
        host.move_tab(TabId::new(3), TabPosition::Index(0)).await.unwrap();
        assert_eq!(host.tab_ids(), ids(&[3, 1, 2]));
        host.move_tab(TabId::new(3), TabPosition::End).await.unwrap();
        assert_eq!(host.tab_ids(), ids(&[1, 2, 3]));
        let indices: Vec<usize> = host.tabs().iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn restricted_pages_refuse_scripts() {
        let host = MemoryHost::new([tab(1, "chrome://settings")]);
        let err = host
            .inject(TabId::new(1), Script::SetTitle { title: "x".into() }, false)
            .await
            .unwrap_err();
        assert_eq!(err, HostError::Restricted(TabId::new(1)));
    }

    #[tokio::test]
    async fn activation_and_removal_are_reported() {
        let host = MemoryHost::new([tab(1, "https://a.test"), tab(2, "https://b.test")]);
        let (tx, mut rx) = crate::actor::channel();
        host.connect(tx);
        host.update_tab(TabId::new(2), TabUpdate::activate()).await.unwrap();
        host.remove_tabs(vec![TabId::new(2)]).await.unwrap();

        let mut seen = Vec::new();
        while let Ok((_, event)) = rx.try_recv() {
            seen.push(format!("{event:?}"));
        }
        assert_eq!(
            seen,
            vec![
                format!("{:?}", Event::TabActivated(TabId::new(2))),
                format!("{:?}", Event::TabRemoved(TabId::new(2))),
                format!("{:?}", Event::TabActivated(TabId::new(1))),
            ]
        );

        host.restore_last_closed().await.unwrap();
        assert_eq!(host.tab_ids(), ids(&[1, 3]));
        assert_eq!(host.active_tab(), Some(TabId::new(3)));
    }

    #[tokio::test]
    async fn unsaved_probe_answers_per_tab() {
        let host = MemoryHost::new([tab(1, "https://a.test"), tab(2, "https://b.test")]);
        host.set_unsaved(TabId::new(1));
        host.set_unresponsive(TabId::new(2));
        let reply = host.send_message(TabId::new(1), PageMessage::CheckUnsaved).await.unwrap();
        assert_eq!(reply, Some(PageResponse { has_unsaved_changes: true }));
        assert!(host.send_message(TabId::new(2), PageMessage::CheckUnsaved).await.is_err());
    }
}
