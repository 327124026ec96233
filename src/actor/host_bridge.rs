//! Runs the coordinator's host calls and feeds the results back as events.
//!
//! Requests are executed one at a time in the order they were sent, so two
//! title writes to the same tab can never land out of order. Unsaved-change
//! probes are the exception: they wait on a page and run alongside, each
//! bounded by [`UNSAVED_PROBE_TIMEOUT`].

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, trace, warn};

use crate::actor;
use crate::actor::coordinator::{self, Continuation, Event, SweepId};
use crate::model::{Tab, TabId, TabQuery, TabUpdate};
use crate::sys::host::{HostError, Notification, PageMessage, Script, TabHost, TabPosition};
use crate::sys::store::LocalState;

pub const UNSAVED_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Request {
    QueryTabs {
        query: TabQuery,
        then: Continuation,
    },
    GetTab {
        tab_id: TabId,
        then: Continuation,
    },
    MoveTab {
        tab_id: TabId,
        position: TabPosition,
    },
    UpdateTab {
        tab_id: TabId,
        update: TabUpdate,
    },
    RemoveTabs {
        tabs: Vec<TabId>,
        then: Option<Continuation>,
    },
    Inject {
        tab_id: TabId,
        script: Script,
        all_frames: bool,
    },
    SendMessage {
        tab_id: TabId,
        message: PageMessage,
    },
    CheckUnsaved {
        sweep: SweepId,
        tab: Tab,
    },
    SetAlarm {
        name: String,
        period: Duration,
    },
    ClearAlarm {
        name: String,
    },
    Notify(Notification),
    PersistLocal(LocalState),
    RestoreLastClosed,
}

pub type Sender = actor::Sender<Request>;
pub type Receiver = actor::Receiver<Request>;

pub struct HostBridge<H> {
    host: Arc<H>,
    events_tx: coordinator::Sender,
    requests_rx: Receiver,
}

impl<H: TabHost> HostBridge<H> {
    pub fn new(host: Arc<H>, events_tx: coordinator::Sender, requests_rx: Receiver) -> Self {
        HostBridge { host, events_tx, requests_rx }
    }

    pub async fn run(mut self) {
        while let Some((span, request)) = self.requests_rx.recv().await {
            self.execute(request).instrument(span).await;
        }
        debug!("host bridge stopped");
    }

    async fn execute(&self, request: Request) {
        trace!(?request, "host request");
        match request {
            Request::QueryTabs { query, then } => {
                let tabs = self.host.query_tabs(query).await.unwrap_or_else(|e| {
                    warn!(?query, "tab query failed: {e}");
                    Vec::new()
                });
                self.events_tx.send(Event::TabsQueried { then, tabs });
            }
            Request::GetTab { tab_id, then } => {
                let tab = match self.host.get_tab(tab_id).await {
                    Ok(tab) => Some(tab),
                    Err(HostError::TabNotFound(_)) => {
                        debug!(%tab_id, "tab is gone");
                        None
                    }
                    Err(e) => {
                        warn!(%tab_id, "get tab failed: {e}");
                        None
                    }
                };
                self.events_tx.send(Event::TabFetched { then, tab_id, tab });
            }
            Request::MoveTab { tab_id, position } => {
                if let Err(e) = self.host.move_tab(tab_id, position).await {
                    warn!(%tab_id, ?position, "move failed: {e}");
                }
            }
            Request::UpdateTab { tab_id, update } => {
                if let Err(e) = self.host.update_tab(tab_id, update).await {
                    warn!(%tab_id, ?update, "update failed: {e}");
                }
            }
            Request::RemoveTabs { tabs, then } => {
                let removed = match self.host.remove_tabs(tabs.clone()).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(?tabs, "remove failed: {e}");
                        false
                    }
                };
                if let Some(then) = then {
                    self.events_tx.send(Event::TabsRemoved { then, removed });
                }
            }
            Request::Inject { tab_id, script, all_frames } => {
                match self.host.inject(tab_id, script, all_frames).await {
                    Ok(()) => {}
                    Err(HostError::Restricted(_) | HostError::TabNotFound(_)) => {
                        trace!(%tab_id, "skipped injection");
                    }
                    Err(e) => debug!(%tab_id, "injection failed: {e}"),
                }
            }
            Request::SendMessage { tab_id, message } => {
                if let Err(e) = self.host.send_message(tab_id, message).await {
                    trace!(%tab_id, ?message, "page did not take message: {e}");
                }
            }
            Request::CheckUnsaved { sweep, tab } => self.spawn_unsaved_probe(sweep, tab),
            Request::SetAlarm { name, period } => {
                if let Err(e) = self.host.set_alarm(&name, period).await {
                    warn!(%name, "could not set alarm: {e}");
                }
            }
            Request::ClearAlarm { name } => {
                if let Err(e) = self.host.clear_alarm(&name).await {
                    warn!(%name, "could not clear alarm: {e}");
                }
            }
            Request::Notify(notification) => {
                if let Err(e) = self.host.notify(notification).await {
                    warn!("notification failed: {e}");
                }
            }
            Request::PersistLocal(state) => {
                if let Err(e) = self.host.persist_local(state).await {
                    warn!("persisting local state failed: {e}");
                }
            }
            Request::RestoreLastClosed => {
                if let Err(e) = self.host.restore_last_closed().await {
                    warn!("reopen failed: {e}");
                }
            }
        }
    }

    /// A page that does not answer in time is assumed to have unsaved work.
    fn spawn_unsaved_probe(&self, sweep: SweepId, tab: Tab) {
        let host = Arc::clone(&self.host);
        let events_tx = self.events_tx.clone();
        tokio::spawn(
            async move {
                let probe = host.send_message(tab.id, PageMessage::CheckUnsaved);
                let has_unsaved_changes =
                    match tokio::time::timeout(UNSAVED_PROBE_TIMEOUT, probe).await {
                        Ok(Ok(Some(response))) => response.has_unsaved_changes,
                        Ok(Ok(None)) => {
                            debug!(tab_id = %tab.id, "page has no unsaved-changes listener");
                            true
                        }
                        Ok(Err(e)) => {
                            debug!(tab_id = %tab.id, "unsaved-changes probe failed: {e}");
                            true
                        }
                        Err(_) => {
                            debug!(tab_id = %tab.id, "unsaved-changes probe timed out");
                            true
                        }
                    };
                events_tx.send(Event::UnsavedChecked { sweep, tab, has_unsaved_changes });
            }
            .in_current_span(),
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sys::memory_host::MemoryHost;

    fn tab(id: u32) -> Tab {
        Tab {
            id: TabId::new(id),
            url: Some(format!("https://{id}.test/")),
            title: format!("Tab {id}"),
            ..Tab::default()
        }
    }

    async fn next_event(rx: &mut coordinator::Receiver) -> Event {
        rx.recv().await.map(|(_, event)| event).expect("bridge reply")
    }

    fn spawn_bridge(host: Arc<MemoryHost>) -> (Sender, coordinator::Receiver) {
        let (events_tx, events_rx) = actor::channel();
        let (requests_tx, requests_rx) = actor::channel();
        tokio::spawn(HostBridge::new(host, events_tx, requests_rx).run());
        (requests_tx, events_rx)
    }

    #[tokio::test]
    async fn query_and_fetch_reply_with_continuations() {
        let host = Arc::new(MemoryHost::new([tab(1), tab(2)]));
        let (requests, mut events) = spawn_bridge(host);

        requests.send(Request::QueryTabs {
            query: TabQuery::active(),
            then: Continuation::SeedHistory,
        });
        match next_event(&mut events).await {
            Event::TabsQueried { then, tabs } => {
                assert_eq!(then, Continuation::SeedHistory);
                assert_eq!(tabs.iter().map(|t| t.id).collect::<Vec<_>>(), vec![TabId::new(1)]);
            }
            other => panic!("unexpected {other:?}"),
        }

        requests.send(Request::GetTab { tab_id: TabId::new(40), then: Continuation::TogglePin });
        match next_event(&mut events).await {
            Event::TabFetched { tab_id, tab, .. } => {
                assert_eq!(tab_id, TabId::new(40));
                assert_eq!(tab, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_removal_is_reported_not_raised() {
        let host = Arc::new(MemoryHost::new([tab(1)]));
        let (requests, mut events) = spawn_bridge(Arc::clone(&host));
        requests.send(Request::RemoveTabs {
            tabs: vec![TabId::new(99)],
            then: Some(Continuation::Sweep),
        });
        match next_event(&mut events).await {
            Event::TabsRemoved { removed, .. } => assert!(!removed),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(host.tab_ids(), vec![TabId::new(1)]);
    }

    #[tokio::test]
    async fn silent_pages_count_as_unsaved() {
        let host = Arc::new(MemoryHost::new([tab(1), tab(2), tab(3)]));
        host.set_unsaved(TabId::new(2));
        host.set_unresponsive(TabId::new(3));
        let (requests, mut events) = spawn_bridge(host);
        let sweep = SweepId::new(1);
        for id in 1..=3 {
            requests.send(Request::CheckUnsaved { sweep, tab: tab(id) });
        }
        let mut answers = Vec::new();
        for _ in 0..3 {
            if let Event::UnsavedChecked { tab, has_unsaved_changes, .. } =
                next_event(&mut events).await
            {
                answers.push((tab.id.get(), has_unsaved_changes));
            }
        }
        answers.sort();
        assert_eq!(answers, vec![(1, false), (2, true), (3, true)]);
    }
}
