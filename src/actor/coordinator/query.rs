use std::sync::mpsc::{RecvError, SyncSender, sync_channel};

use serde::Serialize;

use super::managers::Machines;
use crate::actor::coordinator::{Coordinator, Event, Sender};
use crate::common::collections::BTreeMap;
use crate::model::{TabId, Timestamp};

/// Blocking read access to a running coordinator. Must not be used from the
/// thread that drives the coordinator itself.
#[derive(Clone)]
pub struct CoordinatorQueryHandle {
    tx: Sender,
}

impl CoordinatorQueryHandle {
    pub(super) fn new(tx: Sender) -> Self { Self { tx } }

    fn send_query<T>(
        &self,
        build: impl FnOnce(SyncSender<T>) -> QueryRequest,
    ) -> Result<T, RecvError> {
        let (tx, rx) = sync_channel(1);
        if self.tx.try_send(Event::Query(build(tx))).is_err() {
            return Err(RecvError);
        }
        rx.recv().map_err(|_| RecvError)
    }

    pub fn snapshot(&self) -> Option<Snapshot> { self.send_query(QueryRequest::Snapshot).ok() }

    pub fn history(&self) -> Vec<TabId> {
        self.send_query(QueryRequest::History).unwrap_or_default()
    }
}

#[derive(Debug)]
pub enum QueryRequest {
    Snapshot(SyncSender<Snapshot>),
    History(SyncSender<Vec<TabId>>),
}

/// Everything the coordinator knows, for inspection and replay output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub history: Vec<TabId>,
    pub soft_pinned: Vec<TabId>,
    pub new_tabs: Vec<TabId>,
    pub last_activated: BTreeMap<TabId, Timestamp>,
    pub original_titles: BTreeMap<TabId, String>,
    pub machines: Machines,
    pub sweeps_in_flight: usize,
}

impl Coordinator {
    pub(super) fn handle_query_request(&mut self, request: QueryRequest) {
        match request {
            QueryRequest::Snapshot(resp) => {
                let _ = resp.send(self.snapshot());
            }
            QueryRequest::History(resp) => {
                let _ = resp.send(self.activity.history.as_slice().to_vec());
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            history: self.activity.history.as_slice().to_vec(),
            soft_pinned: self.pins.soft().iter().copied().collect(),
            new_tabs: self.activity.new_tabs.iter().copied().collect(),
            last_activated: self.activity.last_activated.clone(),
            original_titles: self
                .titles
                .originals
                .iter()
                .map(|(id, title)| (*id, title.clone()))
                .collect(),
            machines: self.machines.clone(),
            sweeps_in_flight: self.sweeps.in_flight(),
        }
    }
}
