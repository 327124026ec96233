//! Fine-grained timers for the coordinator.
//!
//! The coordinator picks the handle; this actor only sleeps and reports back
//! with [`Event::TimerFired`]. A cancelled timer never reports.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{Instrument, debug, trace};

use crate::actor;
use crate::actor::coordinator::{self, Event};
use crate::common::collections::HashMap;
use crate::model::machine::{TimerHandle, TimerKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    Once {
        handle: TimerHandle,
        after: Duration,
        kind: TimerKind,
    },
    Every {
        handle: TimerHandle,
        period: Duration,
        kind: TimerKind,
    },
    Cancel(TimerHandle),
}

pub type Sender = actor::Sender<Request>;
pub type Receiver = actor::Receiver<Request>;

pub struct TimerService {
    events_tx: coordinator::Sender,
    requests_rx: Receiver,
    timers: HashMap<TimerHandle, JoinHandle<()>>,
}

impl TimerService {
    pub fn new(events_tx: coordinator::Sender, requests_rx: Receiver) -> Self {
        TimerService {
            events_tx,
            requests_rx,
            timers: HashMap::default(),
        }
    }

    pub async fn run(mut self) {
        while let Some((span, request)) = self.requests_rx.recv().await {
            span.in_scope(|| self.on_request(request));
        }
        for (_, task) in self.timers.drain() {
            task.abort();
        }
    }

    fn on_request(&mut self, request: Request) {
        self.timers.retain(|_, task| !task.is_finished());
        match request {
            Request::Once { handle, after, kind } => {
                trace!(%handle, ?kind, ?after, "arming one-shot");
                let events_tx = self.events_tx.clone();
                let task = tokio::spawn(
                    async move {
                        time::sleep(after).await;
                        events_tx.send(Event::TimerFired { handle, kind });
                    }
                    .in_current_span(),
                );
                self.replace(handle, task);
            }
            Request::Every { handle, period, kind } => {
                trace!(%handle, ?kind, ?period, "arming interval");
                let events_tx = self.events_tx.clone();
                let task = tokio::spawn(
                    async move {
                        let mut ticks = time::interval_at(Instant::now() + period, period);
                        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
                        loop {
                            ticks.tick().await;
                            if events_tx.is_closed() {
                                break;
                            }
                            events_tx.send(Event::TimerFired { handle, kind });
                        }
                    }
                    .in_current_span(),
                );
                self.replace(handle, task);
            }
            Request::Cancel(handle) => match self.timers.remove(&handle) {
                Some(task) => task.abort(),
                None => trace!(%handle, "cancel for a timer that already finished"),
            },
        }
    }

    fn replace(&mut self, handle: TimerHandle, task: JoinHandle<()>) {
        if let Some(old) = self.timers.insert(handle, task) {
            debug!(%handle, "timer handle reused; dropping the older timer");
            old.abort();
        }
    }
}
