//! Event recording and deterministic replay.
//!
//! A recording is one JSON object per line: the clock reading when the event
//! was handled and the event itself. Replaying feeds those events to a fresh
//! coordinator on a [`ManualClock`] and reports every request it makes.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::{Coordinator, Event, Snapshot};
use crate::actor::{self, host_bridge, timer};
use crate::common::config::Settings;
use crate::model::Timestamp;
use crate::sys::clock::ManualClock;
use crate::sys::store::LocalState;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("cannot access recording {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("bad record on line {line}: {source}")]
    Json { line: usize, source: serde_json::Error },
}

#[derive(Serialize)]
struct EntryRef<'a> {
    at: Timestamp,
    event: &'a Event,
}

#[derive(Deserialize)]
struct Entry {
    at: Timestamp,
    event: Event,
}

/// Where handled events are written, if anywhere.
pub struct Record {
    file: Option<BufWriter<File>>,
}

impl Record {
    pub fn new(path: &Path) -> Result<Record, ReplayError> {
        let file = File::create(path)
            .map_err(|source| ReplayError::Io { path: path.to_owned(), source })?;
        Ok(Record { file: Some(BufWriter::new(file)) })
    }

    pub fn disabled() -> Record { Record { file: None } }

    pub(super) fn on_event(&mut self, at: Timestamp, event: &Event) {
        if matches!(event, Event::Query(_)) {
            return;
        }
        let Some(file) = &mut self.file else {
            return;
        };
        let written = serde_json::to_writer(&mut *file, &EntryRef { at, event })
            .map_err(io::Error::from)
            .and_then(|()| writeln!(file))
            .and_then(|()| file.flush());
        if let Err(e) = written {
            warn!("recording stopped: {e}");
            self.file = None;
        }
    }
}

/// A request the coordinator made while replaying.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayOutput {
    Host(host_bridge::Request),
    Timer(timer::Request),
}

pub fn replay(
    path: &Path,
    settings: Settings,
    state: LocalState,
    mut output: impl FnMut(ReplayOutput),
) -> Result<Snapshot, ReplayError> {
    let io_error = |source| ReplayError::Io { path: path.to_owned(), source };
    let file = File::open(path).map_err(io_error)?;

    let clock = ManualClock::new(0);
    let (host_tx, mut host_rx) = actor::channel();
    let (timer_tx, mut timer_rx) = actor::channel();
    let mut coordinator = Coordinator::new(
        settings,
        state,
        Arc::new(clock.clone()),
        host_tx,
        timer_tx,
        Record::disabled(),
    );

    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(io_error)?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: Entry = serde_json::from_str(&line)
            .map_err(|source| ReplayError::Json { line: number + 1, source })?;
        clock.set(entry.at);
        coordinator.handle_event(entry.event);

        while let Ok((_, request)) = host_rx.try_recv() {
            output(ReplayOutput::Host(request));
        }
        while let Ok((_, request)) = timer_rx.try_recv() {
            output(ReplayOutput::Timer(request));
        }
    }
    Ok(coordinator.snapshot())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::actor::coordinator::Continuation;
    use crate::model::{Command, Tab, TabId, TabQuery};

    fn tab(id: u32, index: usize, active: bool) -> Tab {
        Tab {
            id: TabId::new(id),
            index,
            url: Some(format!("https://{id}.test/")),
            title: format!("Tab {id}"),
            active,
            ..Tab::default()
        }
    }

    #[test]
    fn recorded_session_replays_to_the_same_requests() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");

        let mut record = Record::new(&path).unwrap();
        let events = [
            (1_000, Event::Startup),
            (1_010, Event::TabsQueried {
                then: Continuation::SeedHistory,
                tabs: vec![tab(1, 0, true), tab(2, 1, false)],
            }),
            (2_000, Event::Command(Command::MoveTabToEnd)),
        ];
        for (at, event) in &events {
            record.on_event(*at, event);
        }
        drop(record);

        let mut requests = Vec::new();
        let snapshot = replay(&path, Settings::default(), LocalState::default(), |out| {
            requests.push(out)
        })
        .unwrap();

        let queries: Vec<_> = requests
            .iter()
            .filter_map(|out| match out {
                ReplayOutput::Host(host_bridge::Request::QueryTabs { query, then }) => {
                    Some((*query, then.clone()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(queries, vec![
            (TabQuery::window(), Continuation::SeedHistory),
            (
                TabQuery::window(),
                Continuation::Navigate(crate::actor::coordinator::Navigation::MoveToEnd)
            ),
        ]);
        assert_eq!(snapshot.history, vec![TabId::new(1), TabId::new(2)]);
    }

    #[test]
    fn malformed_lines_name_their_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jsonl");
        std::fs::write(&path, "{\"at\":0,\"event\":\"Startup\"}\nnot json\n").unwrap();
        let err = replay(&path, Settings::default(), LocalState::default(), |_| {}).unwrap_err();
        assert!(matches!(err, ReplayError::Json { line: 2, .. }), "{err}");
    }
}
