use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::common::collections::{BTreeMap, BTreeSet};
use crate::model::{TabId, Timestamp};

/// State that survives restarts but never leaves the machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalState {
    pub pinned_tabs: BTreeSet<TabId>,
    pub tab_last_activated: BTreeMap<TabId, Timestamp>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not determine the data directory")]
    NoDataDir,
    #[error("local state io at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("corrupt local state: {0}")]
    Json(#[from] serde_json::Error),
}

/// A JSON file holding [`LocalState`].
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { LocalStore { path: path.into() } }

    pub fn default_location() -> Result<Self, StoreError> {
        let dir = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
        Ok(LocalStore::new(dir.join("tbbr").join("local.json")))
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn load(&self) -> Result<LocalState, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "no local state yet");
                Ok(LocalState::default())
            }
            Err(source) => Err(self.io_error(source)),
        }
    }

    pub fn save(&self, state: &LocalState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_vec_pretty(state)?;
        fs::write(&self.path, json).map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("nested").join("local.json"));
        assert_eq!(store.load().unwrap(), LocalState::default());

        let mut state = LocalState::default();
        state.pinned_tabs.insert(TabId::new(3));
        state.tab_last_activated.insert(TabId::new(3), 1_700_000_000_000);
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("local.json"));
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }
}
