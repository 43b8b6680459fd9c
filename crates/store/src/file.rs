// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON file store with atomic writes.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use burrow_core::{State, STATE_VERSION};
use parking_lot::RwLock;
use tracing::{error, warn};

use crate::{Store, StoreError};

/// File-backed store. One file holds the whole [`State`] as JSON.
///
/// The persisted file is a cache of user intent: a corrupt or
/// version-mismatched file is replaced with the default state rather than
/// failing the load, so the daemon never refuses to start over it.
pub struct FileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: RwLock::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_locked(&self) -> Result<State, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(State::default()),
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to read state file");
                return Err(e.into());
            }
        };

        match serde_json::from_slice::<State>(&data) {
            Ok(state) if state.version == STATE_VERSION => Ok(state),
            Ok(state) => {
                warn!(
                    path = %self.path.display(),
                    version = state.version,
                    expected = STATE_VERSION,
                    "unsupported state version, resetting to default state"
                );
                self.reset_locked()
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "corrupt state file detected, resetting to default state"
                );
                self.reset_locked()
            }
        }
    }

    fn reset_locked(&self) -> Result<State, StoreError> {
        let state = State::default();
        if let Err(e) = self.save_locked(&state) {
            error!(path = %self.path.display(), error = %e, "failed to save default state after reset");
        }
        Ok(state)
    }

    fn save_locked(&self, state: &State) -> Result<(), StoreError> {
        let data = serde_json::to_vec(state)?;

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        // Atomic write: sibling temp file, then rename over the target.
        let mut tmp_name: OsString = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, &data)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl Store for FileStore {
    fn load(&self) -> Result<State, StoreError> {
        let _guard = self.lock.read();
        self.load_locked()
    }

    fn save(&self, state: &State) -> Result<(), StoreError> {
        let _guard = self.lock.write();
        self.save_locked(state)
    }

    fn update(
        &self,
        mutate: &mut dyn FnMut(&mut State) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.write();
        let mut state = self.load_locked()?;
        mutate(&mut state)?;
        self.save_locked(&state)
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
