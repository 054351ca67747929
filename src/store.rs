//! Persistence of execution state between sessions.

use crate::engine::ExecutionState;
use crate::error::StoreError;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where an `ExecutionState` lives between sessions.
pub trait SnapshotStore {
    /// Returns `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<ExecutionState>, StoreError>;
    fn save(&mut self, state: &ExecutionState) -> Result<(), StoreError>;
}

impl ExecutionState {
    /// Serializes the state using the bincode format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        encode_to_vec(self, standard()).map_err(|e| StoreError::Encode(e.to_string()))
    }

    /// Deserializes a state from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        decode_from_slice(bytes, standard())
            .map(|(state, _)| state)
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Keeps the state in a single bincode file.
///
/// Saves go to a sibling file named `<file>.tmp` first and are renamed into
/// place, so a crash mid-write leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The store path with `.tmp` appended to its full file name.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, e: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<ExecutionState>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let state = ExecutionState::from_bytes(&bytes)?;
        debug!(path = %self.path.display(), "execution state loaded");
        Ok(Some(state))
    }

    fn save(&mut self, state: &ExecutionState) -> Result<(), StoreError> {
        let bytes = state.to_bytes()?;
        let tmp = self.temp_path();

        if let Err(e) = write_synced(&tmp, &bytes).and_then(|()| fs::rename(&tmp, &self.path)) {
            // The temp file may never have been created.
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(e));
        }

        debug!(path = %self.path.display(), bytes = bytes.len(), "execution state saved");
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Keeps the encoded state in memory. Useful for tests and short-lived hosts.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    bytes: Option<Vec<u8>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<ExecutionState>, StoreError> {
        self.bytes
            .as_deref()
            .map(ExecutionState::from_bytes)
            .transpose()
    }

    fn save(&mut self, state: &ExecutionState) -> Result<(), StoreError> {
        self.bytes = Some(state.to_bytes()?);
        Ok(())
    }
}
