//! Per-partition event files.
//!
//! Each partition key owns one pretty-printed JSON array at
//! `<events_dir>/<key>.json`. Saves go through a temp file in the same
//! directory followed by a rename, so readers see either the old or the new
//! list, never a partial write.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{AgendaError, AgendaResult};
use crate::event::{Event, EventId};
use crate::identity::PartitionKey;

#[derive(Debug, Clone)]
pub struct EventStore {
    dir: PathBuf,
}

impl EventStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        EventStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: &PartitionKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }

    /// Load a partition, treating a missing or corrupt file as empty.
    ///
    /// Corruption is logged and swallowed; it never reaches the caller.
    pub fn load(&self, key: &PartitionKey) -> Vec<Event> {
        match self.try_load(key) {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(partition = %key, error = %e, "could not load events, starting empty");
                Vec::new()
            }
        }
    }

    /// Load a partition, reporting corruption instead of hiding it.
    ///
    /// Records written without an id get one here and the file is rewritten
    /// so the ids stay stable across loads.
    pub fn try_load(&self, key: &PartitionKey) -> AgendaResult<Vec<Event>> {
        let path = self.path(key);

        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AgendaError::StoreCorrupt {
                    path,
                    reason: e.to_string(),
                });
            }
        };

        let mut events: Vec<Event> =
            serde_json::from_str(&contents).map_err(|e| AgendaError::StoreCorrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let mut assigned = false;
        for event in events.iter_mut().filter(|e| e.id.is_unassigned()) {
            event.id = EventId::new();
            assigned = true;
        }

        if assigned {
            tracing::info!(partition = %key, "assigned ids to legacy events");
            if let Err(e) = self.save(key, &events) {
                tracing::error!(partition = %key, error = %e, "could not persist assigned event ids");
            }
        }

        Ok(events)
    }

    /// Replace the whole partition with `events`.
    pub fn save(&self, key: &PartitionKey, events: &[Event]) -> AgendaResult<()> {
        let path = self.path(key);
        self.write(&path, events).inspect_err(|e| {
            tracing::error!(partition = %key, error = %e, "could not save events");
        })
    }

    fn write(&self, path: &Path, events: &[Event]) -> AgendaResult<()> {
        let write_err = |source: std::io::Error| AgendaError::StoreWrite {
            path: path.to_path_buf(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(write_err)?;

        let contents = serde_json::to_string_pretty(events)
            .map_err(|e| AgendaError::Serialization(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(contents.as_bytes()).map_err(write_err)?;
        tmp.write_all(b"\n").map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        Ok(())
    }

    /// Delete a partition's file. Missing files are not an error.
    pub fn remove(&self, key: &PartitionKey) -> AgendaResult<()> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
