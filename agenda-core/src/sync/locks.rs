use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use fs2::FileExt;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::{AgendaError, AgendaResult};
use crate::identity::PartitionKey;

/// Serializes load-modify-save cycles per partition key.
///
/// Tasks in one process queue on an async mutex; separate `agenda` processes
/// queue on an exclusive lock of `<events_dir>/<key>.lock`.
#[derive(Debug, Default)]
pub struct PartitionLocks {
    inner: Mutex<HashMap<PartitionKey, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of one cycle. Both locks release on drop.
#[derive(Debug)]
pub struct PartitionGuard {
    file: File,
    _task: OwnedMutexGuard<()>,
}

impl Drop for PartitionGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "could not release partition lock");
        }
    }
}

impl PartitionLocks {
    pub async fn lock(&self, dir: &Path, key: &PartitionKey) -> AgendaResult<PartitionGuard> {
        let task = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.entry(key.clone()).or_default().clone()
        };
        let task = task.lock_owned().await;

        let path = dir.join(format!("{}.lock", key.as_str()));
        let lock_err = |source: std::io::Error| AgendaError::StoreWrite {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(dir).map_err(lock_err)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(lock_err)?;

        // Another process may hold the lock for a whole push
        let file = tokio::task::spawn_blocking(move || file.lock_exclusive().map(|()| file))
            .await
            .map_err(|e| lock_err(std::io::Error::other(e)))?
            .map_err(lock_err)?;

        Ok(PartitionGuard { file, _task: task })
    }
}
