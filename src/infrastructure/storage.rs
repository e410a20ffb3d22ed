//! JSON persistence gateway with debounced writes
//!
//! The whole document is rewritten on every save. Rapid saves coalesce:
//! each call replaces the pending document and supersedes the scheduled
//! write task, so after a quiet period only the latest document hits disk
//! (last-writer-wins, not a queue). Callers must therefore always pass the
//! complete current state.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::domain::AppData;
use crate::infrastructure::error::{StorageError, StorageResult};
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Quiet period before a debounced write fires.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Durable storage for the goal document as a single JSON file.
pub struct JsonStorage {
    inner: Arc<Inner>,
}

struct Inner {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    debounce: Duration,
    /// Single-slot latest-value mailbox drained by the scheduled task.
    pending: Mutex<Option<AppData>>,
    scheduled: Mutex<Option<JoinHandle<()>>>,
    save_failed: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl JsonStorage {
    pub fn new(path: impl Into<PathBuf>, debounce_ms: u64) -> Self {
        Self::with_fs(path, debounce_ms, Arc::new(RealFileSystem))
    }

    /// Create a storage gateway over a custom filesystem (for testing).
    pub fn with_fs(path: impl Into<PathBuf>, debounce_ms: u64, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            inner: Arc::new(Inner {
                fs,
                path: path.into(),
                debounce: Duration::from_millis(debounce_ms),
                pending: Mutex::new(None),
                scheduled: Mutex::new(None),
                save_failed: AtomicBool::new(false),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Read the backing file.
    ///
    /// A missing file yields a fresh empty document. A file that exists but
    /// does not parse or violates the domain invariants is an error; callers
    /// treat that as fatal rather than silently starting over.
    pub fn load(&self) -> StorageResult<AppData> {
        let inner = &self.inner;
        if !inner.fs.exists(&inner.path) {
            debug!("no document at {}, starting empty", inner.path.display());
            return Ok(AppData::default());
        }

        let content = inner
            .fs
            .read_to_string(&inner.path)
            .map_err(|e| StorageError::io(&inner.path, e))?;
        let data: AppData = serde_json::from_str(&content).map_err(|e| StorageError::Corrupt {
            path: inner.path.clone(),
            source: e,
        })?;
        data.validate().map_err(|e| StorageError::Invalid {
            path: inner.path.clone(),
            source: e,
        })?;
        Ok(data)
    }

    /// Request a debounced write of the full document.
    ///
    /// Inside a Tokio runtime the write is deferred by the debounce window
    /// and superseded by any later call. Without a runtime (one-shot CLI
    /// invocations) the write happens synchronously right away.
    ///
    /// Failures on the deferred path are logged, retried once and latched in
    /// [`last_save_failed`](Self::last_save_failed); they are not returned.
    pub fn save(&self, data: &AppData) {
        lock(&self.inner.pending).replace(data.clone());
        self.cancel_scheduled();

        match Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(&self.inner);
                let task = handle.spawn(async move {
                    tokio::time::sleep(inner.debounce).await;
                    if let Some(data) = lock(&inner.pending).take() {
                        inner.write_logged(&data);
                    }
                });
                lock(&self.inner.scheduled).replace(task);
            }
            Err(_) => {
                if let Some(data) = lock(&self.inner.pending).take() {
                    self.inner.write_logged(&data);
                }
            }
        }
    }

    /// Write synchronously, bypassing the debounce.
    ///
    /// Supersedes any pending debounced write so a stale deferred document
    /// cannot land after this one. Exactly one write of `data` is performed
    /// and failures are propagated.
    pub fn save_immediate(&self, data: &AppData) -> StorageResult<()> {
        self.cancel_scheduled();
        lock(&self.inner.pending).take();
        let result = self.inner.write_once(data);
        self.inner
            .save_failed
            .store(result.is_err(), Ordering::Relaxed);
        result
    }

    /// Whether the most recent write attempt failed.
    pub fn last_save_failed(&self) -> bool {
        self.inner.save_failed.load(Ordering::Relaxed)
    }

    fn cancel_scheduled(&self) {
        if let Some(task) = lock(&self.inner.scheduled).take() {
            task.abort();
        }
    }
}

impl Inner {
    /// One write attempt: stamp `last_modified`, encode, write.
    fn write_once(&self, data: &AppData) -> StorageResult<()> {
        let mut doc = data.clone();
        doc.last_modified = Some(Utc::now());

        let json = serde_json::to_string_pretty(&doc)
            .map_err(|e| StorageError::Encode { source: e })?;
        self.fs
            .ensure_parent(&self.path)
            .map_err(|e| StorageError::io(&self.path, e))?;
        self.fs
            .write(&self.path, &json)
            .map_err(|e| StorageError::io(&self.path, e))?;
        debug!("wrote document to {}", self.path.display());
        Ok(())
    }

    /// Debounced-path write: log and retry once, latch the outcome.
    fn write_logged(&self, data: &AppData) {
        if let Err(e) = self.write_once(data) {
            warn!("document write failed, retrying once: {}", e);
            if let Err(e) = self.write_once(data) {
                error!("document write failed after retry: {}", e);
                self.save_failed.store(true, Ordering::Relaxed);
                return;
            }
        }
        self.save_failed.store(false, Ordering::Relaxed);
    }
}
