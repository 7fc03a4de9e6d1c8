//! Cross-process lock guarding every mutation of live state
//!
//! The lock is a file created exclusively in the profiles directory. It
//! records the holder's pid and the acquisition time in epoch milliseconds.
//! A lock older than the staleness threshold, or one that still cannot be
//! parsed once its write grace period has passed, is assumed to belong to a
//! dead process and is removed.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Lock files older than this are reclaimed
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(60);

/// Acquisition gives up after this long
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An unparseable lock file younger than this may still be being written
pub const DEFAULT_WRITE_GRACE: Duration = Duration::from_secs(1);

/// Errors acquiring the process lock
#[derive(Error, Debug)]
pub enum LockError {
    #[error(
        "Timed out after {}s waiting for lock {}. If no other claude-switch process is running, remove the lock file manually",
        .waited.as_secs(),
        .path.display()
    )]
    Timeout { path: PathBuf, waited: Duration },

    #[error("Lock error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            LockError::Timeout { .. } => "LOCK_TIMEOUT",
            LockError::Io { .. } => "IO_ERROR",
        }
    }
}

/// Timing parameters for lock acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockConfig {
    pub stale_after: Duration,
    pub timeout: Duration,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    pub write_grace: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
            timeout: DEFAULT_TIMEOUT,
            min_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(50),
            write_grace: DEFAULT_WRITE_GRACE,
        }
    }
}

/// Contents of the lock file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    pub pid: u32,
    /// Acquisition time in epoch milliseconds
    pub time: i64,
}

/// What was found at the lock path after a failed create
enum Holder {
    Live,
    Stale(String),
    Gone,
}

/// File-based mutual exclusion between processes
#[derive(Debug, Clone)]
pub struct ProcessLock {
    path: PathBuf,
    config: LockConfig,
}

impl ProcessLock {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, config: LockConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until the lock is held or the timeout passes
    ///
    /// # Errors
    /// Returns [`LockError::Timeout`] if another holder keeps the lock past the
    /// timeout, or [`LockError::Io`] on filesystem failures
    pub fn acquire(&self) -> Result<LockGuard, LockError> {
        let started = Instant::now();

        loop {
            if self.try_create()? {
                debug!(path = %self.path.display(), "acquired lock");
                return Ok(LockGuard {
                    path: self.path.clone(),
                });
            }

            match self.inspect() {
                Holder::Gone => continue,
                Holder::Stale(reason) => {
                    warn!(path = %self.path.display(), %reason, "removing stale lock");
                    match fs::remove_file(&self.path) {
                        Ok(()) => continue,
                        Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                        Err(e) => {
                            return Err(LockError::Io {
                                path: self.path.clone(),
                                source: e,
                            })
                        }
                    }
                }
                Holder::Live => {}
            }

            let waited = started.elapsed();
            if waited >= self.config.timeout {
                return Err(LockError::Timeout {
                    path: self.path.clone(),
                    waited,
                });
            }
            thread::sleep(self.backoff());
        }
    }

    /// Run `action` while holding the lock
    ///
    /// The lock is released when `action` returns, whether it succeeded,
    /// failed, or panicked.
    ///
    /// # Errors
    /// Returns the acquisition error, or whatever `action` returns
    pub fn with_lock<T, E, F>(&self, action: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<LockError>,
    {
        let _guard = self.acquire()?;
        action()
    }

    /// Create the lock file with its content in one step
    ///
    /// The record is written to a temp file and hard-linked into place, so a
    /// competing process never observes an empty lock. Filesystems without
    /// hard links fall back to an exclusive create.
    fn try_create(&self) -> Result<bool, LockError> {
        let io_err = |source| LockError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(io_err)?;

        let record = LockRecord {
            pid: std::process::id(),
            time: Utc::now().timestamp_millis(),
        };
        let content = serde_json::to_vec(&record)
            .map_err(|e| io_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        let mut temp = tempfile::Builder::new()
            .prefix(".tmp-lock-")
            .tempfile_in(dir)
            .map_err(io_err)?;
        temp.write_all(&content).map_err(io_err)?;
        temp.as_file().sync_all().map_err(io_err)?;

        match fs::hard_link(temp.path(), &self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => {
                debug!(error = %e, "hard link unavailable, using exclusive create");
                self.create_exclusive(&content)
            }
        }
    }

    fn create_exclusive(&self, content: &[u8]) -> Result<bool, LockError> {
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => {
                return Err(LockError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        if let Err(e) = file.write_all(content).and_then(|()| file.sync_all()) {
            drop(file);
            let _ = fs::remove_file(&self.path);
            return Err(LockError::Io {
                path: self.path.clone(),
                source: e,
            });
        }
        Ok(true)
    }

    fn inspect(&self) -> Holder {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Holder::Gone,
            Err(e) => return Holder::Stale(format!("unreadable: {e}")),
        };

        let Ok(record) = serde_json::from_str::<LockRecord>(&content) else {
            // an exclusive create writes its record after creating the file
            if self.within_write_grace() {
                return Holder::Live;
            }
            return Holder::Stale("corrupt lock file".to_string());
        };

        let age_ms = Utc::now().timestamp_millis().saturating_sub(record.time);
        let stale_ms = i64::try_from(self.config.stale_after.as_millis()).unwrap_or(i64::MAX);
        if age_ms > stale_ms {
            Holder::Stale(format!("held by pid {} for {age_ms}ms", record.pid))
        } else {
            Holder::Live
        }
    }

    fn within_write_grace(&self) -> bool {
        fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .is_some_and(|age| age < self.config.write_grace)
    }

    fn backoff(&self) -> Duration {
        let min = self.config.min_backoff;
        let max = self.config.max_backoff.max(min);
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Holds the lock until dropped
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // best effort: a leftover file is reclaimed once stale
        let _ = fs::remove_file(&self.path);
        debug!(path = %self.path.display(), "released lock");
    }
}
