//! Advisory, path-scoped exclusive locking with stale-lock recovery.
//!
//! The Checkpoint Store (`spec.md` §4.6) requires that concurrent `activate`
//! operations on `index.toml` serialize into a total order with exactly one
//! winner (invariant 9). This crate provides that serialization: an
//! `O_EXCL`-created lock file next to the locked path, backed by an
//! `fd_lock::RwLock` for the lifetime of the guard, with stale-lock detection
//! so a crashed process never wedges the index forever.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use camino::Utf8PathBuf;
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};

/// Age, in seconds, after which an unreleased lock is considered stale.
const DEFAULT_STALE_THRESHOLD_SECS: u64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("concurrent execution detected for '{resource}' (pid {pid}, created {created_ago})")]
    ConcurrentExecution {
        resource: String,
        pid: u32,
        created_ago: String,
    },

    #[error("stale lock detected for '{resource}' (pid {pid}, age {age_secs}s)")]
    StaleLock {
        resource: String,
        pid: u32,
        age_secs: u64,
    },

    #[error("lock file for '{resource}' is corrupted: {reason}")]
    Corrupted { resource: String, reason: String },

    #[error("failed to acquire lock for '{resource}': {reason}")]
    AcquisitionFailed { resource: String, reason: String },

    #[error("io error during lock operation: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockInfo {
    pid: u32,
    created_at: u64,
    resource: String,
}

/// A held exclusive lock. Releasing it (drop, or explicit [`release`](Self::release))
/// removes the lock file.
pub struct PathLock {
    lock_path: PathBuf,
    _fd_lock: Option<Box<RwLock<fs::File>>>,
}

impl PathLock {
    /// Acquire an exclusive lock for `resource_path` (e.g. `<root>/index.toml`).
    /// The lock file lives alongside it as `<resource_path>.lock`.
    ///
    /// `force` overrides a lock that is merely stale (older than `ttl_seconds`,
    /// default one hour) but never one that is actively held.
    pub fn acquire(
        resource_path: &Path,
        force: bool,
        ttl_seconds: Option<u64>,
    ) -> Result<Self, LockError> {
        let resource = resource_path.to_string_lossy().into_owned();
        let lock_path = Self::lock_path_for(resource_path);
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let ttl = ttl_seconds.unwrap_or(DEFAULT_STALE_THRESHOLD_SECS);
        Self::acquire_with_retry(&resource, &lock_path, force, ttl, 3)
    }

    fn lock_path_for(resource_path: &Path) -> PathBuf {
        let mut p = resource_path.as_os_str().to_owned();
        p.push(".lock");
        PathBuf::from(p)
    }

    fn acquire_with_retry(
        resource: &str,
        lock_path: &Path,
        force: bool,
        ttl_seconds: u64,
        max_retries: u32,
    ) -> Result<Self, LockError> {
        for attempt in 0..max_retries {
            match fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(lock_path)
            {
                Ok(lock_file) => return Self::finalize(lock_path.to_path_buf(), lock_file, resource),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    Self::check_existing(lock_path, resource, force, ttl_seconds)?;
                    Self::remove_stale(lock_path)?;
                    match fs::OpenOptions::new()
                        .create_new(true)
                        .write(true)
                        .open(lock_path)
                    {
                        Ok(lock_file) => {
                            return Self::finalize(lock_path.to_path_buf(), lock_file, resource)
                        }
                        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                            if attempt + 1 < max_retries {
                                let delay_ms = 10u64.saturating_mul(2u64.saturating_pow(attempt));
                                std::thread::sleep(std::time::Duration::from_millis(
                                    delay_ms.min(100),
                                ));
                                continue;
                            }
                            return Err(LockError::AcquisitionFailed {
                                resource: resource.to_string(),
                                reason: "another process won the race after stale removal"
                                    .to_string(),
                            });
                        }
                        Err(e) => {
                            return Err(LockError::AcquisitionFailed {
                                resource: resource.to_string(),
                                reason: e.to_string(),
                            })
                        }
                    }
                }
                Err(e) => {
                    return Err(LockError::AcquisitionFailed {
                        resource: resource.to_string(),
                        reason: e.to_string(),
                    })
                }
            }
        }
        Err(LockError::AcquisitionFailed {
            resource: resource.to_string(),
            reason: "max retries exceeded".to_string(),
        })
    }

    fn check_existing(
        lock_path: &Path,
        resource: &str,
        force: bool,
        ttl_seconds: u64,
    ) -> Result<(), LockError> {
        let content = match fs::read_to_string(lock_path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let info: LockInfo = serde_json::from_str(&content).map_err(|e| LockError::Corrupted {
            resource: resource.to_string(),
            reason: e.to_string(),
        })?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let age_secs = now.saturating_sub(info.created_at);

        if force || age_secs >= ttl_seconds {
            if !force {
                return Err(LockError::StaleLock {
                    resource: resource.to_string(),
                    pid: info.pid,
                    age_secs,
                });
            }
            Ok(())
        } else {
            Err(LockError::ConcurrentExecution {
                resource: resource.to_string(),
                pid: info.pid,
                created_ago: format!("{age_secs}s ago"),
            })
        }
    }

    fn remove_stale(lock_path: &Path) -> Result<(), LockError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let stale_path = lock_path.with_extension(format!("stale.{timestamp}.{}", process::id()));
        match fs::rename(lock_path, &stale_path) {
            Ok(()) => {
                let _ = fs::remove_file(&stale_path);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn finalize(lock_path: PathBuf, lock_file: fs::File, resource: &str) -> Result<Self, LockError> {
        let info = LockInfo {
            pid: process::id(),
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            resource: resource.to_string(),
        };
        let json = serde_json::to_string(&info).map_err(|e| LockError::AcquisitionFailed {
            resource: resource.to_string(),
            reason: e.to_string(),
        })?;

        let mut rw_lock = Box::new(RwLock::new(lock_file));
        {
            let mut guard = rw_lock
                .try_write()
                .map_err(|_| LockError::ConcurrentExecution {
                    resource: resource.to_string(),
                    pid: 0,
                    created_ago: "unknown".to_string(),
                })?;
            guard.write_all(json.as_bytes())?;
            guard.flush()?;
            guard.sync_all()?;
        }

        Ok(Self {
            lock_path,
            _fd_lock: Some(rw_lock),
        })
    }

    /// Release the lock explicitly, removing the lock file.
    pub fn release(mut self) {
        self._fd_lock.take();
        let _ = fs::remove_file(&self.lock_path);
    }
}

impl Drop for PathLock {
    fn drop(&mut self) {
        self._fd_lock.take();
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// Convenience wrapper taking a `camino::Utf8Path`-flavored resource path.
pub fn acquire_for_index(root: &Utf8PathBuf) -> Result<PathLock, LockError> {
    PathLock::acquire(root.join("index.toml").as_std_path(), false, None)
}
