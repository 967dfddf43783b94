//! Advisory run lock: one active run per stage output file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};

use longwrite_utils::error::StoreError;

/// Written into the lock file for whoever finds it held
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    pub output: PathBuf,
}

/// Exclusive lock on `<output>.lock`, held until dropped.
///
/// The OS releases the lock when the file handle closes, so a crashed run
/// never leaves a stale lock behind.
pub struct RunLock {
    lock_path: PathBuf,
    _file: RwLock<File>,
    info: LockInfo,
}

impl std::fmt::Debug for RunLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLock")
            .field("lock_path", &self.lock_path)
            .field("info", &self.info)
            .finish()
    }
}

impl RunLock {
    /// Lock file path for a stage output
    #[must_use]
    pub fn lock_path_for(output: &Path) -> PathBuf {
        let mut name = output
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        output.with_file_name(name)
    }

    /// Try to take the lock for `output` without waiting.
    ///
    /// # Errors
    ///
    /// `StoreError::LockHeld` if another run holds it.
    pub fn acquire(output: &Path) -> Result<Self, StoreError> {
        let lock_path = Self::lock_path_for(output);
        let io_err = |source: std::io::Error| StoreError::Io {
            path: lock_path.clone(),
            source,
        };

        // No truncate: the current holder's info must survive a failed attempt.
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(io_err)?;

        let info = LockInfo {
            pid: std::process::id(),
            started_at: Utc::now(),
            output: output.to_path_buf(),
        };
        let info_json = serde_json::to_string(&info).map_err(|source| StoreError::Serialize {
            path: lock_path.clone(),
            source,
        })?;

        let mut rw_lock = RwLock::new(file);
        {
            let guard = rw_lock.try_write().map_err(|_| StoreError::LockHeld {
                path: lock_path.clone(),
            })?;

            let mut file_ref = &*guard;
            file_ref.set_len(0).map_err(io_err)?;
            file_ref.write_all(info_json.as_bytes()).map_err(io_err)?;
            file_ref.flush().map_err(io_err)?;

            // Keep the lock for the lifetime of the file handle.
            std::mem::forget(guard);
        }

        Ok(Self {
            lock_path,
            _file: rw_lock,
            info,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    #[must_use]
    pub fn info(&self) -> &LockInfo {
        &self.info
    }

    /// Read the holder info left in a lock file, if any
    #[must_use]
    pub fn read_info(lock_path: &Path) -> Option<LockInfo> {
        let content = fs::read_to_string(lock_path).ok()?;
        serde_json::from_str(&content).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_path_for() {
        assert_eq!(
            RunLock::lock_path_for(Path::new("/tmp/x/write.jsonl")),
            PathBuf::from("/tmp/x/write.jsonl.lock")
        );
    }

    #[test]
    fn test_second_acquire_is_rejected_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("plan.jsonl");

        let first = RunLock::acquire(&output).unwrap();
        assert_eq!(first.info().pid, std::process::id());

        let second = RunLock::acquire(&output);
        assert!(matches!(second, Err(StoreError::LockHeld { .. })));

        let info = RunLock::read_info(first.path()).unwrap();
        assert_eq!(info.output, output);

        drop(first);
        assert!(RunLock::acquire(&output).is_ok());
    }

    #[test]
    fn test_different_outputs_do_not_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let _a = RunLock::acquire(&dir.path().join("plan.jsonl")).unwrap();
        let _b = RunLock::acquire(&dir.path().join("write.jsonl")).unwrap();
    }
}
