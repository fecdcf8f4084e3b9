//! Exclusive lock file guarding index builds.
//!
//! The lock is a file created with create-new semantics next to the index
//! directory and holding an owner token. A lock left behind by a crashed
//! process is taken over once it is older than [`STALE_AFTER`]: it is first
//! renamed aside, so only one contender can claim it, and a lock that turns
//! out to be fresh is put back. The guard only removes the file while it still
//! holds its own token.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::rag::core::errors::{RagError, RagResult};

/// Age after which an abandoned lock is ignored.
pub const STALE_AFTER: Duration = Duration::from_secs(10 * 60);

/// Guard for an acquired build lock.
#[derive(Debug)]
pub struct BuildLock {
    path: PathBuf,
    token: String,
}

impl BuildLock {
    /// Try to take the lock at `path`.
    ///
    /// # Errors
    /// Returns [`RagError::BuildInProgress`] if a live lock exists, or an I/O error.
    pub fn acquire(path: &Path) -> RagResult<Self> {
        let token = owner_token();
        match Self::create(path, &token) {
            Ok(lock) => Ok(lock),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if !is_stale(path) {
                    return Err(RagError::BuildInProgress(path.to_path_buf()));
                }
                take_over(path, &token)?;
                Self::create(path, &token).map_err(|e| match e.kind() {
                    ErrorKind::AlreadyExists => RagError::BuildInProgress(path.to_path_buf()),
                    _ => RagError::Io(e),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Location of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create(path: &Path, token: &str) -> std::io::Result<Self> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        writeln!(file, "{token}")?;
        Ok(Self {
            path: path.to_path_buf(),
            token: token.to_string(),
        })
    }

    fn is_owned(&self) -> bool {
        fs::read_to_string(&self.path).is_ok_and(|content| content.trim() == self.token)
    }
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        if !self.is_owned() {
            tracing::warn!(
                "Build lock {} was taken over, leaving it in place",
                self.path.display()
            );
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to release build lock {}: {e}", self.path.display());
        }
    }
}

/// `pid:nanos`, unique per acquisition attempt.
fn owner_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}:{nanos}", std::process::id())
}

/// Move a stale lock out of the way. Only one contender's rename can succeed.
fn take_over(path: &Path, token: &str) -> RagResult<()> {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".stale-{}", token.replace(':', "-")));
    let aside = path.with_file_name(name);

    match fs::rename(path, &aside) {
        Ok(()) => {}
        // Someone else already moved it.
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    }

    if is_stale(&aside) {
        tracing::warn!("Removed stale build lock {}", path.display());
        fs::remove_file(&aside)?;
        return Ok(());
    }

    // Another contender replaced the stale lock first; give its lock back.
    if let Err(e) = fs::hard_link(&aside, path) {
        tracing::warn!("Could not restore build lock {}: {e}", path.display());
    }
    fs::remove_file(&aside)?;
    Err(RagError::BuildInProgress(path.to_path_buf()))
}

fn is_stale(path: &Path) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > STALE_AFTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_lock(path: &Path, content: &str, age: Duration) {
        fs::write(path, content).unwrap();
        let file = OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_second_acquire_fails_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trend_index.lock");

        let first = BuildLock::acquire(&path).unwrap();
        assert!(path.exists());
        assert!(matches!(
            BuildLock::acquire(&path),
            Err(RagError::BuildInProgress(_))
        ));

        drop(first);
        assert!(!path.exists());
        let again = BuildLock::acquire(&path).unwrap();
        assert_eq!(again.path(), path.as_path());
    }

    #[test]
    fn test_stale_lock_is_taken_over() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trend_index.lock");
        write_lock(&path, "4242:0\n", STALE_AFTER + Duration::from_secs(60));

        let lock = BuildLock::acquire(&path).unwrap();

        assert!(lock.is_owned());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn test_recent_foreign_lock_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trend_index.lock");
        write_lock(&path, "4242:0\n", Duration::from_secs(30));

        assert!(matches!(
            BuildLock::acquire(&path),
            Err(RagError::BuildInProgress(_))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "4242:0\n");
    }

    #[test]
    fn test_fresh_lock_found_during_takeover_is_restored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trend_index.lock");
        write_lock(&path, "4242:0\n", Duration::ZERO);

        assert!(matches!(
            take_over(&path, "7:1"),
            Err(RagError::BuildInProgress(_))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "4242:0\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_drop_leaves_lock_it_no_longer_owns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trend_index.lock");

        let lock = BuildLock::acquire(&path).unwrap();
        fs::write(&path, "4242:0\n").unwrap();
        drop(lock);

        assert_eq!(fs::read_to_string(&path).unwrap(), "4242:0\n");
    }
}
