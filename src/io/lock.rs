//! Lock file for single-instance enforcement.
//!
//! The lock lives in `$XDG_RUNTIME_DIR` (or `/tmp`) and holds the owning
//! PID. It is released and removed when the [`LockFile`] is dropped.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const LOCK_FILE_NAME: &str = "plugtimer.lock";

/// Held exclusive lock.
#[derive(Debug)]
pub struct LockFile {
    file: File,
    path: PathBuf,
}

impl LockFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Default lock location.
pub fn default_lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join(LOCK_FILE_NAME)
}

/// PID recorded in a lock file, if readable.
pub fn read_lock_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| content.lines().next()?.trim().parse().ok())
}

/// Try to take the lock at `path` without blocking.
///
/// Returns `Ok(None)` when another process holds it.
pub fn acquire_lock_at(path: &Path) -> Result<Option<LockFile>> {
    // Opened without truncation so a held lock keeps its PID
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to open lock file {}", path.display()))?;

    if file.try_lock_exclusive().is_err() {
        return Ok(None);
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(&file, "{}", std::process::id())?;
    file.flush()?;

    Ok(Some(LockFile {
        file,
        path: path.to_path_buf(),
    }))
}

/// Take the default lock, logging the holder when it is busy.
pub fn acquire_lock() -> Result<Option<LockFile>> {
    let path = default_lock_path();
    let lock = acquire_lock_at(&path)?;
    if lock.is_none() {
        log_pipe!();
        match read_lock_pid(&path) {
            Some(pid) => log_error!("plugtimer is already running (PID: {pid})"),
            None => log_error!("plugtimer is already running"),
        }
        log_block_start!("Did you mean to:");
        log_indented!("• Preview the schedule: plugtimer schedule");
        log_indented!("• Change a setting: plugtimer set <field>=<value>");
    }
    Ok(lock)
}
