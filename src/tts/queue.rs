//! Cross-process TTS queue lock.
//!
//! Serializes audio playback across independently spawned hook processes
//! with an advisory `flock` on a well-known file. While held, the file also
//! carries a [`LockRecord`] naming the holder. The record is written in place
//! through the locked handle: replacing the file by rename would move the
//! path to a new inode and silently break the lock for the next caller.
//!
//! Every operation degrades gracefully. OS errors are logged at debug level
//! and reported as "not acquired" or "not locked".

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use nix::sys::signal::kill;
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};

const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(1);
const BACKOFF_FACTOR: f64 = 1.5;

/// Holder metadata stored in the lock file while the lock is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub agent_id: String,
    pub timestamp: String,
    pub pid: u32,
}

impl LockRecord {
    fn now(agent_id: &str) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            timestamp: Local::now().to_rfc3339(),
            pid: std::process::id(),
        }
    }

    /// Parse the timestamp as RFC 3339, or as a naive ISO 8601 local time.
    pub fn acquired_at(&self) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()?
            .and_local_timezone(Local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Advisory lock serializing text-to-speech playback.
///
/// One instance per invocation. The OS lock lives as long as the held
/// handle; dropping the instance releases it without clearing the record,
/// so callers should [`release`](Self::release) explicitly.
pub struct TtsQueueLock {
    path: PathBuf,
    held: Option<Flock<File>>,
}

impl TtsQueueLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            held: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when this instance currently holds the OS lock.
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// Acquire the lock for `holder_id`, waiting at most `timeout`.
    ///
    /// Retries with exponential backoff (100 ms growing by 1.5x, capped at
    /// 1 s, never sleeping past the deadline). At least one attempt is made
    /// even with a zero timeout. Returns false once the deadline passes.
    pub fn acquire(&mut self, holder_id: &str, timeout: Duration) -> bool {
        if let Some(locked) = self.held.as_mut() {
            if let Err(e) = write_record(locked, &LockRecord::now(holder_id)) {
                tracing::debug!("Failed to refresh lock record: {e}");
            }
            return true;
        }

        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::debug!(dir = %parent.display(), "Failed to create lock dir: {e}");
            }
        }

        // A timeout too large to represent as an instant waits forever.
        let deadline = Instant::now().checked_add(timeout);
        let mut backoff = INITIAL_BACKOFF;
        loop {
            if let Some(mut locked) = self.try_lock() {
                if let Err(e) = write_record(&mut locked, &LockRecord::now(holder_id)) {
                    tracing::debug!("Failed to write lock record: {e}");
                }
                tracing::debug!(holder_id, path = %self.path.display(), "TTS lock acquired");
                self.held = Some(locked);
                return true;
            }

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        tracing::debug!(holder_id, ?timeout, "Timed out waiting for TTS lock");
                        return false;
                    }
                    backoff.min(deadline - now)
                }
                None => backoff,
            };
            std::thread::sleep(pause);
            backoff = backoff.mul_f64(BACKOFF_FACTOR).min(MAX_BACKOFF);
        }
    }

    /// Clear the record and release the OS lock. No-op when nothing is held.
    ///
    /// The holder id is not checked against the record; a mismatch is only
    /// logged.
    pub fn release(&mut self, holder_id: &str) {
        let Some(mut locked) = self.held.take() else {
            return;
        };

        if let Some(record) = read_record_from(&mut locked) {
            if record.agent_id != holder_id {
                tracing::debug!(
                    holder_id,
                    recorded = %record.agent_id,
                    "Releasing TTS lock recorded for a different holder"
                );
            }
        }

        // Truncate before unlocking so the next holder never sees our record.
        if let Err(e) = locked.set_len(0) {
            tracing::debug!("Failed to clear lock record: {e}");
        }
        if let Err((_, errno)) = locked.unlock() {
            tracing::debug!("Failed to unlock TTS lock: {errno}");
        }
        tracing::debug!(holder_id, "TTS lock released");
    }

    /// Probe whether any handle currently holds the lock. Never touches the record.
    pub fn is_locked(&self) -> bool {
        let Ok(file) = File::open(&self.path) else {
            return false;
        };
        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(_probe) => false,
            Err((_, Errno::EWOULDBLOCK)) => true,
            Err((_, errno)) => {
                tracing::debug!("Lock probe failed: {errno}");
                false
            }
        }
    }

    /// Current holder record, if the file holds a parseable one.
    pub fn read_record(&self) -> Option<LockRecord> {
        let contents = fs::read_to_string(&self.path).ok()?;
        parse_record(&contents)
    }

    /// Remove the lock file when it is older than `max_age` and its holder is
    /// gone. Age comes from the record timestamp, or the file mtime when no
    /// usable record exists. Returns true when the file was removed.
    pub fn cleanup_stale(&self, max_age: Duration) -> bool {
        let Ok(metadata) = fs::metadata(&self.path) else {
            return false;
        };
        let record = self.read_record();

        let age = record
            .as_ref()
            .and_then(LockRecord::acquired_at)
            .map(|at| (Utc::now() - at).to_std().unwrap_or(Duration::ZERO))
            .or_else(|| {
                let modified = metadata.modified().ok()?;
                Some(
                    SystemTime::now()
                        .duration_since(modified)
                        .unwrap_or(Duration::ZERO),
                )
            });

        let Some(age) = age else {
            return false;
        };
        if age <= max_age {
            return false;
        }

        if let Some(record) = &record {
            if pid_alive(record.pid) {
                tracing::debug!(pid = record.pid, ?age, "Old TTS lock holder still running");
                return false;
            }
        }

        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(?age, path = %self.path.display(), "Removed stale TTS lock");
                true
            }
            Err(e) => {
                tracing::debug!("Failed to remove stale TTS lock: {e}");
                false
            }
        }
    }

    fn try_lock(&self) -> Option<Flock<File>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .inspect_err(|e| tracing::debug!("Failed to open lock file: {e}"))
            .ok()?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(locked) => Some(locked),
            Err((_, Errno::EWOULDBLOCK)) => None,
            Err((_, errno)) => {
                tracing::debug!("flock failed: {errno}");
                None
            }
        }
    }
}

fn write_record(file: &mut File, record: &LockRecord) -> io::Result<()> {
    let json = serde_json::to_string(record)?;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(json.as_bytes())?;
    file.sync_all()
}

fn read_record_from(file: &mut File) -> Option<LockRecord> {
    let mut contents = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut contents).ok()?;
    parse_record(&contents)
}

fn parse_record(contents: &str) -> Option<LockRecord> {
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

/// `kill(pid, 0)` liveness: ESRCH means gone, EPERM means it exists.
pub fn pid_alive(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }
    match kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_in(dir: &tempfile::TempDir) -> TtsQueueLock {
        TtsQueueLock::new(dir.path().join("tts_queue").join("tts.lock"))
    }

    #[test]
    fn acquire_writes_record_and_release_clears_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut lock = lock_in(&dir);

        assert!(lock.acquire("agent-1", Duration::from_secs(1)));
        let record = lock.read_record().unwrap();
        assert_eq!(record.agent_id, "agent-1");
        assert_eq!(record.pid, std::process::id());
        assert!(record.acquired_at().is_some());

        lock.release("agent-1");
        assert!(!lock.is_held());
        assert!(lock.read_record().is_none());
        assert_eq!(fs::read_to_string(lock.path()).unwrap(), "");
    }

    #[test]
    fn reacquire_while_held_rewrites_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut lock = lock_in(&dir);

        assert!(lock.acquire("first", Duration::ZERO));
        assert!(lock.acquire("second", Duration::ZERO));
        assert_eq!(lock.read_record().unwrap().agent_id, "second");
        lock.release("second");
    }

    #[test]
    fn unbounded_timeout_acquires_free_lock() {
        let dir = tempfile::tempdir().unwrap();
        let mut lock = lock_in(&dir);

        assert!(lock.acquire("patient", Duration::MAX));
        lock.release("patient");
        assert!(lock.acquire("patient", Duration::from_secs(u64::MAX)));
        lock.release("patient");
        assert!(!lock.is_held());
    }

    #[test]
    fn release_without_holding_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut lock = lock_in(&dir);
        lock.release("nobody");
        assert!(!lock.path().exists());
    }

    #[test]
    fn is_locked_false_without_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!lock_in(&dir).is_locked());
    }

    #[test]
    fn naive_timestamps_are_accepted() {
        let record = LockRecord {
            agent_id: "a".into(),
            timestamp: "2025-01-02T03:04:05.123456".into(),
            pid: 1,
        };
        assert!(record.acquired_at().is_some());

        let bad = LockRecord {
            timestamp: "yesterday".into(),
            ..record
        };
        assert!(bad.acquired_at().is_none());
    }

    #[test]
    fn own_pid_is_alive() {
        assert!(pid_alive(std::process::id()));
        assert!(!pid_alive(0));
    }
}
