use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use cc_hooks::tts::{LockRecord, TtsQueueLock};
use chrono::Local;
use tempfile::TempDir;

// ─── Helpers ──────────────────────────────────────────────────────────

fn lock_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("tts_queue").join("tts.lock");
    (dir, path)
}

fn write_record(path: &Path, agent_id: &str, age: chrono::Duration, pid: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let record = LockRecord {
        agent_id: agent_id.to_string(),
        timestamp: (Local::now() - age).to_rfc3339(),
        pid,
    };
    fs::write(path, serde_json::to_string(&record).unwrap()).unwrap();
}

/// Pid of a child that has already exited and been reaped.
fn dead_pid() -> u32 {
    let mut child = std::process::Command::new("true")
        .spawn()
        .expect("spawn true");
    let pid = child.id();
    child.wait().unwrap();
    pid
}

// ============================================================
// Acquire and release
// ============================================================

#[test]
fn test_acquire_writes_record_and_release_clears_it() {
    let (_dir, path) = lock_path();
    let mut lock = TtsQueueLock::new(&path);

    assert!(lock.acquire("agent-1", Duration::from_secs(1)));
    assert!(lock.is_held());
    assert!(lock.is_locked());

    let record = lock.read_record().expect("record written");
    assert_eq!(record.agent_id, "agent-1");
    assert_eq!(record.pid, std::process::id());
    assert!(record.acquired_at().is_some());

    lock.release("agent-1");
    assert!(!lock.is_held());
    assert!(!lock.is_locked());
    assert_eq!(fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn test_release_without_holding_is_a_no_op() {
    let (_dir, path) = lock_path();
    let mut holder = TtsQueueLock::new(&path);
    assert!(holder.acquire("agent-1", Duration::from_secs(1)));

    let mut stranger = TtsQueueLock::new(&path);
    stranger.release("agent-1");

    assert!(holder.is_locked());
    assert_eq!(holder.read_record().unwrap().agent_id, "agent-1");
    holder.release("agent-1");
}

#[test]
fn test_status_probe_of_missing_file() {
    let (_dir, path) = lock_path();
    let lock = TtsQueueLock::new(&path);
    assert!(!lock.is_locked());
    assert!(lock.read_record().is_none());
    assert!(!path.exists());
}

// ============================================================
// Contention
// ============================================================

#[test]
fn test_second_holder_times_out_while_lock_is_held() {
    let (_dir, path) = lock_path();
    let mut first = TtsQueueLock::new(&path);
    assert!(first.acquire("first", Duration::from_secs(1)));

    let mut second = TtsQueueLock::new(&path);
    let started = Instant::now();
    assert!(!second.acquire("second", Duration::from_millis(300)));
    let waited = started.elapsed();

    assert!(waited >= Duration::from_millis(300), "gave up after {waited:?}");
    assert!(waited < Duration::from_secs(2), "overslept: {waited:?}");
    assert_eq!(first.read_record().unwrap().agent_id, "first");
    first.release("first");
}

#[test]
fn test_zero_timeout_still_tries_once() {
    let (_dir, path) = lock_path();
    let mut lock = TtsQueueLock::new(&path);
    assert!(lock.acquire("eager", Duration::ZERO));
    lock.release("eager");
}

#[test]
fn test_waiter_acquires_after_release() {
    let (_dir, path) = lock_path();
    let mut first = TtsQueueLock::new(&path);
    assert!(first.acquire("first", Duration::from_secs(1)));

    let waiter_path = path.clone();
    let waiter = std::thread::spawn(move || {
        let mut second = TtsQueueLock::new(waiter_path);
        let acquired = second.acquire("second", Duration::from_secs(5));
        let holder = second.read_record().map(|r| r.agent_id);
        second.release("second");
        (acquired, holder)
    });

    std::thread::sleep(Duration::from_millis(250));
    first.release("first");

    let (acquired, holder) = waiter.join().unwrap();
    assert!(acquired);
    assert_eq!(holder.as_deref(), Some("second"));
}

// ============================================================
// Stale lock cleanup
// ============================================================

#[test]
fn test_old_lock_of_dead_process_is_removed() {
    let (_dir, path) = lock_path();
    write_record(&path, "ghost", chrono::Duration::hours(2), dead_pid());

    let lock = TtsQueueLock::new(&path);
    assert!(lock.cleanup_stale(Duration::from_secs(60)));
    assert!(!path.exists());
}

#[test]
fn test_new_holder_acquires_immediately_after_stale_cleanup() {
    let (_dir, path) = lock_path();
    write_record(&path, "ghost", chrono::Duration::hours(2), dead_pid());

    let mut lock = TtsQueueLock::new(&path);
    assert!(lock.cleanup_stale(Duration::from_secs(60)));

    let start = Instant::now();
    assert!(lock.acquire("fresh", Duration::from_secs(5)));
    assert!(
        start.elapsed() < Duration::from_millis(500),
        "acquire waited {:?}",
        start.elapsed()
    );
    assert_eq!(lock.read_record().unwrap().agent_id, "fresh");
    lock.release("fresh");
}

#[test]
fn test_old_lock_of_live_process_is_kept() {
    let (_dir, path) = lock_path();
    write_record(&path, "slow", chrono::Duration::hours(2), std::process::id());

    let lock = TtsQueueLock::new(&path);
    assert!(!lock.cleanup_stale(Duration::from_secs(60)));
    assert!(path.exists());
}

#[test]
fn test_recent_lock_is_kept_even_if_holder_died() {
    let (_dir, path) = lock_path();
    write_record(&path, "recent", chrono::Duration::seconds(5), dead_pid());

    let lock = TtsQueueLock::new(&path);
    assert!(!lock.cleanup_stale(Duration::from_secs(60)));
    assert!(path.exists());
}

#[test]
fn test_corrupt_record_falls_back_to_file_age() {
    let (_dir, path) = lock_path();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "{not a record").unwrap();

    let lock = TtsQueueLock::new(&path);
    assert!(!lock.cleanup_stale(Duration::from_secs(60)));

    let file = File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(600))
        .unwrap();
    drop(file);

    assert!(lock.cleanup_stale(Duration::from_secs(60)));
    assert!(!path.exists());
}

#[test]
fn test_cleanup_without_lock_file() {
    let (_dir, path) = lock_path();
    assert!(!TtsQueueLock::new(&path).cleanup_stale(Duration::ZERO));
}

#[test]
fn test_naive_timestamps_are_accepted() {
    let record = LockRecord {
        agent_id: "legacy".to_string(),
        timestamp: "2025-08-19T09:50:00.123456".to_string(),
        pid: 1,
    };
    assert!(record.acquired_at().is_some());
}
