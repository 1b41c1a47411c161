//! Per-event-type JSON array logs.
//!
//! Each event type owns one file `<logs_dir>/<name>.json` holding a
//! pretty-printed JSON array. Appending is read-modify-write with no
//! locking; concurrent hooks may lose an entry, which is acceptable for
//! audit logs. A corrupt or non-array file is replaced by a fresh array.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::Value;

/// Local time as a naive ISO 8601 string with microseconds.
pub fn now_iso() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Handle on the logs directory.
#[derive(Debug, Clone)]
pub struct EventLog {
    dir: PathBuf,
}

impl EventLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the array file for an event name.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Append an entry, logging and swallowing any filesystem error.
    pub fn append(&self, name: &str, entry: Value) {
        if let Err(e) = self.try_append(name, entry) {
            tracing::warn!(log = name, "Failed to append event log entry: {e}");
        }
    }

    /// Append an entry to `<name>.json`, creating the directory and file as needed.
    pub fn try_append(&self, name: &str, entry: Value) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(name);

        let mut entries = read_array(&path);
        entries.push(entry);

        let body = serde_json::to_string_pretty(&Value::Array(entries))?;
        fs::write(&path, body)
    }

    /// Append one compact JSON line to `<file_name>` (no `.json` suffix added).
    pub fn append_line(&self, file_name: &str, entry: &Value) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(file_name))?;
        writeln!(file, "{}", serde_json::to_string(entry)?)
    }
}

/// Existing entries, or an empty list when the file is missing or corrupt.
fn read_array(path: &Path) -> Vec<Value> {
    let Ok(contents) = fs::read_to_string(path) else {
        return Vec::new();
    };
    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) | Err(_) => {
            tracing::debug!(path = %path.display(), "Event log unreadable, starting fresh");
            Vec::new()
        }
    }
}

/// Merge `extra` fields over a copy of `base` when base is an object.
pub fn with_fields(base: &Value, extra: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
    let mut merged = base.clone();
    if let Value::Object(map) = &mut merged {
        for (key, value) in extra {
            map.insert(key.to_string(), value);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn appends_in_order_with_two_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path().join("logs"));

        log.try_append("post_tool_use", json!({"n": 1})).unwrap();
        log.try_append("post_tool_use", json!({"n": 2})).unwrap();

        let raw = fs::read_to_string(log.path_for("post_tool_use")).unwrap();
        assert!(raw.starts_with("[\n  {"));
        let parsed: Vec<Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, vec![json!({"n": 1}), json!({"n": 2})]);
    }

    #[test]
    fn corrupt_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path());
        fs::write(log.path_for("setup"), "{not json").unwrap();

        log.try_append("setup", json!({"ok": true})).unwrap();

        let parsed: Value =
            serde_json::from_str(&fs::read_to_string(log.path_for("setup")).unwrap()).unwrap();
        assert_eq!(parsed, json!([{"ok": true}]));
    }

    #[test]
    fn non_array_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path());
        fs::write(log.path_for("setup"), r#"{"a": 1}"#).unwrap();

        log.try_append("setup", json!(2)).unwrap();

        let parsed: Value =
            serde_json::from_str(&fs::read_to_string(log.path_for("setup")).unwrap()).unwrap();
        assert_eq!(parsed, json!([2]));
    }

    #[test]
    fn with_fields_overrides_and_extends() {
        let merged = with_fields(&json!({"a": 1, "b": 2}), [("b", json!(3)), ("c", json!(4))]);
        assert_eq!(merged, json!({"a": 1, "b": 3, "c": 4}));
    }
}
