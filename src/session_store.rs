//! Per-session records under `<data_dir>/sessions/`.
//!
//! Records are owned by other tools; this module only merges single keys
//! into their `extras` object and leaves every other key untouched.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::SessionError;

#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

/// Outcome of one `extras` update.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraUpdate {
    pub session_id: String,
    pub key: String,
    pub previous: Option<Value>,
    pub value: String,
    pub path: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }

    /// Set `extras[key] = value` in an existing session record.
    ///
    /// The record must already exist. A missing or non-object `extras` is
    /// replaced by a fresh object.
    pub fn set_extra(
        &self,
        session_id: &str,
        key: &str,
        value: &str,
    ) -> Result<ExtraUpdate, SessionError> {
        let path = self.path_for(session_id);
        let mut record = read_record(&path)?;
        let Value::Object(fields) = &mut record else {
            return Err(SessionError::NotAnObject { path });
        };

        let extras = fields
            .entry("extras")
            .or_insert_with(|| Value::Object(Map::new()));
        if !extras.is_object() {
            tracing::warn!(path = %path.display(), "Replacing non-object extras");
            *extras = Value::Object(Map::new());
        }
        let previous = extras
            .as_object_mut()
            .and_then(|map| map.insert(key.to_string(), Value::from(value)));

        let body = serde_json::to_string_pretty(&record).map_err(|e| SessionError::InvalidJson {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&path, body).map_err(|source| SessionError::WriteFailed {
            path: path.clone(),
            source,
        })?;

        Ok(ExtraUpdate {
            session_id: session_id.to_string(),
            key: key.to_string(),
            previous,
            value: value.to_string(),
            path,
        })
    }
}

fn read_record(path: &Path) -> Result<Value, SessionError> {
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SessionError::NotFound {
            path: path.to_path_buf(),
        },
        _ => SessionError::InvalidJson {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
    })?;
    serde_json::from_str(&contents).map_err(|e| SessionError::InvalidJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

impl fmt::Display for ExtraUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\u{2713} Session Updated Successfully")?;
        writeln!(f, "  Session ID: {}", self.session_id)?;
        writeln!(f, "  Key Modified: {}", self.key)?;
        match &self.previous {
            Some(Value::String(previous)) => writeln!(f, "  Previous Value: {previous}")?,
            Some(previous) => writeln!(f, "  Previous Value: {previous}")?,
            None => writeln!(f, "  Previous Value: (new key)")?,
        }
        writeln!(f, "  New Value: {}", self.value)?;
        let shown = std::path::absolute(&self.path).unwrap_or_else(|_| self.path.clone());
        write!(f, "  File Path: {}", shown.display())
    }
}
