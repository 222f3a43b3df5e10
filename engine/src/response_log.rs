//! Response Logger
//!
//! Appends one JSON line per completed turn: when it happened, which session,
//! the prompt, and the model, usage and text of the completion. Logging is
//! best-effort: a failure is reported through `tracing` and never reaches the
//! caller.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::llm::{Completion, Usage};

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    ts: String,
    session_id: Option<&'a str>,
    prompt: &'a str,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<Usage>,
    content: Option<&'a str>,
}

/// Append-only JSONL writer
#[derive(Debug)]
pub struct ResponseLogger {
    path: Option<PathBuf>,
    // Serializes appends from concurrent sessions
    lock: Mutex<()>,
}

impl ResponseLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            lock: Mutex::new(()),
        }
    }

    /// A logger that records nothing
    pub fn disabled() -> Self {
        Self {
            path: None,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append an entry for `completion`. Never fails.
    pub fn record(&self, session_id: Option<&str>, prompt: &str, completion: &Completion) {
        let Some(path) = &self.path else {
            return;
        };

        let entry = LogEntry {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            session_id,
            prompt,
            model: &completion.model,
            usage: completion.usage,
            content: completion.content.as_deref(),
        };

        if let Err(e) = self.append(path, &entry) {
            tracing::warn!("Failed to write response log {:?}: {}", path, e);
        }
    }

    fn append(&self, path: &Path, entry: &LogEntry<'_>) -> std::io::Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(line.as_bytes())
    }
}
