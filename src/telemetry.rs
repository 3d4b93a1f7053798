//! Structured event logging
//!
//! Append-only line-delimited JSON records for query, response, tool-call,
//! error, and memory events, kept separate from the human-readable tracing
//! stream. Telemetry must never break the agent loop: write failures are
//! logged and swallowed.

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::types::ToolOutcome;

/// JSONL event sink
pub struct EventLog {
    file: Option<Mutex<File>>,
}

impl EventLog {
    /// Open (creating if needed) the event log at `path`
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Some(Mutex::new(file)),
        })
    }

    /// A sink that drops every event. Used in tests and when no log path is
    /// configured.
    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn user_query(&self, user_id: i64, query: &str) {
        self.write(json!({
            "event": "user_query",
            "user_id": user_id,
            "query": query,
        }));
    }

    pub fn agent_response(&self, user_id: i64, response: &str) {
        self.write(json!({
            "event": "agent_response",
            "user_id": user_id,
            "response_preview": preview(response, 200),
        }));
    }

    pub fn tool_call(&self, name: &str, args: &Map<String, Value>, outcome: &ToolOutcome) {
        let (success, count) = match outcome {
            ToolOutcome::Success { payload } => (true, payload.get("count").cloned()),
            ToolOutcome::Failure { .. } => (false, None),
        };
        self.write(json!({
            "event": "tool_call",
            "tool_name": name,
            "parameters": args,
            "result_summary": {
                "success": success,
                "count": count.unwrap_or(Value::Null),
            },
        }));
    }

    pub fn error(&self, kind: &str, message: &str, context: Option<&str>) {
        self.write(json!({
            "event": "error",
            "error_type": kind,
            "error_message": message,
            "context": context,
        }));
    }

    pub fn memory_op(&self, operation: &str, details: Value) {
        self.write(json!({
            "event": "memory_op",
            "operation": operation,
            "details": details,
        }));
    }

    fn write(&self, mut record: Value) {
        let Some(file) = &self.file else {
            return;
        };
        if let Value::Object(obj) = &mut record {
            obj.insert("timestamp".into(), json!(Utc::now().to_rfc3339()));
        }
        let mut guard = file.lock();
        if let Err(e) = writeln!(guard, "{record}") {
            warn!(error = %e, "failed to append event log record");
        }
    }
}

fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Initialize the human-readable tracing stream. Called once by the binary.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn events_are_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let log = EventLog::open(&path).unwrap();

        log.user_query(1, "show me thrillers");
        log.error("backend_error", "connection refused", Some("gemini"));
        log.memory_op("session_start", json!({"user_id": 1}));

        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let record: Value = serde_json::from_str(line).unwrap();
            assert!(record["event"].is_string());
            assert!(record["timestamp"].is_string());
        }
    }

    #[test]
    fn disabled_sink_drops_everything() {
        let log = EventLog::disabled();
        log.user_query(1, "anything");
        log.agent_response(1, "anything");
    }

    #[test]
    fn response_preview_is_truncated() {
        let text = "x".repeat(500);
        assert_eq!(preview(&text, 200).len(), 200);
        assert_eq!(preview("short", 200), "short");
    }
}
