//! JSONL dispatch log.
//!
//! Every [`DispatchEvent`] becomes one JSON line carrying its `type`, an
//! RFC 3339 `timestamp` and the event payload. The file is opened in append
//! mode so successive runs accumulate into one log.

use dispatch_application::ports::dispatch_logger::{DispatchEvent, DispatchLogger};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Append-only JSONL logger.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every record and
/// on `Drop`.
pub struct JsonlDispatchLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlDispatchLogger {
    /// Open (or create) the log at `path`, creating parent directories.
    ///
    /// Returns `None` when the file cannot be opened; dispatch then runs
    /// without a structured log.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create dispatch log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open dispatch log {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(event: DispatchEvent) -> Value {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        match event.payload {
            Value::Object(mut map) => {
                map.insert("type".to_string(), Value::String(event.event_type.to_string()));
                map.insert("timestamp".to_string(), Value::String(timestamp));
                Value::Object(map)
            }
            other => serde_json::json!({
                "type": event.event_type,
                "timestamp": timestamp,
                "data": other,
            }),
        }
    }
}

impl DispatchLogger for JsonlDispatchLogger {
    fn log(&self, event: DispatchEvent) {
        let Ok(line) = serde_json::to_string(&Self::record(event)) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlDispatchLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_record_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("dispatch.jsonl");
        let logger = JsonlDispatchLogger::open(&path).unwrap();

        logger.log(DispatchEvent::new(
            "tool_call",
            serde_json::json!({"tool": "calculator", "arguments": {"expression": "1+1"}}),
        ));
        logger.log(DispatchEvent::new(
            "tool_result",
            serde_json::json!({"tool": "calculator", "success": true}),
        ));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["type"], "tool_call");
        assert_eq!(records[0]["arguments"]["expression"], "1+1");
        assert_eq!(records[1]["success"], true);
        let timestamp = records[0]["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[test]
    fn test_non_object_payload_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dispatch.jsonl");
        let logger = JsonlDispatchLogger::open(&path).unwrap();
        logger.log(DispatchEvent::new("note", serde_json::json!("plain")));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records[0]["type"], "note");
        assert_eq!(records[0]["data"], "plain");
    }

    #[test]
    fn test_appends_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dispatch.jsonl");
        for _ in 0..2 {
            let logger = JsonlDispatchLogger::open(&path).unwrap();
            logger.log(DispatchEvent::new("tool_call", serde_json::json!({})));
        }
        assert_eq!(read_lines(&path).len(), 2);
    }
}
