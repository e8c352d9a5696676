use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use fs2::FileExt;
use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use tracing::warn;

/// Event log filename under the base data directory.
pub const EVENT_LOG_FILE: &str = "events.jsonl";

/// Structured dispatch outcomes, one JSON line per record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    /// Handler was declared for this event but disabled.
    HandlerSkipped { handler: String },
    /// Handler resolution failed; the handler stays unavailable for the
    /// rest of the process.
    ImportError { handler: String, error: String },
    /// Handler exceeded its deadline and was disregarded.
    HandlerTimeout { handler: String, timeout_s: f64 },
    /// Handler returned an error; treated as no result.
    HandlerError { handler: String, error: String },
    /// Per-invocation timing, emitted regardless of outcome.
    HandlerTiming {
        handler: String,
        elapsed_s: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool: Option<String>,
        success: bool,
    },
}

/// One appended line: a timestamped [`LogEvent`] plus the dispatched kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub hook_event: String,
    #[serde(flatten)]
    pub event: LogEvent,
}

impl LogRecord {
    pub fn new(hook_event: impl Into<String>, event: LogEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            hook_event: hook_event.into(),
            event,
        }
    }
}

fn serialize_timestamp<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Append-only structured event log.
///
/// Appends hold an exclusive advisory lock for the duration of the write so
/// overlapping dispatch processes never interleave partial lines. Failures
/// are logged and swallowed; the log is diagnostics, not control flow.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            path: base.as_ref().join(EVENT_LOG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Returns whether the append landed.
    pub fn append(&self, record: &LogRecord) -> bool {
        match self.try_append(record) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "event log append dropped");
                false
            }
        }
    }

    fn try_append(&self, record: &LogRecord) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let line = serde_json::to_string(record)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;
        let result = writeln!(file, "{line}");
        let _ = FileExt::unlock(&file);
        result
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use tempfile::TempDir;

    use super::*;

    fn read_lines(log: &EventLog) -> Vec<Value> {
        std::fs::read_to_string(log.path())
            .expect("log exists")
            .lines()
            .map(|line| serde_json::from_str(line).expect("valid json line"))
            .collect()
    }

    #[test]
    fn appends_one_parseable_line_per_record() {
        let dir = TempDir::new().expect("tempdir");
        let log = EventLog::new(dir.path());

        assert!(log.append(&LogRecord::new(
            "PreToolUse",
            LogEvent::HandlerTimeout {
                handler: "credential_guard".to_string(),
                timeout_s: 1.0,
            },
        )));
        assert!(log.append(&LogRecord::new(
            "PreToolUse",
            LogEvent::HandlerTiming {
                handler: "credential_guard".to_string(),
                elapsed_s: 1.002,
                tool: Some("Bash".to_string()),
                success: false,
            },
        )));

        let lines = read_lines(&log);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "handler_timeout");
        assert_eq!(lines[0]["timeout_s"], 1.0);
        assert_eq!(lines[0]["hook_event"], "PreToolUse");
        assert_eq!(lines[1]["event"], "handler_timing");
        assert_eq!(lines[1]["tool"], "Bash");
        assert_eq!(lines[1]["success"], false);
    }

    #[test]
    fn skip_and_error_records_carry_details() {
        let dir = TempDir::new().expect("tempdir");
        let log = EventLog::new(dir.path());

        log.append(&LogRecord::new(
            "PostToolUse",
            LogEvent::HandlerSkipped {
                handler: "notifier".to_string(),
            },
        ));
        log.append(&LogRecord::new(
            "PostToolUse",
            LogEvent::HandlerError {
                handler: "notifier".to_string(),
                error: "boom".to_string(),
            },
        ));
        log.append(&LogRecord::new(
            "PostToolUse",
            LogEvent::ImportError {
                handler: "ghost".to_string(),
                error: "factory failed".to_string(),
            },
        ));

        let lines = read_lines(&log);
        assert_eq!(lines[0]["event"], "handler_skipped");
        assert_eq!(lines[1]["error"], "boom");
        assert_eq!(lines[2]["event"], "import_error");
        assert_eq!(lines[2]["handler"], "ghost");
    }
}
