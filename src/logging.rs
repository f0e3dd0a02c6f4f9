use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Append-only JSON-lines event log. Writes are best-effort; a log that
/// cannot be opened never fails the request that produced the event.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn info(&self, event: &str, request_id: &str, message: &str) {
        self.append("info", event, request_id, message);
    }

    pub fn warn(&self, event: &str, request_id: &str, message: &str) {
        self.append("warn", event, request_id, message);
    }

    pub fn error(&self, event: &str, request_id: &str, message: &str) {
        self.append("error", event, request_id, message);
    }

    fn append(&self, level: &str, event: &str, request_id: &str, message: &str) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        let payload = serde_json::json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "level": level,
            "event": event,
            "request_id": request_id,
            "message": message,
        });
        let Ok(line) = serde_json::to_string(&payload) else {
            return;
        };

        if let Some(parent) = path.parent() {
            if fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) else {
            return;
        };
        let _ = writeln!(file, "{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn appends_one_json_object_per_event() {
        let dir = tempdir().expect("tempdir");
        let log = EventLog::new(dir.path().join("logs/service.log"));
        log.info("request.allocated", "req-1", "allocated");
        log.error("run.failed", "req-1", "boom");

        let raw = fs::read_to_string(dir.path().join("logs/service.log")).expect("read log");
        let lines: Vec<serde_json::Value> = raw
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "request.allocated");
        assert_eq!(lines[0]["level"], "info");
        assert_eq!(lines[1]["level"], "error");
        assert_eq!(lines[1]["request_id"], "req-1");
        assert!(lines[1]["timestamp"].is_string());
    }

    #[test]
    fn disabled_log_writes_nothing() {
        let log = EventLog::disabled();
        assert!(log.path.is_none());
        log.warn("cleanup.failed", "req-1", "ignored");
    }
}
