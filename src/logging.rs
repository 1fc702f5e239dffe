use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde_json::Value;

static SILENT: AtomicBool = AtomicBool::new(false);

#[derive(Serialize)]
struct LogEvent<'a> {
    level: &'a str,
    event: &'a str,
    message: &'a str,
    timestamp_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Value>,
}

/// Mute every log line, e.g. while benchmarking.
pub fn set_silent(silent: bool) {
    SILENT.store(silent, Ordering::Relaxed);
}

/// Honour `HEATMAP_LOG=off` so scripted callers can keep stderr clean.
pub fn init_from_env() {
    if let Ok(value) = std::env::var("HEATMAP_LOG") {
        let value = value.trim().to_ascii_lowercase();
        set_silent(matches!(value.as_str(), "off" | "0" | "false" | "none"));
    }
}

// Stdout carries command output, so every level goes to stderr.
fn emit(level: &str, event: &str, message: &str, metadata: Option<Value>) {
    if SILENT.load(Ordering::Relaxed) {
        return;
    }

    let entry = LogEvent {
        level,
        event,
        message,
        timestamp_ms: chrono::Utc::now().timestamp_millis(),
        metadata,
    };

    match serde_json::to_string(&entry) {
        Ok(payload) => eprintln!("{payload}"),
        Err(err) => eprintln!(
            "{{\"level\":\"error\",\"event\":\"logging_failure\",\"message\":\"failed to serialise log\",\"error\":\"{err}\"}}"
        ),
    }
}

pub fn info(event: &str, message: &str, metadata: Value) {
    emit("info", event, message, Some(metadata));
}

pub fn warn(event: &str, message: &str, metadata: Value) {
    emit("warn", event, message, Some(metadata));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_event_omits_missing_metadata() {
        let entry = LogEvent {
            level: "info",
            event: "snapshot.cache_hit",
            message: "served from cache",
            timestamp_ms: 1,
            metadata: None,
        };
        let payload = serde_json::to_string(&entry).expect("serialise");
        assert!(!payload.contains("metadata"));
        assert!(payload.contains("\"event\":\"snapshot.cache_hit\""));
    }
}
