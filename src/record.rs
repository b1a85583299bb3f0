use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::Level;

/// Owned copy of a `tracing` event that hooks decorate before it reaches a
/// [`RecordSink`](crate::sink::RecordSink).
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub module_path: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub fields: BTreeMap<String, serde_json::Value>,
    pub message: Option<String>,
}

impl LogRecord {
    /// Empty record stamped with the current time.
    pub fn new(level: Level, target: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level: level.to_string(),
            target: target.into(),
            module_path: None,
            file: None,
            line: None,
            fields: BTreeMap::new(),
            message: None,
        }
    }

    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    /// Insert or overwrite a structured field.
    pub fn insert_field(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.fields.insert(key.to_string(), value.into());
    }
}
