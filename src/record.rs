use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Structured log record handed to the writer.
///
/// The writer never looks inside; only a [`LineFormatter`] does.
///
/// [`LineFormatter`]: crate::format::LineFormatter
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
    /// Build a record stamped with the current time and no extra fields.
    pub fn new(
        level: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        LogRecord {
            timestamp: Utc::now(),
            level: level.into(),
            target: target.into(),
            module_path: None,
            file: None,
            line: None,
            fields: BTreeMap::new(),
            message: Some(message.into()),
        }
    }
}
