//! Destinations for log entries once the span side of a call is done.

use crate::field::{Field, FieldValue};
use crate::level::Level;
use parking_lot::Mutex;
use std::panic::Location;
use std::time::SystemTime;

/// One log call as seen by a sink.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    pub level: Level,
    pub message: &'a str,
    pub logger_name: Option<&'a str>,
    pub caller: Option<&'static Location<'static>>,
    pub time: SystemTime,
}

/// Underlying log writer.
pub trait LogSink: Send + Sync {
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    fn write(&self, entry: &Entry<'_>, fields: &[Field]);

    fn sync(&self) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopSink;

impl LogSink for NopSink {
    fn enabled(&self, _level: Level) -> bool {
        false
    }

    fn write(&self, _entry: &Entry<'_>, _fields: &[Field]) {}
}

/// Forwards entries to `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, entry: &Entry<'_>, fields: &[Field]) {
        let rendered = render_fields(fields);
        let logger = entry.logger_name.unwrap_or("");
        let caller = entry
            .caller
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_default();
        match entry.level.to_tracing() {
            tracing::Level::DEBUG => tracing::debug!(
                logger,
                caller = %caller,
                fields = %rendered,
                "{}",
                entry.message
            ),
            tracing::Level::INFO => tracing::info!(
                logger,
                caller = %caller,
                fields = %rendered,
                "{}",
                entry.message
            ),
            tracing::Level::WARN => tracing::warn!(
                logger,
                caller = %caller,
                fields = %rendered,
                "{}",
                entry.message
            ),
            _ => tracing::error!(
                logger,
                caller = %caller,
                severity = entry.level.as_str(),
                fields = %rendered,
                "{}",
                entry.message
            ),
        }
    }
}

/// Renders fields as space separated `key=value` pairs.
///
/// Fields following a namespace marker are prefixed with `<namespace>.`.
pub fn render_fields(fields: &[Field]) -> String {
    let mut prefix = String::new();
    let mut parts = Vec::with_capacity(fields.len());
    for field in fields {
        match &field.value {
            FieldValue::Skip => {}
            FieldValue::Namespace => {
                prefix.push_str(&field.key);
                prefix.push('.');
            }
            value => parts.push(format!("{prefix}{}={value}", field.key)),
        }
    }
    parts.join(" ")
}

/// An entry captured by [`MemorySink`], with owned data.
#[derive(Debug, Clone)]
pub struct RecordedEntry {
    pub level: Level,
    pub message: String,
    pub logger_name: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub time: SystemTime,
    pub fields: Vec<Field>,
}

impl RecordedEntry {
    /// First field with the given key.
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .map(|field| &field.value)
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.key.as_ref()).collect()
    }
}

/// Keeps every entry in memory, optionally filtered by a minimum level.
#[derive(Debug)]
pub struct MemorySink {
    min_level: Level,
    entries: Mutex<Vec<RecordedEntry>>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self::with_level(Level::Debug)
    }

    pub fn with_level(min_level: Level) -> Self {
        Self {
            min_level,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<RecordedEntry> {
        self.entries.lock().clone()
    }

    /// Drains the captured entries.
    pub fn take(&self) -> Vec<RecordedEntry> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn write(&self, entry: &Entry<'_>, fields: &[Field]) {
        let recorded = RecordedEntry {
            level: entry.level,
            message: entry.message.to_string(),
            logger_name: entry.logger_name.map(str::to_string),
            file: entry.caller.map(|loc| loc.file().to_string()),
            line: entry.caller.map(|loc| loc.line()),
            time: entry.time,
            fields: fields.to_vec(),
        };
        self.entries.lock().push(recorded);
    }
}
