//! The injected logging capability.
//!
//! Components hold an `Arc<dyn Logger>` and call [`Logger::info`],
//! [`Logger::warn`] or [`Logger::error`] with a message and a slice of
//! key/value [`Field`]s. Which sink receives the entry is the caller's choice.

use std::fmt;

use parking_lot::Mutex;

/// A single key/value pair attached to a log entry.
pub type Field<'a> = (&'a str, &'a dyn fmt::Display);

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Informational lifecycle events.
    Info,
    /// Unexpected but harmless conditions.
    Warn,
    /// Failures that were observed and absorbed.
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Leveled, structured logging capability.
///
/// Implementations must be cheap to call from any task.
pub trait Logger: Send + Sync {
    /// Logs an informational message.
    fn info(&self, message: &str, fields: &[Field<'_>]);

    /// Logs a warning.
    fn warn(&self, message: &str, fields: &[Field<'_>]);

    /// Logs an error.
    fn error(&self, message: &str, fields: &[Field<'_>]);
}

/// Renders fields as `key=value` pairs separated by spaces.
struct DisplayFields<'a, 'b>(&'a [Field<'b>]);

impl fmt::Display for DisplayFields<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Forwards entries to the `tracing` macros.
///
/// Fields are rendered into a single `fields` attribute since `tracing`
/// requires field names to be known at compile time.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: &'static str,
}

impl TracingLogger {
    /// Creates a logger tagging every event with `component`.
    #[must_use]
    pub const fn new(component: &'static str) -> Self {
        Self { component }
    }

    /// Returns the component tag.
    #[must_use]
    pub const fn component(&self) -> &'static str {
        self.component
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("sluice")
    }
}

impl Logger for TracingLogger {
    fn info(&self, message: &str, fields: &[Field<'_>]) {
        tracing::info!(component = self.component, fields = %DisplayFields(fields), "{message}");
    }

    fn warn(&self, message: &str, fields: &[Field<'_>]) {
        tracing::warn!(component = self.component, fields = %DisplayFields(fields), "{message}");
    }

    fn error(&self, message: &str, fields: &[Field<'_>]) {
        tracing::error!(component = self.component, fields = %DisplayFields(fields), "{message}");
    }
}

/// Discards every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn info(&self, _message: &str, _fields: &[Field<'_>]) {}

    fn warn(&self, _message: &str, _fields: &[Field<'_>]) {}

    fn error(&self, _message: &str, _fields: &[Field<'_>]) {}
}

/// A recorded log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity.
    pub level: Level,
    /// Message text.
    pub message: String,
    /// Rendered key/value pairs, in call order.
    pub fields: Vec<(String, String)>,
}

impl LogRecord {
    /// Returns the rendered value of `key`, if present.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Keeps every entry in memory.
///
/// Intended for tests that assert on what a component logged.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    /// Creates an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all records.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Returns the records with the given level.
    #[must_use]
    pub fn records_at(&self, level: Level) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .cloned()
            .collect()
    }

    /// Number of records whose message equals `message`.
    #[must_use]
    pub fn count(&self, message: &str) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.message == message)
            .count()
    }

    /// Whether any record has the given message.
    #[must_use]
    pub fn contains(&self, message: &str) -> bool {
        self.count(message) > 0
    }

    /// Removes all records.
    pub fn clear(&self) {
        self.records.lock().clear();
    }

    fn push(&self, level: Level, message: &str, fields: &[Field<'_>]) {
        let record = LogRecord {
            level,
            message: message.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.to_string()))
                .collect(),
        };
        self.records.lock().push(record);
    }
}

impl Logger for MemoryLogger {
    fn info(&self, message: &str, fields: &[Field<'_>]) {
        self.push(Level::Info, message, fields);
    }

    fn warn(&self, message: &str, fields: &[Field<'_>]) {
        self.push(Level::Warn, message, fields);
    }

    fn error(&self, message: &str, fields: &[Field<'_>]) {
        self.push(Level::Error, message, fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_memory_logger_records_levels_and_fields() {
        let logger = MemoryLogger::new();
        logger.info("Starting HTTP server", &[("address", &"127.0.0.1:80")]);
        logger.error("HTTP server error", &[("error", &"boom"), ("attempt", &3)]);

        let records = logger.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, Level::Info);
        assert_eq!(records[0].field("address"), Some("127.0.0.1:80"));
        assert_eq!(records[1].level, Level::Error);
        assert_eq!(records[1].field("attempt"), Some("3"));
        assert_eq!(records[1].field("missing"), None);
    }

    #[test]
    fn test_memory_logger_count_and_clear() {
        let logger = MemoryLogger::new();
        logger.warn("slow", &[]);
        logger.warn("slow", &[]);
        logger.info("fast", &[]);

        assert_eq!(logger.count("slow"), 2);
        assert_eq!(logger.records_at(Level::Info).len(), 1);
        assert!(logger.contains("fast"));

        logger.clear();
        assert!(logger.records().is_empty());
    }

    #[test]
    fn test_loggers_as_trait_objects() {
        let loggers: Vec<Arc<dyn Logger>> = vec![
            Arc::new(TracingLogger::default()),
            Arc::new(NoopLogger),
            Arc::new(MemoryLogger::new()),
        ];

        for logger in &loggers {
            logger.info("message", &[("key", &"value")]);
            logger.warn("message", &[]);
            logger.error("message", &[("error", &"e")]);
        }
    }

    #[test]
    fn test_display_fields() {
        let fields: [Field<'_>; 2] = [("a", &1), ("b", &"two")];
        assert_eq!(DisplayFields(&fields).to_string(), "a=1 b=two");
        assert_eq!(DisplayFields(&[]).to_string(), "");
    }

    #[test]
    fn test_tracing_logger_component() {
        assert_eq!(TracingLogger::default().component(), "sluice");
        assert_eq!(TracingLogger::new("http").component(), "http");
    }
}
