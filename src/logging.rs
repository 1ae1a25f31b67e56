//! Structured logging sink injected into the engine.
//!
//! Components never log through process-wide state directly; they receive a
//! [`SharedLogger`] and report through it. [`TracingLogger`] forwards to
//! `tracing`, [`MemoryLogger`] captures entries for later assertion.

use std::sync::{Arc, Mutex};

/// Log level supported by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

/// Sink for diagnostic messages.
pub trait Logger: Send + Sync {
    /// Log a debug message.
    fn debug(&self, message: &str);

    /// Log an informational message.
    fn info(&self, message: &str);

    /// Log a warning.
    fn warn(&self, message: &str);
}

/// Logger shared between the tree, plugins and process runners.
pub type SharedLogger = Arc<dyn Logger>;

/// Logger that forwards to the `tracing` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    /// Create a shared tracing logger.
    pub fn shared() -> SharedLogger {
        Arc::new(Self)
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

/// Logger that records every entry in memory.
///
/// # Example
///
/// ```
/// use save::logging::{Logger, MemoryLogger};
///
/// let logger = MemoryLogger::new();
/// logger.warn("stderr was not empty");
/// assert_eq!(logger.warnings(), vec!["stderr was not empty".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    /// Create an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries in order.
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Messages recorded at a given level.
    pub fn at_level(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }

    /// Messages recorded at warn level.
    pub fn warnings(&self) -> Vec<String> {
        self.at_level(LogLevel::Warn)
    }

    fn record(&self, level: LogLevel, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((level, message.to_string()));
        }
    }
}

impl Logger for MemoryLogger {
    fn debug(&self, message: &str) {
        self.record(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.record(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.record(LogLevel::Warn, message);
    }
}
