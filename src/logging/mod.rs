// Logging module - In-memory log capture while the console owns the terminal
//
// A custom tracing layer records events into a bounded ring buffer instead of
// writing to stdout or stderr, which would garble the alternate screen. When
// the console exits, warnings and errors are replayed to stderr.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Maximum number of log entries to keep in memory
const MAX_LOG_ENTRIES: usize = 1000;

/// A single log entry captured from tracing
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    /// The tracing target (module path)
    pub target: String,
    pub message: String,
}

impl LogEntry {
    /// One-line rendering for stderr replay
    pub fn display_line(&self) -> String {
        format!(
            "{} {:5} {}: {}",
            self.timestamp.format("%H:%M:%S"),
            self.level.as_str(),
            self.target,
            self.message
        )
    }
}

/// Log level for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<&Level> for LogLevel {
    fn from(level: &Level) -> Self {
        match *level {
            Level::ERROR => LogLevel::Error,
            Level::WARN => LogLevel::Warn,
            Level::INFO => LogLevel::Info,
            Level::DEBUG => LogLevel::Debug,
            Level::TRACE => LogLevel::Trace,
        }
    }
}

impl LogLevel {
    /// Get the display string for this log level
    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    /// Warnings and errors survive the session
    pub fn is_problem(&self) -> bool {
        matches!(self, LogLevel::Error | LogLevel::Warn)
    }
}

/// In-memory log buffer with bounded size (ring buffer)
#[derive(Clone)]
pub struct LogBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl LogBuffer {
    /// Create a new log buffer
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOG_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    // A panic while logging must not take the buffer down with it
    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a log entry to the buffer
    /// If the buffer is full, removes the oldest entry
    pub fn add(&self, entry: LogEntry) {
        let mut entries = self.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Get all log entries (most recent last)
    pub fn get_all(&self) -> Vec<LogEntry> {
        self.lock().iter().cloned().collect()
    }

    /// Warnings and errors, oldest first
    pub fn problems(&self) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|e| e.level.is_problem())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Write buffered warnings and errors to `out`. Returns how many were written.
    pub fn replay_problems(&self, out: &mut impl Write) -> std::io::Result<usize> {
        let problems = self.problems();
        for entry in &problems {
            writeln!(out, "{}", entry.display_line())?;
        }
        Ok(problems.len())
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Custom tracing layer that captures logs to a buffer
pub struct TuiLogLayer {
    buffer: LogBuffer,
}

impl TuiLogLayer {
    /// Create a new TUI log layer with a log buffer
    pub fn new(buffer: LogBuffer) -> Self {
        Self { buffer }
    }
}

impl<S> Layer<S> for TuiLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut message = String::new();
        let mut visitor = MessageVisitor(&mut message);
        event.record(&mut visitor);

        self.buffer.add(LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::from(metadata.level()),
            target: metadata.target().to_string(),
            message,
        });
    }

    fn enabled(&self, _metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        // Filtering happens at subscriber level
        true
    }
}

/// Visitor to extract the message from a tracing event
struct MessageVisitor<'a>(&'a mut String);

impl<'a> tracing::field::Visit for MessageVisitor<'a> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{:?}", value);
            // Remove the quotes that Debug adds
            if self.0.len() >= 2 && self.0.starts_with('"') && self.0.ends_with('"') {
                *self.0 = self.0[1..self.0.len() - 1].to_string();
            }
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            *self.0 = value.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    fn entry(level: LogLevel, message: &str) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level,
            target: "agentdeck::test".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_buffer_drops_oldest_when_full() {
        let buffer = LogBuffer::with_capacity(2);
        buffer.add(entry(LogLevel::Info, "one"));
        buffer.add(entry(LogLevel::Info, "two"));
        buffer.add(entry(LogLevel::Info, "three"));

        let messages: Vec<_> = buffer.get_all().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[test]
    fn test_replay_writes_only_problems() {
        let buffer = LogBuffer::new();
        buffer.add(entry(LogLevel::Info, "started"));
        buffer.add(entry(LogLevel::Warn, "remote status failed"));
        buffer.add(entry(LogLevel::Debug, "dropped stale timer"));
        buffer.add(entry(LogLevel::Error, "backend closed"));

        let mut out = Vec::new();
        let written = buffer.replay_problems(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(written, 2);
        assert!(text.contains("WARN  agentdeck::test: remote status failed"));
        assert!(text.contains("ERROR agentdeck::test: backend closed"));
        assert!(!text.contains("started"));
    }

    #[test]
    fn test_layer_captures_events() {
        let buffer = LogBuffer::new();
        let subscriber = tracing_subscriber::registry().with(TuiLogLayer::new(buffer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("theme {} not found", "Solarized");
            tracing::info!(worktree = "main", "refreshing");
        });

        let entries = buffer.get_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, LogLevel::Warn);
        assert_eq!(entries[0].message, "theme Solarized not found");
        assert_eq!(entries[1].message, "refreshing");
    }
}
