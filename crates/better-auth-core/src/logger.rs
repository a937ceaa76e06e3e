// Adapter logger.
//
// Level-filtered logger with optional ANSI colours and pluggable sinks. Every
// record carries the scope that emitted it ("resolver", "schema-sync", ...),
// so soft failures can be asserted on in tests through `MemoryLogHandler`
// instead of scraping stderr.

use std::fmt;
use std::sync::{Arc, Mutex};

/// ANSI escape codes used by the default sink.
pub mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const BRIGHT: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub mod fg {
        pub const RED: &str = "\x1b[31m";
        pub const YELLOW: &str = "\x1b[33m";
        pub const BLUE: &str = "\x1b[34m";
        pub const MAGENTA: &str = "\x1b[35m";
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    pub fn color(&self) -> &'static str {
        match self {
            LogLevel::Debug => ansi::fg::MAGENTA,
            LogLevel::Info => ansi::fg::BLUE,
            LogLevel::Warn => ansi::fg::YELLOW,
            LogLevel::Error => ansi::fg::RED,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Warn,
        }
    }
}

/// A single emitted log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    /// Component that emitted the record.
    pub scope: String,
    pub message: String,
}

/// Sink for log records. Replaces the default stderr/stdout output.
pub trait LogHandler: Send + Sync + fmt::Debug {
    fn handle(&self, record: &LogRecord);
}

/// Handler that keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemoryLogHandler {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything captured so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Records at exactly `level`.
    pub fn at_level(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}

impl LogHandler for MemoryLogHandler {
    fn handle(&self, record: &LogRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Whether logging is disabled entirely.
    pub disabled: bool,
    /// Whether to disable ANSI color output.
    pub disable_colors: bool,
    /// The minimum log level to emit.
    pub level: LogLevel,
    /// Optional custom sink (overrides default stderr/stdout output).
    pub handler: Option<Arc<dyn LogHandler>>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            disable_colors: false,
            level: LogLevel::Warn,
            handler: None,
        }
    }
}

/// Logger handed to the resolver, the synchronizer and the adapter.
///
/// Cloning is cheap; `scoped` returns a clone tagged with another component
/// name while sharing the same sink.
#[derive(Clone)]
pub struct AuthLogger {
    config: LoggerConfig,
    scope: String,
}

impl fmt::Debug for AuthLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthLogger")
            .field("scope", &self.scope)
            .field("level", &self.config.level)
            .field("disabled", &self.config.disabled)
            .finish()
    }
}

impl AuthLogger {
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            scope: "better-auth".to_string(),
        }
    }

    /// Logger that routes every record at `level` or above into `handler`.
    pub fn with_handler(level: LogLevel, handler: Arc<dyn LogHandler>) -> Self {
        Self::new(LoggerConfig {
            level,
            handler: Some(handler),
            ..Default::default()
        })
    }

    /// Logger that drops everything.
    pub fn silent() -> Self {
        Self::new(LoggerConfig {
            disabled: true,
            ..Default::default()
        })
    }

    /// Clone of this logger tagged with a different scope.
    pub fn scoped(&self, scope: impl Into<String>) -> Self {
        Self {
            config: self.config.clone(),
            scope: scope.into(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn level(&self) -> LogLevel {
        self.config.level
    }

    pub fn should_publish(&self, level: LogLevel) -> bool {
        !self.config.disabled && level >= self.config.level
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message.as_ref());
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if !self.should_publish(level) {
            return;
        }

        if let Some(ref handler) = self.config.handler {
            handler.handle(&LogRecord {
                level,
                scope: self.scope.clone(),
                message: message.to_string(),
            });
            return;
        }

        let formatted = self.format_message(level, message);
        match level {
            LogLevel::Error | LogLevel::Warn => eprintln!("{formatted}"),
            _ => println!("{formatted}"),
        }
    }

    fn format_message(&self, level: LogLevel, message: &str) -> String {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        if self.config.disable_colors {
            format!("{} {} [{}]: {}", timestamp, level.as_str(), self.scope, message)
        } else {
            format!(
                "{dim}{timestamp}{reset} {color}{level}{reset} {bright}[{scope}]:{reset} {message}",
                dim = ansi::DIM,
                reset = ansi::RESET,
                color = level.color(),
                level = level.as_str(),
                bright = ansi::BRIGHT,
                scope = self.scope,
            )
        }
    }
}

impl Default for AuthLogger {
    fn default() -> Self {
        Self::new(LoggerConfig::default())
    }
}
