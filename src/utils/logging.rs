//! Logging setup and timing helpers.
//!
//! Records are written through `env_logger`, either as plain text lines or
//! as one JSON object per line. `RUST_LOG` still overrides the configured
//! level when it is set.

use crate::{HdError, Result};
use log::{Level, LevelFilter, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl LogLevel {
    /// The matching `log::Level`, or `None` for `Off`.
    pub fn as_level(self) -> Option<Level> {
        LevelFilter::from(self).to_level()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Off => write!(f, "OFF"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Trace => write!(f, "TRACE"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = HdError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(LogLevel::Off),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(HdError::InvalidInput(format!("unknown log level: {}", other))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Emit one JSON object per record instead of a text line
    pub json_format: bool,
    pub include_timestamp: bool,
    pub include_module_path: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            json_format: false,
            include_timestamp: true,
            include_module_path: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: LogLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    fn format_record(&self, record: &Record) -> String {
        if self.json_format {
            self.format_json_record(record)
        } else {
            self.format_text_record(record)
        }
    }

    fn format_json_record(&self, record: &Record) -> String {
        let mut json_record = serde_json::Map::new();

        json_record.insert("level".to_string(), record.level().to_string().into());
        json_record.insert("message".to_string(), record.args().to_string().into());

        if self.include_timestamp {
            json_record.insert("timestamp".to_string(), unix_seconds().into());
        }

        if self.include_module_path {
            if let Some(module_path) = record.module_path() {
                json_record.insert("module".to_string(), module_path.into());
            }
        }

        serde_json::Value::Object(json_record).to_string()
    }

    fn format_text_record(&self, record: &Record) -> String {
        let mut formatted = String::new();

        if self.include_timestamp {
            formatted.push_str(&format!("[{}] ", unix_seconds()));
        }

        formatted.push_str(&format!("[{}] ", record.level()));

        if self.include_module_path {
            if let Some(module_path) = record.module_path() {
                formatted.push_str(&format!("[{}] ", module_path));
            }
        }

        formatted.push_str(&record.args().to_string());
        formatted
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Installs the global logger.
///
/// Returns `false` when a logger was already installed; the existing one
/// keeps running and the call is otherwise a no-op.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let formatter = config.clone();

    let installed = env_logger::Builder::new()
        .filter_level(config.level.into())
        .parse_default_env()
        .format(move |buf, record| writeln!(buf, "{}", formatter.format_record(record)))
        .try_init()
        .is_ok();

    if installed {
        log::debug!("logger initialized with level: {}", config.level);
    }
    installed
}

/// Logs the duration of an operation at debug level when stopped.
pub struct PerformanceTimer {
    start_time: Instant,
    operation_name: String,
}

impl PerformanceTimer {
    pub fn start(operation_name: &str) -> Self {
        Self {
            start_time: Instant::now(),
            operation_name: operation_name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        let duration = self.elapsed();
        log::debug!("Operation '{}' completed in {:?}", self.operation_name, duration);
        duration
    }
}
