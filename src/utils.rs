//! Ambient helpers: configuration files and logging.

pub mod config;
pub mod logging;

pub use config::ConfigManager;
pub use logging::{init_logging, LogLevel, LoggingConfig, PerformanceTimer};
