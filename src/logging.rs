//! Diagnostic logging.
//!
//! Logs go to stderr so the JSON report on stdout stays machine-readable.
//! `RUST_LOG`, when set, takes precedence over the configured level.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    /// Default: only skipped artifacts and problems
    #[default]
    Warn,
    Error,
    Off,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
            LogLevel::Off => Level::ERROR, // filtered out by the "off" directive
        }
    }
}

impl From<u8> for LogLevel {
    /// 0 = Warn, 1 = Info, 2 = Debug, 3+ = Trace
    fn from(verbosity: u8) -> Self {
        match verbosity {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub with_timestamps: bool,
    /// Include the module path
    pub with_target: bool,
    pub with_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            with_timestamps: true,
            with_target: true,
            with_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.with_timestamps = enabled;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.with_thread_ids = enabled;
        self
    }

    /// Configuration for a `-v` count; `quiet` wins over any verbosity.
    pub fn from_verbosity(verbosity: u8, quiet: bool) -> Self {
        let level = if quiet {
            LogLevel::Off
        } else {
            LogLevel::from(verbosity)
        };
        // worker ids matter once handler methods run on the pool
        Self::default()
            .with_level(level)
            .with_thread_ids(verbosity >= 3)
    }
}

/// Installs the global subscriber. Call once, before analysis starts.
///
/// ```no_run
/// use restprobe::logging::{init_logging, LoggingConfig, LogLevel};
///
/// init_logging(LoggingConfig::new().with_level(LogLevel::Debug).with_timestamps(false));
/// ```
pub fn init_logging(config: LoggingConfig) {
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(config.level.directive())
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(config.with_target)
        .with_thread_ids(config.with_thread_ids);

    if config.with_timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
