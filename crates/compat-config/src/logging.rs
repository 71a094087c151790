//! Structured logging utilities for the compat shims.
//!
//! Provides consistent logging with component prefixes and structured fields.
//!
//! # Usage
//!
//! ```ignore
//! use compat_config::log_dirent_debug;
//!
//! log_dirent_debug!("Seek position not found", position = 1234);
//! log_threads_warn!("Destructor registry full", capacity = 1024);
//! ```

/// Component identifiers for log filtering
pub struct Component;

impl Component {
    pub const DIRENT: &'static str = "DIRENT";
    pub const THREADS: &'static str = "THREADS";
    pub const SEM: &'static str = "SEM";
    pub const CLI: &'static str = "CLI";
}

/// Log levels for runtime configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

// === DIRENT logging macros ===

#[macro_export]
macro_rules! log_dirent_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = $crate::logging::Component::DIRENT, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_dirent_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::DIRENT, $($key = $value,)* $msg)
    };
}

// === THREADS logging macros ===

#[macro_export]
macro_rules! log_threads_error {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::error!(component = $crate::logging::Component::THREADS, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_threads_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = $crate::logging::Component::THREADS, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_threads_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::THREADS, $($key = $value,)* $msg)
    };
}

// === SEM logging macros ===

#[macro_export]
macro_rules! log_sem_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::SEM, $($key = $value,)* $msg)
    };
}

// === CLI logging macros ===

#[macro_export]
macro_rules! log_cli_info {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(component = $crate::logging::Component::CLI, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_cli_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::CLI, $($key = $value,)* $msg)
    };
}

/// Initialize logging with the given level filter.
/// Call this once at application startup; later calls are ignored.
pub fn init_logging(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let with_target = crate::config().logging.with_target;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(with_target)
        .with_writer(std::io::stderr)
        .try_init();
}
