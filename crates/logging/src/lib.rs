//! Tollgate Logging
//!
//! One-call tracing setup shared by the tollgate binaries.
//!
//! ## Usage
//!
//! ```no_run
//! use tollgate_logging::LogLevel;
//!
//! // From a -v occurrence count (common CLI pattern)
//! tollgate_logging::init(LogLevel::from_verbosity(0));
//! ```
//!
//! `RUST_LOG` takes precedence over the requested level when set.

use tracing_subscriber::EnvFilter;

/// Default log level for the process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Info, warnings, and errors (default)
    #[default]
    Info,
    /// Debug messages and above
    Debug,
    /// All messages including trace
    Trace,
}

impl LogLevel {
    /// Map a `-v` occurrence count to a level.
    ///
    /// - `0` → `Info`
    /// - `1` → `Debug`
    /// - `2+` → `Trace`
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Self::Info,
            1 => Self::Debug,
            _ => Self::Trace,
        }
    }

    fn directive(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Initialize logging with the specified default level.
///
/// # Panics
///
/// Panics if a global subscriber was already installed; use [`try_init`]
/// to handle that case.
pub fn init(level: LogLevel) {
    try_init(level).expect("Failed to initialize logging");
}

/// Try to initialize logging, returning an error if a subscriber is
/// already installed.
pub fn try_init(level: LogLevel) -> Result<(), String> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| e.to_string())
}

/// Initialize logging for tests; output is captured by the test harness
/// and repeated calls are a no-op.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_verbosity() {
        assert_eq!(LogLevel::from_verbosity(0), LogLevel::Info);
        assert_eq!(LogLevel::from_verbosity(1), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbosity(2), LogLevel::Trace);
        assert_eq!(LogLevel::from_verbosity(200), LogLevel::Trace);
    }

    #[test]
    fn test_directive() {
        assert_eq!(LogLevel::Error.directive(), "error");
        assert_eq!(LogLevel::Warn.directive(), "warn");
        assert_eq!(LogLevel::Info.directive(), "info");
        assert_eq!(LogLevel::Debug.directive(), "debug");
        assert_eq!(LogLevel::Trace.directive(), "trace");
    }

    #[test]
    fn test_default_level() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_repeated_test_init() {
        init_for_tests();
        init_for_tests();
    }
}
