//! Logging sink interface.
//!
//! The core reports operational and security events through a fire-and-forget
//! sink. A sink failure must never surface to a caller, so `record` is
//! infallible by construction - implementations swallow their own errors.

use serde_json::Value;

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Security,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Security => "SECURITY",
        }
    }
}

/// Fire-and-forget event sink.
pub trait LogSink: Send + Sync {
    /// Record an event. Must not panic and must not block on slow backends.
    fn record(&self, level: LogLevel, message: &str, metadata: Value);

    /// Drop any stored log collections. Best effort, invoked during a full
    /// system wipe; the default does nothing.
    fn purge(&self) {}
}

/// Sink that forwards to the `tracing` facade.
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, level: LogLevel, message: &str, metadata: Value) {
        match level {
            LogLevel::Info => tracing::info!(%metadata, "{}", message),
            LogLevel::Warn => tracing::warn!(%metadata, "{}", message),
            LogLevel::Error => tracing::error!(%metadata, "{}", message),
            LogLevel::Security => {
                tracing::warn!(target: "shardkeep::security", %metadata, "{}", message)
            }
        }
    }
}

/// Sink that discards everything.
pub struct NullSink;

impl LogSink for NullSink {
    fn record(&self, _level: LogLevel, _message: &str, _metadata: Value) {}
}
