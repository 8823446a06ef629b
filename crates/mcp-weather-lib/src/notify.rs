//! Progress and log notifications sent back to the invoker of a tool.
//!
//! [`Notifier`] is the seam to the protocol layer. Implementations may fail,
//! but the orchestrator only ever goes through [`emit_progress`] and
//! [`emit_log`], which log delivery errors locally and carry on.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Denominator of every progress event in this service.
pub const PROGRESS_TOTAL: f64 = 1.0;

/// Opaque correlation id supplied by the invoker and echoed back untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressToken(pub Value);

impl fmt::Display for ProgressToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProgressEvent {
    pub token: Option<ProgressToken>,
    /// Fraction completed, in `[0, 1]`.
    pub completed: f64,
    pub total: f64,
    pub label: String,
}

impl ProgressEvent {
    pub fn new(token: Option<ProgressToken>, completed: f64, label: impl Into<String>) -> Self {
        Self {
            token,
            completed,
            total: PROGRESS_TOTAL,
            label: label.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSeverity::Debug => "debug",
            LogSeverity::Info => "info",
            LogSeverity::Warning => "warning",
            LogSeverity::Error => "error",
        }
    }
}

impl fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogEvent {
    pub severity: LogSeverity,
    pub message: String,
}

impl LogEvent {
    pub fn new(severity: LogSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification could not be delivered: {0}")]
    Delivery(String),
    #[error("progress token `{0}` is neither a string nor an integer")]
    InvalidToken(String),
}

/// Outbound notification channel to the current invoker.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn progress(&self, event: ProgressEvent) -> Result<(), NotifyError>;

    async fn log(&self, event: LogEvent) -> Result<(), NotifyError>;
}

/// Send a progress update; delivery failures are logged and swallowed.
pub async fn emit_progress<N: Notifier + ?Sized>(
    notifier: &N,
    token: Option<&ProgressToken>,
    completed: f64,
    label: &str,
) {
    let event = ProgressEvent::new(token.cloned(), completed, label);
    if let Err(err) = notifier.progress(event).await {
        warn!(completed, label, error = %err, "failed to send progress notification");
    }
}

/// Send a log line to the invoker; delivery failures are logged and swallowed.
pub async fn emit_log<N: Notifier + ?Sized>(notifier: &N, severity: LogSeverity, message: String) {
    let event = LogEvent::new(severity, message);
    if let Err(err) = notifier.log(event).await {
        warn!(%severity, error = %err, "failed to send log notification");
    }
}
