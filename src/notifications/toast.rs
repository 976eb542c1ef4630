//! Toast Models
//!
//! A toast is a short, self-expiring status message surfaced to the user.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Default lifetime of a toast when the caller does not pick one
pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);

/// Deadline offset used when `created_at + ttl` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Unique identifier for a toast.
///
/// A fresh v4 UUID per toast, so an id is never handed out twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToastId(Uuid);

impl ToastId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ToastId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome category of a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A queued notification
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    id: ToastId,
    message: String,
    severity: Severity,
    ttl: Duration,
    created_at: Instant,
}

impl Toast {
    pub(crate) fn new(message: impl Into<String>, severity: Severity, ttl: Duration) -> Self {
        Self {
            id: ToastId::new(),
            message: message.into(),
            severity,
            ttl,
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> ToastId {
        self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Instant at which the queue removes this toast on its own
    pub fn expires_at(&self) -> Instant {
        self.created_at
            .checked_add(self.ttl)
            .unwrap_or_else(|| self.created_at + FAR_FUTURE)
    }
}
