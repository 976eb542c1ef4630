//! # Notifications Module
//!
//! Transient, self-expiring status messages (toasts) that any part of the
//! client can raise without managing their display lifetime.

pub mod queue;
pub mod toast;

pub use queue::ToastQueue;
pub use toast::{DEFAULT_TTL, Severity, Toast, ToastId};
