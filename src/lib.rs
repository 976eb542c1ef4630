//! # AMS Client
//!
//! Client-side session and request layer of the airline operations app.
//! Screens consume it through a handful of operations: `login`, `logout`,
//! `execute` and `show_toast`.
//!
//! ## Architecture
//! - `notifications`: transient toast queue with per-toast expiry timers
//! - `api`: the gateway every backend call goes through, plus typed
//!   wrappers for the airline endpoints
//! - `auth`: the session manager and its persisted key-value store
//! - `client`: wires the three together
//! - `config`: environment configuration

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod notifications;

pub use api::{AirlineApi, ApiError, ApiGateway, RequestEnvelope};
pub use auth::{AuthError, Role, Session, SessionManager, SessionState};
pub use client::AmsClient;
pub use config::{CONFIG, Config};
pub use notifications::{Severity, Toast, ToastId, ToastQueue};
