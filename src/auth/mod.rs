//! # Authentication Module
//!
//! Owns the authenticated session: login and registration through the API
//! gateway, persistence of the credential pair and cached identity, and
//! restoration of that record at startup.

pub mod models;
pub mod session;
pub mod storage;

pub use models::{Role, Session};
pub use session::{AuthError, SessionManager, SessionState};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StoredCredentials};
