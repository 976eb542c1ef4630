//! Session Manager
//!
//! Single source of truth for who is logged in. The identity is persisted
//! next to the credential pair so it survives restarts, and is restored on
//! trust at startup without re-validating the token.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, ApiGateway, RequestEnvelope, endpoints};

use super::models::{CredentialPair, LoginRequest, LoginResponse, RegisterRequest, Role, Session};
use super::storage::{
    ACCESS_TOKEN_KEY, IDENTITY_KEY, KeyValueStore, REFRESH_TOKEN_KEY, SESSION_KEYS, StorageError,
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to persist session: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Anonymous,
    Authenticated,
}

#[derive(Default)]
struct Current {
    initialized: bool,
    session: Option<Arc<Session>>,
    access_expires_at: Option<DateTime<Utc>>,
}

impl Current {
    fn state(&self) -> SessionState {
        match (&self.session, self.initialized) {
            (Some(_), _) => SessionState::Authenticated,
            (None, true) => SessionState::Anonymous,
            (None, false) => SessionState::Uninitialized,
        }
    }
}

pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    gateway: ApiGateway,
    // Replaced as a whole, never patched, so readers see an old or a new
    // session and nothing in between. Writers hold it across their store
    // writes too, keeping memory and the persisted keys in step.
    current: RwLock<Current>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>, gateway: ApiGateway) -> Self {
        Self {
            store,
            gateway,
            current: RwLock::new(Current::default()),
        }
    }

    pub fn state(&self) -> SessionState {
        self.current.read().state()
    }

    /// Snapshot of the current session
    pub fn current(&self) -> Option<Arc<Session>> {
        self.current.read().session.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().session.is_some()
    }

    /// When the access token of a session created by `login` in this process
    /// stops being valid. Unknown for restored sessions.
    pub fn access_expires_at(&self) -> Option<DateTime<Utc>> {
        self.current.read().access_expires_at
    }

    /// Restore the persisted session, if any. Only the first call does work.
    ///
    /// Token and identity must both be present and the identity must parse;
    /// anything else wipes every persisted key and leaves the user anonymous.
    pub fn initialize(&self) -> SessionState {
        if self.current.read().initialized {
            return self.state();
        }

        let mut current = self.current.write();
        if !current.initialized {
            current.initialized = true;
            if current.session.is_none() {
                current.session = self.restore();
            }
        }

        let state = current.state();
        info!("Session initialized: {:?}", state);
        state
    }

    fn restore(&self) -> Option<Arc<Session>> {
        let token = self.store.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty());
        let identity = self.store.get(IDENTITY_KEY);

        match (token, identity) {
            (Some(_), Some(raw)) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => {
                    debug!("Restored session for {}", session.subject_id());
                    Some(Arc::new(session))
                }
                Err(e) => {
                    warn!("Cached identity is corrupt, clearing persisted session: {}", e);
                    self.wipe();
                    None
                }
            },
            _ => {
                if SESSION_KEYS.iter().any(|key| self.store.get(key).is_some()) {
                    warn!("Incomplete persisted session, clearing it");
                    self.wipe();
                }
                None
            }
        }
    }

    /// Log in under `role` and replace any existing session.
    ///
    /// On failure nothing changes: neither the in-memory session nor the
    /// persisted record.
    pub async fn login(&self, username: &str, password: &str, role: Role) -> Result<Arc<Session>, AuthError> {
        info!("🔐 Logging in {} as {}", username, role);

        let request = RequestEnvelope::post(role.login_path()).json(&LoginRequest { username, password })?;
        let response: LoginResponse = self.gateway.execute(request).await.map_err(|e| {
            warn!("Login for {} failed: {}", username, e);
            e
        })?;

        if response.access_token.trim().is_empty() {
            warn!("Login for {} returned no access token", username);
            return Err(ApiError::MalformedResponse("login response carries no access token".to_string()).into());
        }

        let session = Arc::new(response.session_for(username, role));
        let credentials = response.credentials();
        let identity = serde_json::to_string(session.as_ref()).map_err(StorageError::from)?;

        {
            let mut current = self.current.write();
            self.persist(&credentials, &identity)?;
            *current = Current {
                initialized: true,
                session: Some(session.clone()),
                access_expires_at: Some(credentials.access_expires_at(Utc::now())),
            };
        }

        info!("✅ Logged in {} ({})", session.subject_id(), role);
        Ok(session)
    }

    /// Create a customer account. Does not log in.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<(), ApiError> {
        info!("Registering customer {}", username);
        let request = RequestEnvelope::post(endpoints::CUSTOMER_REGISTER).json(&RegisterRequest {
            email,
            username,
            password,
            confirm_password,
        })?;
        let _: Value = self.gateway.execute(request).await?;
        Ok(())
    }

    /// Forget the session and every persisted key. Always succeeds.
    pub fn logout(&self) {
        let mut current = self.current.write();
        self.wipe();
        *current = Current {
            initialized: true,
            ..Current::default()
        };
        info!("Logged out");
    }

    fn persist(&self, credentials: &CredentialPair, identity: &str) -> Result<(), StorageError> {
        let previous: Vec<(&str, Option<String>)> =
            SESSION_KEYS.iter().map(|key| (*key, self.store.get(key))).collect();

        let written = [
            (ACCESS_TOKEN_KEY, credentials.access_token.as_str()),
            (REFRESH_TOKEN_KEY, credentials.refresh_token.as_str()),
            (IDENTITY_KEY, identity),
        ]
        .into_iter()
        .try_for_each(|(key, value)| self.store.set(key, value));

        if let Err(e) = written {
            warn!("Could not persist session, restoring previous record: {}", e);
            for (key, value) in previous {
                let restored = match value {
                    Some(value) => self.store.set(key, &value),
                    None => self.store.remove(key),
                };
                if let Err(e) = restored {
                    warn!("Could not restore {}: {}", key, e);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    fn wipe(&self) {
        for key in SESSION_KEYS {
            if let Err(e) = self.store.remove(key) {
                warn!("Could not remove {} from session storage: {}", key, e);
            }
        }
    }
}
