//! # Client
//!
//! Composition root wiring the session store, the gateway, the session
//! manager and the toast queue together. Screens hold a clone of
//! [`AmsClient`] and reach the core through it.

use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::api::{AirlineApi, ApiGateway, ReqwestTransport, Transport};
use crate::auth::{FileStore, KeyValueStore, SessionManager, StoredCredentials};
use crate::config::Config;
use crate::notifications::ToastQueue;

#[derive(Clone)]
pub struct AmsClient {
    session: Arc<SessionManager>,
    api: AirlineApi,
    toasts: ToastQueue,
}

impl AmsClient {
    /// Wire a client over explicit collaborators
    pub fn new(
        base_url: Url,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
        toast_ttl: Duration,
    ) -> Self {
        let credentials = Arc::new(StoredCredentials::new(store.clone()));
        let gateway = ApiGateway::new(base_url, transport, credentials);
        Self {
            session: Arc::new(SessionManager::new(store, gateway.clone())),
            api: AirlineApi::new(gateway),
            toasts: ToastQueue::new(toast_ttl),
        }
    }

    /// Client persisting its session to the configured file and talking to
    /// the backend over `reqwest`
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_base_url.clone(),
            Arc::new(FileStore::open(&config.session_file)),
            Arc::new(ReqwestTransport::default()),
            config.toast_ttl,
        )
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn api(&self) -> &AirlineApi {
        &self.api
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }
}
