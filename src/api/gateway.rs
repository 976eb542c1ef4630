//! API Gateway
//!
//! The single choke point for backend traffic. Every call goes through
//! [`ApiGateway::execute`], which attaches the fixed headers and the bearer
//! token, performs the round trip over a [`Transport`] and unwraps the
//! backend envelope into its `data` payload.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

pub use reqwest::Method;

use super::error::ApiError;

/// Headers owned by the gateway that callers can never override
const RESERVED_HEADERS: [HeaderName; 3] = [CONTENT_TYPE, ACCEPT, AUTHORIZATION];

/// Read-only source of the current access token.
///
/// Read fresh on every call, so a logout racing an in-flight request may or
/// may not include the token.
pub trait CredentialProvider: Send + Sync {
    fn access_token(&self) -> Option<String>;
}

impl<F> CredentialProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn access_token(&self) -> Option<String> {
        self()
    }
}

/// Provider for anonymous gateways
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn access_token(&self) -> Option<String> {
        None
    }
}

/// Backend wrapper around every response payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: String,
    pub timestamp: i64,
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
}

/// A backend request relative to the gateway base address
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    extra_headers: Vec<(String, String)>,
}

impl RequestEnvelope {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            extra_headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter; encoding happens when the URL is built
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("unserializable body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Add a caller header. Content negotiation and authorization headers
    /// belong to the gateway and are dropped if given here.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }
}

/// Fully resolved request handed to a transport
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Raw response returned by a transport
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The call never produced an HTTP response
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Executes one HTTP round trip
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Production transport backed by `reqwest`.
///
/// No retry and no timeout beyond the client defaults.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();

        // Failed responses are never parsed, so their body is not worth reading.
        if !response.status().is_success() {
            return Ok(HttpResponse { status, body: Vec::new() });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(HttpResponse { status, body: body.to_vec() })
    }
}

/// Stateless request executor shared by the session manager and every screen
#[derive(Clone)]
pub struct ApiGateway {
    base_url: Url,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiGateway {
    pub fn new(
        base_url: Url,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            base_url,
            transport,
            credentials,
        }
    }

    /// Gateway over the default `reqwest` client
    pub fn with_reqwest(base_url: Url, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::new(base_url, Arc::new(ReqwestTransport::default()), credentials)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Execute a request and return the unwrapped `data` payload
    pub async fn execute<T: DeserializeOwned>(&self, request: RequestEnvelope) -> Result<T, ApiError> {
        let http_request = self.build(&request)?;

        debug!("→ {} {}", request.method, request.path);
        let response = self.transport.send(http_request).await.map_err(|e| {
            warn!("{} {} could not reach the backend: {}", request.method, request.path, e);
            ApiError::Network(e.0)
        })?;

        if !response.is_success() {
            warn!("{} {} failed with status {}", request.method, request.path, response.status);
            return Err(ApiError::RequestFailed { status: response.status });
        }

        let envelope: Envelope<T> = serde_json::from_slice(&response.body).map_err(|e| {
            warn!("{} {} returned an unreadable body: {}", request.method, request.path, e);
            ApiError::MalformedResponse(e.to_string())
        })?;

        info!("{} {} → {} ({})", request.method, request.path, response.status, envelope.code);
        Ok(envelope.data)
    }

    fn build(&self, request: &RequestEnvelope) -> Result<HttpRequest, ApiError> {
        let body = request
            .body
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| ApiError::InvalidRequest(format!("unserializable body: {}", e)))?;

        Ok(HttpRequest {
            method: request.method.clone(),
            url: self.url_for(request)?,
            headers: self.headers_for(request)?,
            body,
        })
    }

    fn url_for(&self, request: &RequestEnvelope) -> Result<Url, ApiError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = request.path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| ApiError::InvalidRequest(format!("bad path {}: {}", request.path, e)))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }

    fn headers_for(&self, request: &RequestEnvelope) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = self.credentials.access_token().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidRequest("access token is not a valid header value".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        for (name, value) in &request.extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidRequest(format!("bad header name {}", name)))?;
            if RESERVED_HEADERS.contains(&name) {
                warn!("Ignoring caller header {} on {}", name, request.path);
                continue;
            }
            let value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::InvalidRequest(format!("bad value for header {}", name)))?;
            headers.append(name, value);
        }

        Ok(headers)
    }
}
