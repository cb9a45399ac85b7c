//! Per-partition HTTP client.
//!
//! Each `HttpClient` is bound to one base URL. Every request goes through
//! the same two steps: the session token (if any) is attached as a bearer
//! header before sending, and the JSON body is returned as-is after a 2xx
//! response. Anything else (timeout, connection failure, non-2xx status)
//! is returned as an `ApiError` after exactly one attempt.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::SharedSession;

use super::{ApiError, Envelope};

/// Request timeout applied when the configuration does not set one.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Configuration for one service partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
    /// Extra default headers; these override the built-in defaults.
    pub headers: Vec<(String, String)>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            headers: Vec::new(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The configured timeout, or the default when unset or zero.
    pub fn effective_timeout(&self) -> Duration {
        self.timeout
            .filter(|t| !t.is_zero())
            .unwrap_or(Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    /// Default headers merged with the caller's, caller wins on conflict.
    fn default_headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::Config(format!("invalid header name '{}': {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::Config(format!("invalid value for header '{}': {}", name, e)))?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }
}

/// HTTP client bound to one base URL.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    session: SharedSession,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Build a client for the given partition.
    ///
    /// Fails with `ApiError::Config` when the base URL is empty or not an
    /// absolute URL, or when a configured header is malformed.
    pub fn new(config: ClientConfig, session: SharedSession) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ApiError::Config("base URL must not be empty".to_string()).into());
        }
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL '{}': {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::Config(format!("base URL '{}' cannot be joined", base_url)).into());
        }

        let client = Client::builder()
            .timeout(config.effective_timeout())
            .default_headers(config.default_headers()?)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Absolute URL for an endpoint path, joined with a single `/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET an endpoint and parse its envelope.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>> {
        self.fetch(Method::GET, path).await
    }

    /// POST a JSON body to an endpoint and parse its envelope.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<Envelope<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.submit(Method::POST, path, body).await
    }

    /// Send a request without a body and parse the response body as `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T> {
        let url = self.url(path);
        let builder = self.client.request(method.clone(), &url);
        self.execute(&method, &url, builder).await
    }

    /// Send a request with a JSON body and parse the response body as `T`.
    pub async fn submit<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let builder = self.client.request(method.clone(), &url).json(body);
        self.execute(&method, &url, builder).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: &Method,
        url: &str,
        builder: RequestBuilder,
    ) -> Result<T> {
        let builder = self.authorize(builder)?;

        debug!(%method, url = url, "Sending request");
        let response = builder.send().await.map_err(|e| {
            warn!(%method, url = url, error = %e, "Request failed before a response");
            ApiError::from_transport(e)
        })?;

        Self::unwrap_body(response).await
    }

    /// Attach the current session token, read fresh for every request.
    fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        match self.session.get()? {
            Some(token) if !token.is_empty() => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
                value.set_sensitive(true);
                Ok(builder.header(header::AUTHORIZATION, value))
            }
            _ => Ok(builder),
        }
    }

    /// Return the parsed body of a 2xx response, or classify the failure.
    async fn unwrap_body<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let url = response.url().to_string();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, %status, "Request returned error status");
            return Err(ApiError::from_status(status, &body).into());
        }

        debug!(url = %url, %status, "Response received");
        let text = response.text().await.map_err(ApiError::from_transport)?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("{} (from {})", e, url)).into()
        })
    }
}
