//! HTTP transport seam.
//!
//! The executor only talks to a [`Transport`]; [`ReqwestTransport`] is the
//! production implementation on top of the blocking reqwest client.

use crate::error::{Error, Result};
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::Method;
use std::time::Duration;
use url::Url;

/// A fully built outbound request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Vec<u8>>,
    /// Per-call timeout; the transport default applies when unset
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A received response, whatever its status
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Failure to complete a round trip
#[derive(Debug, Clone)]
pub struct TransportError {
    pub message: String,
    /// Connect failures and timeouts; nothing reached the application
    pub transient: bool,
    /// Status, when a response head was received before the failure
    pub status: Option<u16>,
    /// Whatever body was received before the failure
    pub body: Option<Vec<u8>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>, transient: bool) -> Self {
        TransportError {
            message: message.into(),
            transient,
            status: None,
            body: None,
        }
    }
}

/// Performs one HTTP round trip
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError>;
}

/// Create the blocking HTTP client used for API requests
pub fn create_http_client(timeout: Duration, connect_timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .pool_max_idle_per_host(50)
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .build()
        .map_err(|e| Error::unknown(None, format!("failed to create HTTP client: {}", e)))
}

/// [`Transport`] backed by `reqwest::blocking`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        Ok(ReqwestTransport {
            client: create_http_client(timeout, connect_timeout)?,
        })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        ReqwestTransport { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().map_err(|e| TransportError {
            message: e.to_string(),
            transient: e.is_connect() || e.is_timeout(),
            status: e.status().map(|s| s.as_u16()),
            body: None,
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| TransportError {
            message: format!("failed to read response body: {}", e),
            transient: false,
            status: Some(status),
            body: None,
        })?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
