//! Request executor shared by every endpoint.
//!
//! An endpoint is a descriptor (method, URL, expected statuses, accepted
//! media); the executor adds the standard headers and the bearer credential,
//! performs the call through the transport with the retry policy, and turns
//! the response into either a decoded body or a typed [`Error`].

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::response::ErrorBody;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::transport::{HttpRequest, Transport, TransportError};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const MAX_LOGGED_BODY: usize = 512;

/// What the endpoint answers with on success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    /// Codec-encoded body
    Json,
    /// Binary payload (images, PDFs)
    Any,
}

/// Descriptor of a single call
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub method: Method,
    pub url: Url,
    /// Statuses treated as success
    pub expect: &'static [u16],
    pub accept: Accept,
    pub timeout: Option<Duration>,
}

impl Endpoint {
    pub fn new(method: Method, url: Url, expect: &'static [u16]) -> Self {
        Endpoint {
            method,
            url,
            expect,
            accept: Accept::Json,
            timeout: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url, &[200])
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url, &[200])
    }

    pub fn put(url: Url) -> Self {
        Self::new(Method::PUT, url, &[200])
    }

    pub fn delete(url: Url) -> Self {
        Self::new(Method::DELETE, url, &[204])
    }

    pub fn expect(mut self, statuses: &'static [u16]) -> Self {
        self.expect = statuses;
        self
    }

    pub fn accept_any(mut self) -> Self {
        self.accept = Accept::Any;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn is_idempotent(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }
}

/// Encode a typed request body
pub fn to_body<B: Serialize>(body: &B) -> Result<Value> {
    serde_json::to_value(body).map_err(Error::Encode)
}

/// Executes endpoint descriptors
pub struct Executor {
    transport: Box<dyn Transport>,
    codec: Box<dyn Codec>,
    retry: RetryPolicy,
}

impl Executor {
    pub fn new(transport: Box<dyn Transport>, codec: Box<dyn Codec>, retry: RetryPolicy) -> Self {
        Executor {
            transport,
            codec,
            retry,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Perform the call and decode the success body into `T`.
    ///
    /// A success status with a body that does not decode into `T` yields
    /// [`Error::Unmarshal`].
    pub fn call<T>(
        &self,
        endpoint: &Endpoint,
        body: Option<&Value>,
        credential: Option<&str>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let bytes = self.send(endpoint, body, credential)?;
        let value = self.codec.decode(&bytes).map_err(Error::Unmarshal)?;
        serde_json::from_value(value).map_err(Error::Unmarshal)
    }

    /// Perform the call and discard the success body
    pub fn call_empty(
        &self,
        endpoint: &Endpoint,
        body: Option<&Value>,
        credential: Option<&str>,
    ) -> Result<()> {
        self.send(endpoint, body, credential).map(|_| ())
    }

    /// Perform the call and return the raw success body
    pub fn call_bytes(&self, endpoint: &Endpoint, credential: Option<&str>) -> Result<Vec<u8>> {
        self.send(endpoint, None, credential)
    }

    /// Perform the call, returning the body of a successful response
    pub fn send(
        &self,
        endpoint: &Endpoint,
        body: Option<&Value>,
        credential: Option<&str>,
    ) -> Result<Vec<u8>> {
        let request = self.build_request(endpoint, body, credential)?;
        let method = &request.method;
        let url = &request.url;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let start = std::time::Instant::now();
            debug!(attempt, %method, %url, "sending request");

            match self.transport.send(&request) {
                Ok(response) => {
                    debug!(
                        attempt,
                        %method,
                        %url,
                        status = response.status,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "received response"
                    );
                    if endpoint.expect.contains(&response.status) {
                        return Ok(response.body);
                    }
                    return Err(error_from_body(Some(response.status), &response.body));
                }
                Err(err) => {
                    match self.retry.decide(attempt, endpoint.is_idempotent(), err.transient) {
                        RetryDecision::RetryAfter(delay) => {
                            warn!(
                                attempt,
                                %method,
                                %url,
                                error = %err.message,
                                delay_ms = delay.as_millis() as u64,
                                "request failed, retrying"
                            );
                            std::thread::sleep(delay);
                        }
                        RetryDecision::DoNotRetry => {
                            debug!(attempt, %method, %url, error = %err.message, "request failed");
                            return Err(error_from_transport(err));
                        }
                    }
                }
            }
        }
    }

    fn build_request(
        &self,
        endpoint: &Endpoint,
        body: Option<&Value>,
        credential: Option<&str>,
    ) -> Result<HttpRequest> {
        let media_type = self.codec.media_type().to_string();
        let accept = match endpoint.accept {
            Accept::Json => media_type.clone(),
            Accept::Any => "*/*".to_string(),
        };

        let mut headers = vec![("Content-Type", media_type), ("Accept", accept)];
        if let Some(token) = credential.filter(|t| !t.is_empty()) {
            headers.push(("Authorization", format!("Bearer {}", token)));
        }

        let body = match body {
            Some(value) => Some(self.codec.encode(value).map_err(Error::Encode)?),
            None => None,
        };

        Ok(HttpRequest {
            method: endpoint.method.clone(),
            url: endpoint.url.clone(),
            headers,
            body,
            timeout: endpoint.timeout,
        })
    }
}

/// Map an unsuccessful response body to a typed error.
///
/// Bodies that are not a recognizable error payload become
/// [`Error::Unknown`] rather than a decode failure.
pub(crate) fn error_from_body(status: Option<u16>, body: &[u8]) -> Error {
    match ErrorBody::decode(body) {
        Some(detail) if !detail.code.is_empty() => {
            Error::api(status, detail.code, detail.summary, detail.detail)
        }
        _ => {
            let text = String::from_utf8_lossy(body);
            let snippet: String = text.chars().take(MAX_LOGGED_BODY).collect();
            let reason = match status {
                Some(status) => format!("unexpected HTTP status {}: {}", status, snippet),
                None => format!("undecodable error body: {}", snippet),
            };
            Error::unknown(status, reason)
        }
    }
}

fn error_from_transport(err: TransportError) -> Error {
    match err.body {
        Some(ref body) if !body.is_empty() => error_from_body(err.status, body),
        _ => Error::unknown(err.status, err.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::error::ErrorKind;
    use crate::retry::RetryStrategy;
    use crate::testing::ScriptedTransport;
    use serde::Deserialize;
    use serde_json::json;

    fn executor(transport: &ScriptedTransport, retry: RetryPolicy) -> Executor {
        Executor::new(Box::new(transport.clone()), Box::new(JsonCodec), retry)
    }

    fn fast_retry(strategy: RetryStrategy) -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            max_jitter: Duration::ZERO,
            strategy,
        }
    }

    fn url() -> Url {
        Url::parse("https://example.com/api/3.12/sites/S1/users/U1").unwrap()
    }

    #[derive(Debug, Deserialize)]
    struct UserBody {
        user: Named,
    }

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    #[test]
    fn test_headers_and_success_decode() {
        let transport = ScriptedTransport::new();
        transport.reply_json(200, json!({"user": {"name": "alice"}}));

        let body: UserBody = executor(&transport, RetryPolicy::never())
            .call(&Endpoint::get(url()), None, Some("tok"))
            .unwrap();
        assert_eq!(body.user.name, "alice");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header("Content-Type"), Some("application/json"));
        assert_eq!(requests[0].header("Accept"), Some("application/json"));
        assert_eq!(requests[0].header("Authorization"), Some("Bearer tok"));
    }

    #[test]
    fn test_no_credential_no_authorization_header() {
        let transport = ScriptedTransport::new();
        transport.reply(204, "");
        executor(&transport, RetryPolicy::never())
            .call_empty(&Endpoint::delete(url()), None, None)
            .unwrap();
        assert_eq!(transport.requests()[0].header("Authorization"), None);
    }

    #[test]
    fn test_binary_endpoint_accepts_anything() {
        let transport = ScriptedTransport::new();
        transport.reply(200, vec![0x89, b'P', b'N', b'G']);
        let bytes = executor(&transport, RetryPolicy::never())
            .call_bytes(&Endpoint::get(url()).accept_any(), Some("tok"))
            .unwrap();
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
        assert_eq!(transport.requests()[0].header("Accept"), Some("*/*"));
    }

    #[test]
    fn test_server_error_body_is_mapped() {
        let transport = ScriptedTransport::new();
        transport.reply_json(
            404,
            json!({"error": {"summary": "Not Found", "detail": "no such user", "code": "404002"}}),
        );
        let err = executor(&transport, RetryPolicy::never())
            .call::<UserBody>(&Endpoint::get(url()), None, Some("tok"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UserNotFound);
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn test_unknown_code_is_unknown_kind() {
        let transport = ScriptedTransport::new();
        transport.reply_json(400, json!({"error": {"code": "999999"}}));
        let err = executor(&transport, RetryPolicy::never())
            .call_empty(&Endpoint::post(url()), None, None)
            .unwrap_err();
        assert!(matches!(err, Error::Api { kind: ErrorKind::Unknown, .. }));
    }

    #[test]
    fn test_malformed_error_body_is_unknown() {
        let transport = ScriptedTransport::new();
        transport.reply(502, "<html>bad gateway</html>");
        let err = executor(&transport, RetryPolicy::never())
            .call_empty(&Endpoint::get(url()), None, None)
            .unwrap_err();
        assert!(matches!(err, Error::Unknown { status: Some(502), .. }));
    }

    #[test]
    fn test_malformed_success_body_is_unmarshal_error() {
        let transport = ScriptedTransport::new();
        transport.reply(200, "{\"unexpected\": true}");
        transport.reply(200, "not json");
        let executor = executor(&transport, RetryPolicy::never());

        let err = executor.call::<UserBody>(&Endpoint::get(url()), None, None).unwrap_err();
        assert!(matches!(err, Error::Unmarshal(_)));
        let err = executor.call::<UserBody>(&Endpoint::get(url()), None, None).unwrap_err();
        assert!(matches!(err, Error::Unmarshal(_)));
    }

    #[test]
    fn test_transport_failure_with_body_is_mapped() {
        let transport = ScriptedTransport::new();
        transport.fail(TransportError {
            message: "connection reset".to_string(),
            transient: false,
            status: Some(401),
            body: Some(br#"{"error":{"code":"401002"}}"#.to_vec()),
        });
        let err = executor(&transport, RetryPolicy::never())
            .call_empty(&Endpoint::get(url()), None, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCredential);
    }

    #[test]
    fn test_transport_failure_without_body_is_unknown() {
        let transport = ScriptedTransport::new();
        transport.fail(TransportError::new("connection refused", false));
        let err = executor(&transport, RetryPolicy::never())
            .call_empty(&Endpoint::get(url()), None, None)
            .unwrap_err();
        match err {
            Error::Unknown { status, reason } => {
                assert_eq!(status, None);
                assert!(reason.contains("connection refused"));
            }
            other => panic!("expected unknown error, got {:?}", other),
        }
    }

    #[test]
    fn test_transient_failures_are_retried_for_get() {
        let transport = ScriptedTransport::new();
        transport
            .fail(TransportError::new("timed out", true))
            .fail(TransportError::new("connect error", true))
            .reply_json(200, json!({"user": {"name": "bob"}}));
        let body: UserBody = executor(&transport, fast_retry(RetryStrategy::IdempotentOnly))
            .call(&Endpoint::get(url()), None, None)
            .unwrap();
        assert_eq!(body.user.name, "bob");
        assert_eq!(transport.request_count(), 3);
    }

    #[test]
    fn test_retries_are_bounded() {
        let transport = ScriptedTransport::new();
        for _ in 0..5 {
            transport.fail(TransportError::new("timed out", true));
        }
        let err = executor(&transport, fast_retry(RetryStrategy::IdempotentOnly))
            .call_empty(&Endpoint::get(url()), None, None)
            .unwrap_err();
        assert!(matches!(err, Error::Unknown { .. }));
        assert_eq!(transport.request_count(), 3);
    }

    #[test]
    fn test_post_is_not_retried_without_opt_in() {
        let transport = ScriptedTransport::new();
        transport
            .fail(TransportError::new("timed out", true))
            .reply(200, "{}");
        let result = executor(&transport, fast_retry(RetryStrategy::IdempotentOnly))
            .call_empty(&Endpoint::post(url()), None, None);
        assert!(result.is_err());
        assert_eq!(transport.request_count(), 1);

        let transport = ScriptedTransport::new();
        transport
            .fail(TransportError::new("timed out", true))
            .reply(200, "{}");
        executor(&transport, fast_retry(RetryStrategy::Always))
            .call_empty(&Endpoint::post(url()), None, None)
            .unwrap();
        assert_eq!(transport.request_count(), 2);
    }

    #[test]
    fn test_http_errors_are_never_retried() {
        let transport = ScriptedTransport::new();
        transport
            .reply_json(429, json!({"error": {"code": "429000"}}))
            .reply(200, "{}");
        let err = executor(&transport, fast_retry(RetryStrategy::Always))
            .call_empty(&Endpoint::get(url()), None, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooManyRequests);
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn test_request_body_and_timeout_are_forwarded() {
        let transport = ScriptedTransport::new();
        transport.reply(200, "{}");
        let endpoint = Endpoint::post(url()).timeout(Some(Duration::from_secs(7)));
        executor(&transport, RetryPolicy::never())
            .call_empty(&endpoint, Some(&json!({"site": {"contentUrl": "x"}})), None)
            .unwrap();
        let request = &transport.requests()[0];
        assert_eq!(request.body.as_deref(), Some(&br#"{"site":{"contentUrl":"x"}}"#[..]));
        assert_eq!(request.timeout, Some(Duration::from_secs(7)));
    }
}
