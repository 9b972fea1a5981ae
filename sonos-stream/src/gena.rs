//! GENA requests and the HTTP transport that carries them.
//!
//! A subscriber never talks HTTP directly; it hands [`GenaRequest`]s to a
//! [`GenaTransport`] and reads back a [`GenaResponse`]. Production code uses
//! [`HttpGenaTransport`]; tests substitute a scripted transport.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Result, SubscriptionError};

/// Request timeout used by [`HttpGenaTransport`].
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One GENA request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenaRequest {
    /// Fresh subscription: `CALLBACK`, `NT` and `TIMEOUT`, no `SID`
    Subscribe {
        endpoint: String,
        callback: String,
        timeout_secs: u32,
    },
    /// Renewal of a held subscription: `SID` and `TIMEOUT` only
    Renew {
        endpoint: String,
        sid: String,
        timeout_secs: u32,
    },
    Unsubscribe {
        endpoint: String,
        sid: String,
    },
}

impl GenaRequest {
    /// HTTP method for this request.
    pub fn method(&self) -> &'static str {
        match self {
            GenaRequest::Subscribe { .. } | GenaRequest::Renew { .. } => "SUBSCRIBE",
            GenaRequest::Unsubscribe { .. } => "UNSUBSCRIBE",
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            GenaRequest::Subscribe { endpoint, .. }
            | GenaRequest::Renew { endpoint, .. }
            | GenaRequest::Unsubscribe { endpoint, .. } => endpoint,
        }
    }

    /// GENA headers for this request, excluding `HOST`.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match self {
            GenaRequest::Subscribe {
                callback,
                timeout_secs,
                ..
            } => vec![
                ("CALLBACK", format!("<{}>", callback)),
                ("NT", "upnp:event".to_string()),
                ("TIMEOUT", format!("Second-{}", timeout_secs)),
            ],
            GenaRequest::Renew {
                sid, timeout_secs, ..
            } => vec![
                ("SID", sid.clone()),
                ("TIMEOUT", format!("Second-{}", timeout_secs)),
            ],
            GenaRequest::Unsubscribe { sid, .. } => vec![("SID", sid.clone())],
        }
    }

    /// Value of the named header, if this request carries it.
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers()
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

/// What a device answered to a successful request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenaResponse {
    pub sid: Option<String>,
    /// Granted timeout from a `TIMEOUT: Second-N` header
    pub timeout_secs: Option<u32>,
}

/// Sends GENA requests to devices.
///
/// A non-success status is reported as an error; callers treat every error
/// alike.
#[async_trait]
pub trait GenaTransport: Send + Sync {
    async fn send(&self, request: GenaRequest) -> Result<GenaResponse>;
}

/// [`GenaTransport`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGenaTransport {
    client: reqwest::Client,
}

impl HttpGenaTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                SubscriptionError::NetworkError(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl GenaTransport for HttpGenaTransport {
    async fn send(&self, request: GenaRequest) -> Result<GenaResponse> {
        let method = reqwest::Method::from_bytes(request.method().as_bytes())
            .map_err(|e| SubscriptionError::NetworkError(e.to_string()))?;
        let host = host_header(request.endpoint())?;

        let mut builder = self
            .client
            .request(method, request.endpoint())
            .header("HOST", host);
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }

        let response = builder.send().await.map_err(|e| {
            SubscriptionError::NetworkError(format!("{} request failed: {}", request.method(), e))
        })?;

        if !response.status().is_success() {
            return Err(SubscriptionError::Rejected {
                method: request.method(),
                status: response.status().as_u16(),
            });
        }

        let headers = response.headers();
        let sid = headers
            .get("SID")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let timeout_secs = headers
            .get("TIMEOUT")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_timeout_header);

        if matches!(request, GenaRequest::Subscribe { .. }) && sid.is_none() {
            return Err(SubscriptionError::MissingSid);
        }

        Ok(GenaResponse { sid, timeout_secs })
    }
}

/// `HOST` header value (`host[:port]`) for an endpoint URL.
fn host_header(endpoint: &str) -> Result<String> {
    let url = url::Url::parse(endpoint)
        .map_err(|e| SubscriptionError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| SubscriptionError::InvalidEndpoint(endpoint.to_string()))?;

    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Parse a `Second-N` timeout header value.
pub fn parse_timeout_header(value: &str) -> Option<u32> {
    value.trim().strip_prefix("Second-")?.parse::<u32>().ok()
}
