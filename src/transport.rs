//! HTTP transport adapter for the metadata providers
//!
//! Wraps a shared `reqwest::Client` behind a single request/response call.
//! Every outbound request carries a baseline of browser-identity headers;
//! caller-supplied headers are appended after the baseline (append, not
//! replace). Bodies are fully buffered into memory as text. Retries are the
//! orchestrator's job, never the transport's.

use crate::utils::BridgeError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

const TIMEOUT: Duration = Duration::from_secs(30);
const TOKEN_EXPIRY: Duration = Duration::from_secs(30 * 60);

const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const MOBILE_UA: &str = "Mozilla/5.0 (Linux; Android 11; Pixel 5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";

/// One outbound request. The body is an explicit field carried from
/// construction; it is never recovered from the URL after the fact.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// One fully buffered response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub message: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Short-lived visitor token attached to platform requests.
///
/// Expiry is checked against a caller-supplied timestamp so tests can drive
/// the clock explicitly.
#[derive(Debug, Clone)]
struct VisitorToken {
    value: String,
    stored_at: SystemTime,
}

/// HTTP transport with browser-identity headers and fixed 30 s timeouts.
pub struct Transport {
    client: Client,
    mobile: bool,
    token: Mutex<Option<VisitorToken>>,
}

impl Transport {
    pub fn new(mobile: bool) -> Result<Self, BridgeError> {
        let client = Client::builder()
            .connect_timeout(TIMEOUT)
            .timeout(TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            mobile,
            token: Mutex::new(None),
        })
    }

    /// Remember a visitor token; attached to requests until it expires.
    pub fn store_token(&self, value: impl Into<String>, now: SystemTime) {
        let mut slot = self.token.lock().expect("token lock poisoned");
        *slot = Some(VisitorToken {
            value: value.into(),
            stored_at: now,
        });
    }

    /// Current token, if one exists and has not outlived its 30 minute expiry.
    pub fn fresh_token(&self, now: SystemTime) -> Option<String> {
        let slot = self.token.lock().expect("token lock poisoned");
        slot.as_ref().and_then(|t| {
            match now.duration_since(t.stored_at) {
                Ok(age) if age < TOKEN_EXPIRY => Some(t.value.clone()),
                // Elapsed past expiry, or clock moved backwards: treat as stale
                _ => None,
            }
        })
    }

    /// Execute a single round trip. Transport failures (refused connection,
    /// timeout, TLS) surface as one `Network` error with the cause attached.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BridgeError> {
        debug!(method = %request.method, url = %request.url, "transport request");

        let mut headers = merge_headers(self.mobile, &request.headers);
        if let Some(token) = self.fresh_token(SystemTime::now()) {
            if let Ok(value) = HeaderValue::from_str(&token) {
                headers.append("x-goog-visitor-id", value);
            }
        }

        // Form-encoded is the default body type; a caller-supplied
        // content-type takes effect because it was appended above.
        let needs_content_type = request.body.is_some() && !headers.contains_key("content-type");

        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(headers);

        if needs_content_type {
            builder = builder.header("content-type", "application/x-www-form-urlencoded");
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        let status = response.status();
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), url = %request.url, "non-success response");
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("").to_string(),
            headers: response_headers,
            body,
        })
    }
}

/// Build the outbound header set: fixed browser baseline first, then the
/// caller's headers appended after it. A caller value for a baseline name is
/// added as a second value for that name, never substituted.
pub fn merge_headers(mobile: bool, caller: &[(String, String)]) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for (name, value) in baseline_headers(mobile) {
        headers.append(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    for (name, value) in caller {
        let name = match HeaderName::from_bytes(name.as_bytes()) {
            Ok(n) => n,
            Err(_) => {
                warn!(header = %name, "skipping invalid header name");
                continue;
            }
        };
        match HeaderValue::from_str(value) {
            Ok(v) => {
                headers.append(name, v);
            }
            Err(_) => warn!(header = %name, "skipping invalid header value"),
        }
    }

    headers
}

fn baseline_headers(mobile: bool) -> Vec<(&'static str, &'static str)> {
    vec![
        ("user-agent", if mobile { MOBILE_UA } else { DESKTOP_UA }),
        (
            "accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        ),
        ("accept-language", "en-US,en;q=0.9"),
        ("accept-encoding", "gzip, deflate, br"),
        ("dnt", "1"),
        ("connection", "keep-alive"),
        ("upgrade-insecure-requests", "1"),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
        ("sec-fetch-user", "?1"),
        ("cache-control", "max-age=0"),
    ]
}
