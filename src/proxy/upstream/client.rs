// Upstream client implementation
// One buffered outbound exchange per inbound request, no retries

use std::error::Error as StdError;

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use futures::future::BoxFuture;
use reqwest::Client;

use crate::error::AppResult;
use crate::proxy::config::ProxyConfig;
use crate::proxy::error::ProxyError;
use crate::proxy::target::TargetUrl;

/// Methods the proxy relays. Anything else is refused before an outbound call.
pub const SUPPORTED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

/// Fully built outbound request. Constructed once, never mutated or retried.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: TargetUrl,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl OutboundRequest {
    pub fn new(
        method: Method,
        url: TargetUrl,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Self, ProxyError> {
        if !SUPPORTED_METHODS.contains(&method) {
            return Err(ProxyError::MethodNotSupported);
        }
        Ok(Self {
            method,
            url,
            headers,
            body,
        })
    }
}

/// What came back from the target. Downstream 4xx/5xx are still `Response`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundOutcome {
    Response { status: StatusCode, body: Bytes },
    Failure { message: String },
}

/// Issues outbound requests. Shared by every in-flight request, so it must be
/// safe to call concurrently.
pub trait Transport: Send + Sync {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, OutboundOutcome>;
}

pub struct UpstreamClient {
    http_client: Client,
}

impl UpstreamClient {
    pub fn new(config: &ProxyConfig) -> AppResult<Self> {
        let http_client = crate::utils::http::create_client_with_proxy(
            config.request_timeout,
            Some(&config.upstream_proxy),
        )?;
        Ok(Self { http_client })
    }

    async fn execute(&self, request: OutboundRequest) -> OutboundOutcome {
        let OutboundRequest {
            method,
            url,
            headers,
            body,
        } = request;

        tracing::debug!("Forwarding {} {}", method, url);

        // the client re-parses the decoded text itself
        let response = match self
            .http_client
            .request(method, url.as_str())
            .headers(headers)
            .body(body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return OutboundOutcome::Failure {
                    message: error_chain(&e),
                }
            }
        };

        let status = response.status();
        match response.bytes().await {
            Ok(body) => OutboundOutcome::Response { status, body },
            Err(e) => OutboundOutcome::Failure {
                message: error_chain(&e),
            },
        }
    }
}

impl Transport for UpstreamClient {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, OutboundOutcome> {
        Box::pin(self.execute(request))
    }
}

/// Flatten an error and its sources into one line, e.g.
/// `error sending request for url (...): client error (Connect): tcp connect error: Connection refused`.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
