// Forward handler: /proxy/:targeturl
use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{error, info};

use crate::proxy::error::ProxyError;
use crate::proxy::headers::sanitize_headers;
use crate::proxy::server::AppState;
use crate::proxy::target::decode_target;
use crate::proxy::upstream::{OutboundOutcome, OutboundRequest};

/// Relay one request to the target encoded in the path.
/// Every failure is turned into a JSON error response, never propagated.
pub async fn handle_proxy(
    State(state): State<AppState>,
    method: Method,
    target: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Ok(Path(target)) = target else {
        return ProxyError::InvalidUrl.into_response();
    };

    match forward(&state, method, &target, &headers, body).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

/// Decode -> authorize -> validate -> sanitize -> method check -> send -> map.
pub async fn forward(
    state: &AppState,
    method: Method,
    target: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let url = state.allowlist.authorize(decode_target(target))?;
    let request = OutboundRequest::new(method, url, sanitize_headers(headers), body)?;

    info!("Proxying {} {}", request.method, request.url);

    match state.transport.send(request).await {
        OutboundOutcome::Response { status, body } => {
            // Status and body only: no content-type or other headers are relayed
            let mut response = Response::new(Body::from(body));
            *response.status_mut() = status;
            Ok(response)
        }
        OutboundOutcome::Failure { message } => {
            error!("Outbound request failed: {}", message);
            Err(ProxyError::Transport(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::server::build_router;
    use crate::proxy::upstream::Transport;
    use crate::proxy::{Allowlist, ProxyConfig};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use futures::future::BoxFuture;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    const DATA_TARGET: &str = "aHR0cHM6Ly9hcGkuZXhhbXBsZS5jb20vdjEvZGF0YQ==";

    /// Records what would have been sent and answers with a fixed outcome.
    struct RecordingTransport {
        outcome: OutboundOutcome,
        seen: Mutex<Vec<OutboundRequest>>,
    }

    impl RecordingTransport {
        fn new(outcome: OutboundOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn ok(status: u16, body: &'static str) -> Arc<Self> {
            Self::new(OutboundOutcome::Response {
                status: StatusCode::from_u16(status).unwrap(),
                body: Bytes::from_static(body.as_bytes()),
            })
        }

        fn calls(&self) -> Vec<OutboundRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for RecordingTransport {
        fn send(&self, request: OutboundRequest) -> BoxFuture<'_, OutboundOutcome> {
            self.seen.lock().unwrap().push(request);
            let outcome = self.outcome.clone();
            Box::pin(async move { outcome })
        }
    }

    fn app(hosts: &str, transport: Arc<RecordingTransport>) -> Router {
        let state = AppState::new(Allowlist::parse(hosts), transport);
        build_router(state, &ProxyConfig::default()).unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn read(response: Response) -> (StatusCode, Bytes) {
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes)
    }

    async fn read_json(response: Response) -> (StatusCode, Value) {
        let (status, bytes) = read(response).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_allowlisted_get_is_relayed() {
        let transport = RecordingTransport::ok(200, r#"{"ok":true}"#);
        let response = app("api.example.com", transport.clone())
            .oneshot(request("GET", &format!("/proxy/{}", DATA_TARGET)))
            .await
            .unwrap();

        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], br#"{"ok":true}"#);

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, Method::GET);
        assert_eq!(calls[0].url.as_str(), "https://api.example.com/v1/data");
        assert!(calls[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_downstream_error_status_is_relayed() {
        let transport = RecordingTransport::ok(404, "no such thing");
        let response = app("api.example.com", transport)
            .oneshot(request("DELETE", &format!("/proxy/{}", DATA_TARGET)))
            .await
            .unwrap();

        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(&body[..], b"no such thing");
    }

    #[tokio::test]
    async fn test_unlisted_host_is_never_contacted() {
        let transport = RecordingTransport::ok(200, "");
        let response = app("other.example.com", transport.clone())
            .oneshot(request("GET", &format!("/proxy/{}", DATA_TARGET)))
            .await
            .unwrap();

        let (status, body) = read_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "error": "hostname not whitelisted in ALLOWED_DOMAINS environment variable" })
        );
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_base64() {
        let transport = RecordingTransport::ok(200, "");
        let response = app("api.example.com", transport.clone())
            .oneshot(request("GET", "/proxy/not-valid-base64!!"))
            .await
            .unwrap();

        let (status, body) = read_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "invalid url" }));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_method_makes_no_call() {
        let transport = RecordingTransport::ok(200, "");
        let response = app("api.example.com", transport.clone())
            .oneshot(request("PATCH", &format!("/proxy/{}", DATA_TARGET)))
            .await
            .unwrap();

        let (status, body) = read_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "invalid method" }));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unlisted_host_beats_unsupported_method() {
        let transport = RecordingTransport::ok(200, "");
        let response = app("other.example.com", transport)
            .oneshot(request("PATCH", &format!("/proxy/{}", DATA_TARGET)))
            .await
            .unwrap();

        let (_, body) = read_json(response).await;
        assert_eq!(
            body["error"],
            "hostname not whitelisted in ALLOWED_DOMAINS environment variable"
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_500() {
        let transport = RecordingTransport::new(OutboundOutcome::Failure {
            message: "tcp connect error: Connection refused".to_string(),
        });
        let response = app("api.example.com", transport)
            .oneshot(request("POST", &format!("/proxy/{}", DATA_TARGET)))
            .await
            .unwrap();

        let (status, body) = read_json(response).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "tcp connect error: Connection refused" }));
    }

    #[tokio::test]
    async fn test_headers_and_body_forwarded() {
        let transport = RecordingTransport::ok(201, "created");
        let inbound = Request::builder()
            .method("PUT")
            .uri(format!("/proxy/{}", DATA_TARGET))
            .header(header::HOST, "localhost:3000")
            .header(header::ORIGIN, "https://pro.easyeda.com")
            .header(header::REFERER, "https://pro.easyeda.com/editor")
            .header(header::USER_AGENT, "Mozilla/5.0")
            .header(header::AUTHORIZATION, "Basic c2VjcmV0")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-extra", "1")
            .header("x-extra", "2")
            .body(Body::from(r#"{"time":1}"#))
            .unwrap();

        let response = app("api.example.com", transport.clone())
            .oneshot(inbound)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let calls = transport.calls();
        let sent = &calls[0];
        assert_eq!(sent.method, Method::PUT);
        assert_eq!(&sent.body[..], br#"{"time":1}"#);
        for name in [header::HOST, header::ORIGIN, header::REFERER, header::USER_AGENT] {
            assert!(!sent.headers.contains_key(&name), "{} leaked", name);
        }
        assert_eq!(sent.headers.get(header::AUTHORIZATION).unwrap(), "Basic c2VjcmV0");
        assert_eq!(sent.headers.get(header::CONTENT_TYPE).unwrap(), "application/json");
        let extra: Vec<_> = sent.headers.get_all("x-extra").iter().collect();
        assert_eq!(extra, ["1", "2"]);
    }

    #[tokio::test]
    async fn test_get_body_is_forwarded() {
        let transport = RecordingTransport::ok(200, "");
        let inbound = Request::builder()
            .method("GET")
            .uri(format!("/proxy/{}", DATA_TARGET))
            .body(Body::from("payload"))
            .unwrap();
        app("api.example.com", transport.clone())
            .oneshot(inbound)
            .await
            .unwrap();

        assert_eq!(&transport.calls()[0].body[..], b"payload");
    }

    #[tokio::test]
    async fn test_repeated_requests_are_identical() {
        let transport = RecordingTransport::ok(200, r#"{"ok":true}"#);
        let router = app("api.example.com", transport.clone());

        let mut seen = Vec::new();
        for _ in 0..3 {
            let response = router
                .clone()
                .oneshot(request("GET", &format!("/proxy/{}", DATA_TARGET)))
                .await
                .unwrap();
            seen.push(read(response).await);
        }
        assert!(seen.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_percent_encoded_slash_in_target() {
        // base64 of "https://api.example.com/?x=???" ends in '/'
        let transport = RecordingTransport::ok(200, "");
        let response = app("api.example.com", transport.clone())
            .oneshot(request(
                "GET",
                "/proxy/aHR0cHM6Ly9hcGkuZXhhbXBsZS5jb20vP3g9Pz8%2F",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            transport.calls()[0].url.as_str(),
            "https://api.example.com/?x=???"
        );
    }

    #[tokio::test]
    async fn test_plus_in_target_is_literal() {
        // base64 of "https://api.example.com/data?q=?>" ends in '+'
        let transport = RecordingTransport::ok(200, "");
        app("api.example.com", transport.clone())
            .oneshot(request(
                "GET",
                "/proxy/aHR0cHM6Ly9hcGkuZXhhbXBsZS5jb20vZGF0YT9xPT8+",
            ))
            .await
            .unwrap();
        // forwarded as decoded, not re-serialized with `>` escaped
        assert_eq!(
            transport.calls()[0].url.as_str(),
            "https://api.example.com/data?q=?>"
        );
    }

    #[tokio::test]
    async fn test_cors_preflight_is_answered_locally() {
        let transport = RecordingTransport::ok(200, "");
        let preflight = Request::builder()
            .method("OPTIONS")
            .uri(format!("/proxy/{}", DATA_TARGET))
            .header(header::ORIGIN, "https://pro.easyeda.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = app("api.example.com", transport.clone())
            .oneshot(preflight)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "https://pro.easyeda.com"
        );
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app("", RecordingTransport::ok(200, ""))
            .oneshot(request("GET", "/healthz"))
            .await
            .unwrap();
        let (status, body) = read_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }
}
