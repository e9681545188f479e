use crate::error::{AppError, AppResult};
use crate::proxy::{Allowlist, ProxyConfig};
use crate::proxy::upstream::Transport;
use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Axum application state
///
/// Both members are built once at startup; requests only read them.
#[derive(Clone)]
pub struct AppState {
    pub allowlist: Arc<Allowlist>,
    pub transport: Arc<dyn Transport>,
}

impl AppState {
    pub fn new(allowlist: Allowlist, transport: Arc<dyn Transport>) -> Self {
        Self {
            allowlist: Arc::new(allowlist),
            transport,
        }
    }
}

/// Build the router: the forwarding route, health check, and the layers around them.
pub fn build_router(state: AppState, config: &ProxyConfig) -> AppResult<Router> {
    use crate::proxy::handlers;

    let app = Router::new()
        .route("/proxy/:targeturl", any(handlers::forward::handle_proxy))
        .route("/healthz", get(health_check_handler))
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(
            crate::proxy::middleware::request_logger,
        ))
        .layer(crate::proxy::middleware::cors_layer(&config.allowed_origin)?)
        .with_state(state);

    Ok(app)
}

/// Axum server instance
pub struct AxumServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: SocketAddr,
}

impl AxumServer {
    /// Start Axum server
    pub async fn start(
        config: &ProxyConfig,
        allowlist: Allowlist,
        transport: Arc<dyn Transport>,
    ) -> AppResult<(Self, tokio::task::JoinHandle<()>)> {
        tracing::info!(
            "Allowlist loaded with {} host(s): {}",
            allowlist.len(),
            allowlist.hosts().join(",")
        );
        if allowlist.is_empty() {
            tracing::warn!("Allowlist is empty, every target will be rejected");
        }

        let app = build_router(AppState::new(allowlist, transport), config)?;

        // Bind address
        let addr = format!("{}:{}", config.get_bind_address(), config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Server(format!("Failed to bind address {}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Forwarding proxy started at http://{}", local_addr);

        // Create shutdown channel
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let server_instance = Self {
            shutdown_tx: Some(shutdown_tx),
            local_addr,
        };

        // Start server in new task
        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let service = TowerToHyperService::new(app.clone());

                                tokio::task::spawn(async move {
                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("Connection handling finished or errored: {:?}", err);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {:?}", e);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("Forwarding proxy stopped listening");
                        break;
                    }
                }
            }
        });

        Ok((server_instance, handle))
    }

    /// Address actually bound (useful when the configured port is 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop server
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Health check handler
async fn health_check_handler() -> Response {
    Json(serde_json::json!({
        "status": "ok"
    }))
    .into_response()
}
