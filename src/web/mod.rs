//! Web layer
//!
//! HTTP interface of the broker: one token issuance endpoint plus a health
//! check. Handlers stay thin and delegate to the service layer; responses
//! use the standardized formats in [`responses`].

use anyhow::Result;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::{config::Config, services::SessionTokenService};

pub mod handlers;
pub mod middleware;
pub mod responses;

pub use responses::{ErrorBody, FieldError, HealthResponse, KsRequest, KsResponse};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session_tokens: Arc<SessionTokenService>,
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: Config, session_tokens: Arc<SessionTokenService>) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
        let app = Self::router(AppState {
            config,
            session_tokens,
        });
        Ok(Self { app, addr })
    }

    /// Create the router with all routes and middleware
    pub fn router(state: AppState) -> Router {
        let cors = Self::cors_layer(&state.config.web.cors_allowed_origins);
        Router::new()
            .route("/api/ks", post(handlers::session::generate_ks))
            .route("/health", get(handlers::health::health_check))
            // Middleware (applied in reverse order)
            .layer(cors)
            .layer(axum::middleware::from_fn(
                middleware::security_headers_middleware,
            ))
            .layer(axum::middleware::from_fn(
                middleware::request_logging_middleware,
            ))
            .with_state(state)
    }

    fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
        if allowed_origins.iter().any(|origin| origin == "*") {
            return CorsLayer::permissive();
        }
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the web server and run until SIGINT/SIGTERM
    pub async fn serve(self) -> Result<()> {
        self.serve_with_cancellation(None).await
    }

    /// Serve with optional external cancellation
    pub async fn serve_with_cancellation(
        self,
        cancellation_token: Option<tokio_util::sync::CancellationToken>,
    ) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;

        let shutdown_signal = async move {
            if let Some(token) = &cancellation_token {
                token.cancelled().await;
                tracing::info!("Web server received cancellation signal, shutting down gracefully");
            } else {
                #[cfg(unix)]
                {
                    use tokio::signal::unix::{SignalKind, signal};
                    let mut sigterm = signal(SignalKind::terminate())
                        .expect("failed to install SIGTERM handler");
                    let mut sigint =
                        signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

                    tokio::select! {
                        _ = sigterm.recv() => {
                            tracing::info!("Received SIGTERM, shutting down gracefully");
                        }
                        _ = sigint.recv() => {
                            tracing::info!("Received SIGINT (Ctrl+C), shutting down gracefully");
                        }
                    }
                }

                #[cfg(not(unix))]
                {
                    use tokio::signal;
                    signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
                    tracing::info!("Received Ctrl+C, shutting down gracefully");
                }
            }
        };

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal)
            .await?;
        Ok(())
    }
}
