//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with a catch-all proxy handler
//! - Wire up request tracing
//! - Serve on a listener until the shutdown future resolves

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::CacheError;
use crate::http::ProxyHandler;
use crate::observability::ProxyMetrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ProxyHandler>,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    proxy: Arc<ProxyHandler>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// An empty backend list is accepted here; every request then fails
    /// with a 500.
    pub fn new(config: ProxyConfig, metrics: Arc<dyn ProxyMetrics>) -> Result<Self, CacheError> {
        let proxy = Arc::new(ProxyHandler::from_config(&config, metrics)?);

        tracing::info!(
            backends = proxy.pool().len(),
            cache_enabled = proxy.cache().is_some(),
            cache_size = proxy.cache().map(|c| c.capacity()),
            "proxy configured"
        );

        let router = Self::build_router(AppState {
            proxy: proxy.clone(),
        });
        Ok(Self {
            router,
            config,
            proxy,
        })
    }

    /// Build the Axum router. Requests have no deadline of their own; only
    /// the transport's dial timeout bounds a backend call.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` resolves. In-flight requests are allowed to finish.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP proxy server serving");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP proxy server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The request handler shared by all connections.
    pub fn proxy(&self) -> Arc<ProxyHandler> {
        self.proxy.clone()
    }
}

async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.proxy.handle(request).await
}
