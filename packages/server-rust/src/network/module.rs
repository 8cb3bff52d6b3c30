//! Network module with deferred startup lifecycle.
//!
//! `new()` allocates shared state, `start()` binds the TCP listener, and
//! `serve()` binds the registry and accepts connections. Between `start()`
//! and `serve()` the caller knows the bound port but nothing is served yet.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{health_handler, liveness_handler, readiness_handler, AppState};
use super::middleware::{build_http_layers, track_in_flight};
use super::shutdown::ShutdownController;
use crate::registry::{Registry, RegistryError};

/// Routes served by the module itself. Registrations may not claim them.
pub const HEALTH_ROUTES: [&str; 3] = ["/health", "/health/live", "/health/ready"];

/// How long `serve()` waits for in-flight requests after the shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Manages the HTTP server lifecycle.
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    /// Returns a shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the full router: registry routes, health routes, and
    /// the middleware stack.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if the registry fails to bind or claims
    /// one of the [`HEALTH_ROUTES`].
    pub fn build_router(&self, registry: Registry) -> Result<Router, RegistryError> {
        let claimed = registry.routes();
        if let Some(route) = HEALTH_ROUTES.iter().find(|r| claimed.iter().any(|c| c == *r)) {
            return Err(RegistryError::ReservedRoute {
                route: (*route).to_string(),
            });
        }

        let state = AppState {
            shutdown: Arc::clone(&self.shutdown),
            start_time: Instant::now(),
            stores: registry.store_names().into_iter().map(str::to_string).collect(),
            opers: registry.oper_paths().into_iter().map(str::to_string).collect(),
        };

        let router = Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .merge(registry.into_router::<AppState>()?)
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                track_in_flight,
            ))
            .layer(build_http_layers(&self.config))
            .with_state(state);
        Ok(router)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the bound port, which differs from the configured one when
    /// port 0 is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Binds `registry` and serves requests until `shutdown` resolves.
    ///
    /// After the signal the health state moves to Draining, open
    /// connections finish, and the state becomes Stopped once in-flight
    /// requests reach zero (or the drain timeout expires).
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called, the registry fails to
    /// bind, or the server hits a fatal I/O error.
    pub async fn serve(
        self,
        registry: Registry,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let router = self.build_router(registry)?;
        let listener = self
            .listener
            .ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;
        let shutdown_ctrl = self.shutdown;

        let signal_ctrl = Arc::clone(&shutdown_ctrl);
        let signal = async move {
            shutdown.await;
            info!("Shutdown signal received, draining");
            signal_ctrl.trigger_shutdown();
        };

        shutdown_ctrl.set_ready();
        info!("Serving HTTP on {}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(signal)
            .await?;

        if shutdown_ctrl.wait_for_drain(DRAIN_TIMEOUT).await {
            info!("All requests drained");
        } else {
            warn!("Drain timeout expired with in-flight requests remaining");
        }
        Ok(())
    }
}
