//! Server Implementation
//!
//! HTTP 服务器启动和管理

use std::time::Duration;

use tokio::net::TcpListener;

use crate::api::build_app;
use crate::core::{Config, Result, ServerState};

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        // Create application state if not provided
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config)?,
        };

        // Start background tasks (timer re-arm, expiry worker, sweep)
        let tasks = state.start_background_tasks();

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Booking server starting on {}", addr);

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        let app = build_app(&state).with_state(state.clone());
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        let grace = Duration::from_millis(self.config.shutdown_timeout_ms);
        if tokio::time::timeout(grace, tasks.shutdown()).await.is_err() {
            tracing::warn!(timeout_ms = self.config.shutdown_timeout_ms, "Background tasks did not stop in time");
        }
        state.expiry().shutdown();

        Ok(())
    }
}
