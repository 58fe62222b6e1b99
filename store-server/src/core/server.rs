//! Server Implementation
//!
//! HTTP 服务器启动和管理

use std::time::Duration;

use crate::core::{Config, Result, ServerError, ServerState};
use crate::services::HttpsService;

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

    /// Create server with existing state (for sharing with oneshot)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        let https = HttpsService::new(self.config.clone(), state);

        tracing::info!(
            environment = %self.config.environment,
            port = self.config.http_port,
            "Store server starting"
        );

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        https
            .start_server(
                shutdown,
                Duration::from_millis(self.config.shutdown_timeout_ms),
            )
            .await
            .map_err(ServerError::Internal)?;

        Ok(())
    }
}
