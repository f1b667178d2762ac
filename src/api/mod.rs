//! API module for BrandVoice
//!
//! Thin HTTP surface to start runs and poll their progress.

use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::pipeline::Pipeline;

pub mod handlers;
pub mod models;
pub mod server;

pub use server::AppState;

/// API server for starting runs and reading progress snapshots
pub struct ApiServer {
    state: AppState,
    port: u16,
}

impl ApiServer {
    pub fn new(pipeline: Arc<Pipeline>, port: u16) -> Self {
        Self {
            state: AppState::new(pipeline),
            port,
        }
    }

    /// Start the API server in the background
    pub fn start_background(self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.start().await })
    }

    /// Start the API server
    pub async fn start(self) -> Result<()> {
        info!("🚀 Starting API server on port {}", self.port);
        server::start_http_server(self.state, self.port).await
    }
}
