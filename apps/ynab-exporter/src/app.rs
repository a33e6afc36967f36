//! Application wiring

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use ynab_client::YnabClient;
use ynab_core::ExporterConfig;
use ynab_infra::PrometheusSink;

use crate::cli::Args;
use crate::refresh::RefreshController;
use crate::server::{AppState, Server};

/// Main application
pub struct App {
    args: Args,
    sink: Arc<PrometheusSink>,
    controller: RefreshController,
}

impl App {
    /// Load configuration from the environment and build every component.
    ///
    /// Fails before anything is started when required configuration is missing.
    pub async fn build(args: Args) -> Result<Self> {
        let config = ExporterConfig::load().context("Failed to load configuration")?;
        Self::with_config(args, config)
    }

    pub fn with_config(args: Args, config: ExporterConfig) -> Result<Self> {
        info!(
            budget_id = %config.budget_id,
            refresh_time_secs = config.refresh_time_secs,
            api_base_url = %config.api_base_url,
            "Configuration loaded"
        );

        let client = YnabClient::from_config(&config).context("Failed to create API client")?;
        let sink = Arc::new(PrometheusSink::default_config().context("Failed to register metrics")?);

        let controller = RefreshController::new(
            Arc::new(client),
            sink.clone(),
            config.budget_id.clone(),
            config.refresh_interval(),
        );

        Ok(Self {
            args,
            sink,
            controller,
        })
    }

    /// Serve metrics and run the refresh loop until one of them fails or a
    /// shutdown signal arrives.
    pub async fn run(self) -> Result<()> {
        info!(
            port = self.args.port,
            refresh_interval_secs = self.controller.interval().as_secs(),
            "Starting metrics server and refresh loop"
        );
        let server = Server::new(self.args.port, AppState::new(self.sink.clone()));

        tokio::select! {
            result = server.run() => result,
            result = self.controller.run() => result.context("Refresh cycle failed"),
            _ = shutdown_signal() => {
                info!("Shutdown signal received");
                Ok(())
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
