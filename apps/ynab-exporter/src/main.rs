mod app;
mod cli;
mod refresh;
mod server;
mod telemetry;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use ynab_core::ExporterError;

use crate::app::App;
use crate::cli::Args;
use crate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let args = Args::parse();

    let _guards = init_telemetry(&args)?;

    info!("Starting YNAB exporter");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let result = run_application(args).await;

    if let Err(ref e) = result {
        error!(error_kind = error_kind(e), "Application error: {:#}", e);
    }

    info!("Exporter stopped");

    result
}

async fn run_application(args: Args) -> Result<()> {
    let app = App::build(args).await?;
    app.run().await
}

/// Class of the exporter error behind `err`, or "other" for startup and
/// server failures that carry none.
fn error_kind(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<ExporterError>()
        .map_or("other", ExporterError::kind)
}
