use clap::Parser;
use std::sync::Arc;

use sheetboard::app;
use sheetboard::backend::{MemoryBackend, SpreadsheetBackend};
use sheetboard::config::{Args, BackendSource, DashboardConfig};
use sheetboard::sheets_api::SheetsClient;

/// Main entry point for the dashboard server
///
/// Reads configuration from the command line, the environment and an optional
/// `.env` file, opens the spreadsheet connection once and serves the dashboard.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DashboardConfig::from_args(Args::parse())?;

    let backend: Arc<dyn SpreadsheetBackend> = match &config.source {
        BackendSource::Demo => {
            log::warn!("Serving in-memory demo data; feedback is not persisted");
            Arc::new(MemoryBackend::demo(&config.tables))
        }
        BackendSource::Sheets {
            api_base,
            spreadsheet_id,
            access_token,
        } => {
            log::info!("Using spreadsheet {}", spreadsheet_id);
            Arc::new(SheetsClient::with_base_url(api_base, spreadsheet_id, access_token)?)
        }
    };

    log::info!("Tracking {} tables", config.tables.len());
    app::run(config, backend).await
}
