//! # article-api
//!
//! Loads the JSON config, initializes logging, migrates the database, and
//! serves the article routes until Ctrl-C.

use std::error::Error;
use std::path::PathBuf;

use article_api::state::AppState;
use article_core::{init_logging, AppConfig};
use clap::Parser;
use log::{error, info};

const DEFAULT_CONFIG_PATH: &str = "./config/config.json";

#[derive(Debug, Parser)]
#[command(name = "article-api", version, about = "Article CRUD HTTP service")]
struct Cli {
    /// Path to the JSON config file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = AppConfig::from_file(&cli.config)?;
    init_logging(&config.log.level, config.log.dir.as_deref())?;
    info!(
        "event=config_load module=api status=ok path={} db={:?}",
        cli.config.display(),
        config.db
    );

    let state = AppState::from_config(&config)?;
    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("event=server_start module=api status=ok address={address}");

    axum::serve(listener, article_api::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=api status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("event=server_stop module=api status=error error={err}");
    }
}
