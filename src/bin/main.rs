use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use registry_browser::{config::Configuration, start};
use tokio::signal;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Opt {
    /// Extra YAML configuration files, applied in order
    #[clap(short, long)]
    pub config: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup the logger
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = Opt::parse();

    let config = Configuration::config(Configuration::figment(options.config))?;

    let mut tasks = start(config).await?;

    tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(err) = result {
                warn!("Unable to listen for shutdown signal: {err}");
            }
        }
        Some(result) = tasks.join_next() => {
            match result {
                Ok(Err(err)) => error!("Listener failed: {err:?}"),
                Err(err) => error!("Listener task panicked: {err}"),
                Ok(Ok(())) => {}
            }
        }
    }

    tasks.shutdown().await;

    Ok(())
}
