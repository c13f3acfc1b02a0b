use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use carbonpost::config::{AppConfig, ConfigLoader};
use carbonpost::history::HistoryStore;
use carbonpost::measure::Orchestrator;
use carbonpost::resolver::GreenWebResolver;
use carbonpost::server::{self, AppState};
use carbonpost::transport::BackendRegistry;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the measurement API server
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:3000
        #[arg(long)]
        bind: Option<String>,

        /// Path to a carbonpost.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub async fn serve(bind: Option<String>, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let history = Arc::new(match &config.history.file {
        Some(path) => HistoryStore::load(config.history.capacity, path.clone()),
        None => HistoryStore::new(config.history.capacity),
    });

    let resolver = Arc::new(GreenWebResolver::new(&config.resolver));
    let orchestrator = Arc::new(Orchestrator::new(
        BackendRegistry::new(),
        resolver,
        config.estimator.clone(),
        history.clone(),
    ));

    let addr = bind.unwrap_or_else(|| config.server.bind.clone());
    server::serve(
        &addr,
        AppState {
            orchestrator,
            history,
        },
    )
    .await?;
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => ConfigLoader::load_from_path(path)?,
        None => ConfigLoader::find_and_load().unwrap_or_default(),
    };
    config.validate()?;
    Ok(config)
}
