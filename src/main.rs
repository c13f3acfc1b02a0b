mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    carbonpost::logger::init_logger();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Serve { bind, config }) => cli::serve(bind, config).await,
        // Bare invocation serves with discovered or default config.
        None => cli::serve(None, None).await,
    }
}
