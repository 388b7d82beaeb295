use clap::Parser;
use tracing::{debug, info};

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod session;

use cli::Cli;
use error::CliError;
use logging::init_logging;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    info!("agentrun starting");
    debug!("CLI arguments: {:?}", cli);

    match cli.run().await {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}
