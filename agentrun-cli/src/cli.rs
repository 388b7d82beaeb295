use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::{commands, error::CliError};

#[derive(Debug, Parser)]
#[command(name = "agentrun")]
#[command(about = "Run a hosted agent and answer its function calls locally")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create an agent, send one message and drive the run to completion
    Run(RunArgs),

    /// Print the local function definitions advertised to the agent
    Functions,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// User message to post to the thread
    #[arg(short, long)]
    pub message: Option<String>,

    /// Model deployment name
    #[arg(long)]
    pub model: Option<String>,

    /// Agent instructions
    #[arg(long)]
    pub instructions: Option<String>,

    /// Agent name
    #[arg(long)]
    pub name: Option<String>,

    /// Delay between run status polls, in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Give up after this many polls
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_polls: Option<u32>,

    /// Use an in-memory service with a scripted run instead of the cloud project
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    pub async fn run(&self) -> Result<(), CliError> {
        match &self.command {
            Some(Commands::Run(args)) => self.handle_run(args).await,
            Some(Commands::Functions) => self.handle_functions(),
            None => {
                println!("agentrun - drive a hosted agent run with local functions");
                println!("Run 'agentrun --help' for usage information.");
                Ok(())
            }
        }
    }

    async fn handle_run(&self, args: &RunArgs) -> Result<(), CliError> {
        commands::run::run_agent(self.config.as_deref(), args).await
    }

    fn handle_functions(&self) -> Result<(), CliError> {
        commands::functions::print_functions()
    }
}
