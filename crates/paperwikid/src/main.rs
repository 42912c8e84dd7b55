//! Command line interface and HTTP endpoint for the paperwiki indexer.
//!
//! # Usage
//!
//! ```bash
//! # Write a default configuration file
//! paperwiki init
//!
//! # Index a paper, trying Gemini first
//! paperwiki index https://arxiv.org/abs/2301.07041v2 --provider gemini
//!
//! # Show what is stored
//! paperwiki list
//! paperwiki get 2301.07041
//!
//! # Serve POST /index-paper and the read endpoints
//! paperwiki serve --addr 0.0.0.0:8787
//! ```
//!
//! API keys are read from the environment (`ANTHROPIC_API_KEY`, `OPENAI_API_KEY`,
//! `GEMINI_API_KEY`) on top of the configuration file. Use `-v` (repeatable) or `RUST_LOG` for
//! more logging.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use clap::{builder::ArgAction, Parser};
use paperwiki::{
  config::Config,
  database::{Database, DatabaseInstruction, List, Lookup},
  identifier::CanonicalId,
  indexer::{IndexRequest, Indexer},
  provider::ProviderKind,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod error;
pub mod interaction;
pub mod server;

use crate::{commands::*, error::*, interaction::*};

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Index arXiv papers into LLM-written wiki documents")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(short, long, action = ArgAction::Count, global = true, help = "Increase logging verbosity")]
  verbose: u8,

  /// Path to the configuration file. Defaults to the platform configuration directory.
  #[arg(long, short, global = true)]
  config: Option<PathBuf>,

  /// Skip all prompts and accept defaults (mostly for testing)
  #[arg(long, hide = true, global = true)]
  accept_defaults: bool,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,
}

impl Cli {
  /// Path of the configuration file in use.
  fn config_path(&self) -> Result<PathBuf> {
    match &self.config {
      Some(path) => Ok(path.clone()),
      None => Ok(Config::default_path()?),
    }
  }

  /// Loads the configuration file, overlaid with the environment.
  fn load_config(&self) -> Result<Config> {
    let path = self.config_path()?;
    debug!("Using configuration at {}", path.display());
    Ok(Config::load(path)?)
  }
}

/// Configures the logging system based on the verbosity level
///
/// `RUST_LOG` takes precedence. Otherwise:
/// - 0: error
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .init();
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  match cli.command.clone() {
    Commands::Init(options) => init(&cli, options).await,
    Commands::Index(options) => index(&cli, options).await,
    Commands::Get { identifier, json } => get(&cli, &identifier, json).await,
    Commands::List { limit, json } => list(&cli, limit, json).await,
    Commands::Serve { addr } => serve(&cli, addr).await,
  }
}
