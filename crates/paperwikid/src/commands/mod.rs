use clap::{Args, Subcommand};

use super::*;

pub mod get;
pub mod index;
pub mod init;
pub mod list;
pub mod serve;

pub use get::get;
pub use index::{index, IndexOptions};
pub use init::{init, InitOptions};
pub use list::list;
pub use serve::serve;

/// Available commands for the CLI
#[derive(Subcommand, Clone)]
pub enum Commands {
  /// Write a configuration file with default settings
  Init(InitOptions),

  /// Index a paper: fetch metadata and PDF, write the document, store the record
  Index(IndexOptions),

  /// Show a stored record
  Get {
    /// Paper identifier in any accepted form
    /// Examples: "2301.07041", "arXiv:2301.07041v2", "https://arxiv.org/abs/2301.07041"
    identifier: String,

    /// Print the record as JSON
    #[arg(long)]
    json: bool,
  },

  /// List stored records, most recently indexed first
  List {
    /// Maximum number of records
    #[arg(long, short, default_value_t = 20)]
    limit: usize,

    /// Print the records as JSON
    #[arg(long)]
    json: bool,
  },

  /// Serve the HTTP endpoint
  Serve {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8787")]
    addr: SocketAddr,
  },
}
