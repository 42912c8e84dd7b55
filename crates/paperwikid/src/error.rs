//! Error types for the paperwiki command line interface.

use paperwiki::error::PaperwikiError;
use thiserror::Error;

/// Result alias used throughout the CLI.
pub type Result<T> = core::result::Result<T, PaperwikidError>;

/// Errors surfaced by CLI commands and the HTTP server.
#[derive(Error, Debug)]
pub enum PaperwikidError {
  /// The indexing library failed.
  #[error(transparent)]
  Paperwiki(#[from] PaperwikiError),

  /// A file or socket operation failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// An interactive prompt failed.
  #[error(transparent)]
  Dialoguer(#[from] dialoguer::Error),

  /// Output could not be encoded as JSON.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// An indexing request ended with a fatal error.
  #[error("{0}")]
  Indexing(String),
}
