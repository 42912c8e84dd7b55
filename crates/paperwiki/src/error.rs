//! Error types for the paperwiki library.
//!
//! Errors fall into two groups. Fatal errors abort an indexing request and are returned to the
//! caller as a single top-level error. Non-fatal errors are raised by individual generation
//! backends; the synthesis orchestrator records them per backend and moves on to the next one, so
//! they only ever reach a caller as entries of `providerErrors`.
//!
//! # Examples
//!
//! ```
//! use paperwiki::error::PaperwikiError;
//!
//! let err = PaperwikiError::MetadataNotFound("2401.00000".into());
//! assert!(err.is_fatal());
//! assert_eq!(err.status_code(), 500);
//!
//! let err = PaperwikiError::ProviderInvocation("OpenAI 429: rate limited".into());
//! assert!(!err.is_fatal());
//! ```

use thiserror::Error;

use crate::parse::ParseError;

/// Error type alias used for the [`paperwiki`](crate) crate.
pub type Result<T> = core::result::Result<T, PaperwikiError>;

/// Errors that can occur while indexing a paper.
#[derive(Error, Debug)]
pub enum PaperwikiError {
  /// The request did not carry an identifier at all.
  #[error("Missing arxiv_id")]
  IdentifierMissing,

  /// An identifier looked like a URL but could not be understood as one.
  ///
  /// Never surfaces from [`normalize`](crate::identifier::normalize), which falls back to treating
  /// the trimmed input as already canonical.
  #[error("Malformed identifier: {0}")]
  IdentifierMalformed(String),

  /// The bibliographic service had no usable entry for the identifier.
  ///
  /// Raised when the response contains no entry or the first entry has an empty title.
  #[error("No arXiv entry found for {0}")]
  MetadataNotFound(String),

  /// The PDF could not be downloaded from its origin.
  #[error("PDF download failed: {0}")]
  AssetFetchFailed(String),

  /// The object store rejected a read or a write.
  #[error("Storage error: {0}")]
  Storage(String),

  /// A generation backend could not be invoked or answered with an error.
  #[error("{0}")]
  ProviderInvocation(String),

  /// A generation backend answered, but its output could not be turned into a document.
  #[error("Invalid generation output: {0}")]
  GenerationOutputInvalid(#[from] ParseError),

  /// Required configuration (e.g., storage credentials) is absent.
  #[error("Missing configuration: {0}")]
  ConfigurationMissing(String),

  /// An external call did not complete before its deadline.
  #[error("{0} timed out")]
  Timeout(String),

  /// An API returned an error response.
  ///
  /// The string parameter contains the error message from the API for debugging.
  #[error("API error: {0}")]
  ApiError(String),

  /// A network request failed.
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// Failed to parse a URL.
  #[error(transparent)]
  InvalidUrl(#[from] url::ParseError),

  /// A SQLite operation failed.
  #[error(transparent)]
  Sqlite(#[from] rusqlite::Error),

  /// An async SQLite operation failed.
  #[error(transparent)]
  Persistence(#[from] tokio_rusqlite::Error),

  /// A file system operation failed.
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// JSON (de)serialization failed outside of backend output parsing.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// The configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// The configuration could not be serialized.
  #[error(transparent)]
  TomlSer(#[from] toml::ser::Error),
}

impl PaperwikiError {
  /// Whether this error aborts an indexing request.
  ///
  /// Malformed identifiers, backend invocation failures and unusable backend output are
  /// recoverable; everything else short-circuits the request.
  pub fn is_fatal(&self) -> bool {
    !matches!(
      self,
      PaperwikiError::IdentifierMalformed(_)
        | PaperwikiError::ProviderInvocation(_)
        | PaperwikiError::GenerationOutputInvalid(_)
    )
  }

  /// The HTTP status used when this error ends a request.
  pub fn status_code(&self) -> u16 {
    match self {
      PaperwikiError::IdentifierMissing => 400,
      _ => 500,
    }
  }
}
