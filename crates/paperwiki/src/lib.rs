//! Indexing of arXiv papers into structured, LLM-written wiki documents.
//!
//! `paperwiki` takes a paper identifier in whatever shape a user pastes it (a bare id, an
//! `arXiv:` prefixed id, a versioned id, or an abstract/PDF URL) and produces a persisted record
//! containing:
//!
//! - The paper's bibliographic metadata, fetched from the arXiv Atom API
//! - A cached copy of the paper's PDF in durable object storage, with a stable public URL
//! - A multi-section analytical document written by one of several generation backends
//!
//! # Features
//!
//! - **Idempotent indexing**: a paper that is already indexed is returned from the database
//!   without touching arXiv, storage, or any generation backend unless a refresh is forced
//! - **Backend fallback**: Anthropic, OpenAI and Gemini are tried in a fixed priority order (or an
//!   explicit one first); every failure is recorded and the next backend is tried
//! - **Tolerant parsing**: backend output wrapped in prose or code fences is still understood
//! - **Stub documents**: when every backend fails the paper is still indexed with a deterministic
//!   placeholder document
//!
//! # Getting Started
//!
//! ```no_run
//! use paperwiki::{config::Config, indexer::{IndexRequest, Indexer}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let config = Config::load(Config::default_path()?)?;
//!   let indexer = Indexer::builder().with_config(config).build().await?;
//!
//!   let response = indexer.index(&IndexRequest::new("https://arxiv.org/abs/2301.07041v2")).await?;
//!   println!("{} written by {:?}", response.data.title, response.provider);
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`identifier`]: Canonicalization of paper identifiers
//! - [`clients`]: The arXiv metadata client
//! - [`storage`] and [`asset`]: Object storage backends and the PDF cache built on them
//! - [`provider`]: The generation backend trait and its adapters
//! - [`parse`]: Extraction of a [`document::GeneratedDocument`] from free-form backend text
//! - [`synthesis`]: Ordered fallback across generation backends
//! - [`database`]: SQLite persistence of indexed papers
//! - [`indexer`]: The orchestrator tying all of the above together

#![warn(missing_docs)]

use std::{
  collections::BTreeMap,
  fmt::Display,
  path::{Path, PathBuf},
  str::FromStr,
  sync::Arc,
  time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod asset;
pub mod clients;
pub mod config;
pub mod database;
pub mod deadline;
pub mod document;
pub mod error;
pub mod format;
pub mod identifier;
pub mod indexer;
pub mod parse;
pub mod provider;
pub mod record;
pub mod storage;
pub mod synthesis;
pub mod trace;

use crate::{
  clients::arxiv::BibliographicRecord, config::Config, deadline::Deadline,
  document::GeneratedDocument, error::*, record::PersistedRecord, trace::TraceLog,
};

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use paperwiki::prelude::*;
///
/// async fn example(db: &Database) -> Result<(), PaperwikiError> {
///   let record = Lookup::by_arxiv_id("2301.07041").execute(db).await?;
///   println!("{:?}", record.map(|r| r.title));
///   Ok(())
/// }
/// ```
pub mod prelude {
  pub use crate::{
    database::{Database, DatabaseInstruction, List, Lookup, Upsert},
    error::PaperwikiError,
    provider::Provider,
    storage::ObjectStore,
  };
}
