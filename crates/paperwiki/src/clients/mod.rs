//! Clients for the external services a paper is read from.
//!
//! # Supported Sources
//!
//! - [`arxiv`] - Client for the arXiv Atom query API
//!
//! # Examples
//!
//! ```no_run
//! use paperwiki::{clients::ArxivClient, deadline::Deadline, identifier::CanonicalId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let deadline = Deadline::after(std::time::Duration::from_secs(60), std::time::Duration::from_secs(30));
//! let client = ArxivClient::new("https://export.arxiv.org/api/query");
//! let record = client.fetch(&CanonicalId::parse("2301.07041"), &deadline).await?;
//! println!("{} by {:?}", record.title, record.authors);
//! # Ok(())
//! # }
//! ```

pub mod arxiv;

pub use arxiv::ArxivClient;

use super::*;
