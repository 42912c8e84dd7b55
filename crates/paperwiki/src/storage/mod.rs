//! Durable object storage for cached PDFs.
//!
//! Every backend implements [`ObjectStore`]. Objects live in a single bucket and are addressed by
//! a relative path such as `2301.07041.pdf`. Two backends are provided:
//!
//! - [`LocalObjectStore`]: files under `<root>/<bucket>/`
//! - [`SupabaseObjectStore`]: the REST API of a Supabase-compatible storage service
//!
//! # Examples
//!
//! ```no_run
//! use paperwiki::storage::{LocalObjectStore, ObjectStore, PutMode, PutOutcome};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = LocalObjectStore::new("/tmp/paperwiki", "papers", None);
//! if store.put("2301.07041.pdf", b"%PDF-1.7", PutMode::IfAbsent).await? == PutOutcome::Written {
//!   println!("stored at {}", store.public_url("2301.07041.pdf"));
//! }
//! # Ok(())
//! # }
//! ```

use super::*;
use crate::config::StorageBackend;

pub mod local;
pub mod supabase;

pub use local::LocalObjectStore;
pub use supabase::SupabaseObjectStore;

/// How a write treats an object that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutMode {
  /// Overwrite any existing object
  Replace,
  /// Write only if no object exists at the path
  IfAbsent,
}

/// What a write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
  /// The bytes were stored
  Written,
  /// An object already existed and was left untouched
  AlreadyPresent,
}

/// A bucket of immutable objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
  /// Name of the bucket this store writes to.
  fn bucket(&self) -> &str;

  /// Reads an object, or `None` if there is nothing at `path`.
  async fn get(&self, path: &str) -> Result<Option<Vec<u8>>>;

  /// Whether an object exists at `path`, determined by listing its directory.
  async fn exists(&self, path: &str) -> Result<bool>;

  /// Writes an object.
  async fn put(&self, path: &str, bytes: &[u8], mode: PutMode) -> Result<PutOutcome>;

  /// The public URL of the object at `path`. Does not touch the store.
  fn public_url(&self, path: &str) -> String;
}

/// `<base>/storage/v1/object/public/<bucket>/<path>`, ignoring a trailing slash on `base`.
pub fn public_object_url(base: &str, bucket: &str, path: &str) -> String {
  format!("{}/storage/v1/object/public/{bucket}/{path}", base.trim_end_matches('/'))
}

/// Builds the store described by the configuration.
pub fn from_config(config: &Config) -> Result<Arc<dyn ObjectStore>> {
  let storage = &config.storage;
  match storage.backend {
    StorageBackend::Local => {
      debug!("Using local object store at {}", storage.root.display());
      Ok(Arc::new(LocalObjectStore::new(
        &storage.root,
        &storage.bucket,
        storage.public_base_url.clone(),
      )))
    },
    StorageBackend::Supabase => {
      let (Some(url), Some(key)) = (storage.url.as_deref(), storage.service_key.as_deref()) else {
        return Err(PaperwikiError::ConfigurationMissing("storage.url and storage.service_key".into()));
      };
      debug!("Using Supabase object store at {url}");
      Ok(Arc::new(SupabaseObjectStore::new(url, key, &storage.bucket, storage.public_base_url.clone())))
    },
  }
}

/// Rejects absolute paths and parent references.
fn check_path(path: &str) -> Result<()> {
  if path.is_empty() || path.starts_with('/') || path.split('/').any(|segment| segment == "..") {
    return Err(PaperwikiError::Storage(format!("invalid object path {path:?}")));
  }
  Ok(())
}
