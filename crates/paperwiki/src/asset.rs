//! Cache of paper PDFs in object storage.
//!
//! The PDF of a paper is stored at a deterministic path (`<id>.pdf`) and is downloaded from its
//! origin only when the store does not have it yet. Once written, an object is never replaced by
//! a later request.

use serde_json::json;

use super::*;
use crate::{
  identifier::CanonicalId,
  storage::{ObjectStore, PutMode, PutOutcome},
};

/// A cached PDF.
#[derive(Debug, Clone)]
pub struct Asset {
  /// Object path within the bucket
  pub path:       String,
  /// Stable public URL of the object
  pub public_url: String,
  /// PDF bytes
  pub bytes:      Vec<u8>,
}

/// Ensures PDFs are present in object storage.
pub struct AssetCache {
  store:           Arc<dyn ObjectStore>,
  client:          reqwest::Client,
  origin_base:     String,
  conditional_put: bool,
}

impl AssetCache {
  /// Creates a cache writing to `store` and downloading from `<origin_base>/<id>.pdf`.
  pub fn new(store: Arc<dyn ObjectStore>, origin_base: impl Into<String>) -> Self {
    Self {
      store,
      client: reqwest::Client::new(),
      origin_base: origin_base.into().trim_end_matches('/').to_string(),
      conditional_put: true,
    }
  }

  /// Chooses between a single create-if-absent write (the default) and a listing check followed
  /// by a replacing write.
  pub fn with_conditional_put(mut self, conditional_put: bool) -> Self {
    self.conditional_put = conditional_put;
    self
  }

  /// The public URL of the PDF of `id`, computed without touching the store.
  pub fn public_url(&self, id: &CanonicalId) -> String { self.store.public_url(&id.asset_path()) }

  /// Returns the PDF of `id`, downloading and storing it first if the store does not have it.
  ///
  /// # Errors
  ///
  /// - [`PaperwikiError::AssetFetchFailed`] if the origin answers with a non-2xx status
  /// - [`PaperwikiError::Storage`] if the store rejects a read or write
  /// - [`PaperwikiError::Timeout`] if any call outlives its deadline
  pub async fn ensure(
    &self,
    id: &CanonicalId,
    deadline: &Deadline,
    trace: &mut TraceLog,
  ) -> Result<Asset> {
    let path = id.asset_path();
    let public_url = self.public_url(id);

    if let Some(bytes) = deadline.bound("storage download", self.store.get(&path)).await? {
      trace.note_with("pdf found in storage", json!({ "bytes": bytes.len() }));
      return Ok(Asset { path, public_url, bytes });
    }

    let bytes = self.download(id, deadline).await?;
    trace.note_with("downloaded pdf", json!({ "bytes": bytes.len() }));

    let outcome = if self.conditional_put {
      deadline.bound("storage upload", self.store.put(&path, &bytes, PutMode::IfAbsent)).await?
    } else if deadline.bound("storage listing", self.store.exists(&path)).await? {
      PutOutcome::AlreadyPresent
    } else {
      deadline.bound("storage upload", self.store.put(&path, &bytes, PutMode::Replace)).await?
    };

    match outcome {
      PutOutcome::Written => trace.note_with("uploaded pdf to storage", json!({ "objectPath": path })),
      PutOutcome::AlreadyPresent =>
        trace.note_with("pdf already uploaded by another request", json!({ "objectPath": path })),
    }
    trace.note_with("pdfPublicUrl", json!({ "pdfPublicUrl": public_url }));

    Ok(Asset { path, public_url, bytes })
  }

  async fn download(&self, id: &CanonicalId, deadline: &Deadline) -> Result<Vec<u8>> {
    let url = format!("{}/{}", self.origin_base, id.asset_path());
    debug!("Downloading PDF from {url}");
    deadline
      .bound("PDF download", async {
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
          warn!("PDF download from {url} failed with {status}");
          return Err(PaperwikiError::AssetFetchFailed(status.as_u16().to_string()));
        }
        Ok(response.bytes().await?.to_vec())
      })
      .await
  }
}
