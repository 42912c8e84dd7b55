use std::{
  io::ErrorKind,
  sync::atomic::{AtomicU64, Ordering},
};

use url::Url;

use super::*;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Object store backed by a local directory.
///
/// Objects of bucket `b` live under `<root>/b/`. Writes go to a temporary file first, so readers
/// never observe a partial object. Conditional writes hard-link the temporary file into place,
/// which fails atomically when the target already exists.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
  dir:         PathBuf,
  bucket:      String,
  public_base: Option<String>,
}

impl LocalObjectStore {
  /// Creates a store rooted at `root`.
  ///
  /// Public URLs are composed from `public_base` when given, otherwise they are `file://` URLs of
  /// the stored objects.
  pub fn new(root: impl AsRef<Path>, bucket: &str, public_base: Option<String>) -> Self {
    Self { dir: root.as_ref().join(bucket), bucket: bucket.to_string(), public_base }
  }

  /// Directory holding this bucket's objects.
  pub fn dir(&self) -> &Path { &self.dir }

  fn object_path(&self, path: &str) -> Result<PathBuf> {
    check_path(path)?;
    Ok(self.dir.join(path))
  }

  fn temp_path(target: &Path) -> PathBuf {
    let name = target.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    target.with_file_name(format!(".{name}.{}.{n}.tmp", std::process::id()))
  }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
  fn bucket(&self) -> &str { &self.bucket }

  async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
    let target = self.object_path(path)?;
    match tokio::fs::read(&target).await {
      Ok(bytes) => Ok(Some(bytes)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  async fn exists(&self, path: &str) -> Result<bool> {
    let target = self.object_path(path)?;
    let (Some(parent), Some(name)) = (target.parent(), target.file_name()) else {
      return Ok(false);
    };

    let mut entries = match tokio::fs::read_dir(parent).await {
      Ok(entries) => entries,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
      Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
      if entry.file_name() == name {
        return Ok(true);
      }
    }
    Ok(false)
  }

  async fn put(&self, path: &str, bytes: &[u8], mode: PutMode) -> Result<PutOutcome> {
    let target = self.object_path(path)?;
    if let Some(parent) = target.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }

    let temp = Self::temp_path(&target);
    tokio::fs::write(&temp, bytes).await?;

    let outcome = match mode {
      PutMode::Replace => tokio::fs::rename(&temp, &target).await.map(|_| PutOutcome::Written),
      PutMode::IfAbsent => {
        let linked = match tokio::fs::hard_link(&temp, &target).await {
          Ok(()) => Ok(PutOutcome::Written),
          Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(PutOutcome::AlreadyPresent),
          Err(e) => Err(e),
        };
        tokio::fs::remove_file(&temp).await?;
        linked
      },
    };

    if outcome.is_err() {
      let _ = tokio::fs::remove_file(&temp).await;
    }
    let outcome = outcome?;
    debug!("Put {} ({} bytes): {outcome:?}", target.display(), bytes.len());
    Ok(outcome)
  }

  fn public_url(&self, path: &str) -> String {
    match &self.public_base {
      Some(base) => public_object_url(base, &self.bucket, path),
      None => Url::from_file_path(self.dir.join(path))
        .map(String::from)
        .unwrap_or_else(|_| self.dir.join(path).display().to_string()),
    }
  }
}
