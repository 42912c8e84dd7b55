use reqwest::{RequestBuilder, StatusCode};

use super::*;
use crate::format::truncate_chars;

/// Object store backed by the REST API of a Supabase-compatible storage service.
///
/// Requests authenticate with the service key both as a bearer token and as the `apikey`
/// header.
pub struct SupabaseObjectStore {
  client:      reqwest::Client,
  base_url:    String,
  service_key: String,
  bucket:      String,
  public_base: String,
}

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
  prefix: &'a str,
  search: &'a str,
  limit:  u32,
}

#[derive(Debug, Deserialize)]
struct ListedObject {
  name: String,
}

impl SupabaseObjectStore {
  /// Creates a store for `bucket` on the service at `base_url`.
  ///
  /// Public URLs are composed from `public_base` when given, otherwise from `base_url`.
  pub fn new(base_url: &str, service_key: &str, bucket: &str, public_base: Option<String>) -> Self {
    let base_url = base_url.trim_end_matches('/').to_string();
    Self {
      client: reqwest::Client::new(),
      public_base: public_base.unwrap_or_else(|| base_url.clone()),
      base_url,
      service_key: service_key.to_string(),
      bucket: bucket.to_string(),
    }
  }

  fn object_url(&self, path: &str) -> String {
    format!("{}/storage/v1/object/{}/{path}", self.base_url, self.bucket)
  }

  fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
    request.bearer_auth(&self.service_key).header("apikey", &self.service_key)
  }

  async fn failure(action: &str, response: reqwest::Response) -> PaperwikiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    PaperwikiError::Storage(format!("{action} failed with {status}: {}", truncate_chars(&body, 2000)))
  }
}

#[async_trait]
impl ObjectStore for SupabaseObjectStore {
  fn bucket(&self) -> &str { &self.bucket }

  async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
    check_path(path)?;
    let response = self.authorized(self.client.get(self.object_url(path))).send().await?;
    match response.status() {
      status if status.is_success() => Ok(Some(response.bytes().await?.to_vec())),
      // The service reports missing objects as 400 with a not-found body on some versions
      StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
        trace!("No object at {path} in bucket {}", self.bucket);
        Ok(None)
      },
      _ => Err(Self::failure("download", response).await),
    }
  }

  async fn exists(&self, path: &str) -> Result<bool> {
    check_path(path)?;
    let (prefix, name) = path.rsplit_once('/').unwrap_or(("", path));
    let url = format!("{}/storage/v1/object/list/{}", self.base_url, self.bucket);
    let response = self
      .authorized(self.client.post(url))
      .json(&ListRequest { prefix, search: name, limit: 100 })
      .send()
      .await?;
    if !response.status().is_success() {
      return Err(Self::failure("list", response).await);
    }
    let listed: Vec<ListedObject> = response.json().await?;
    Ok(listed.iter().any(|object| object.name == name))
  }

  async fn put(&self, path: &str, bytes: &[u8], mode: PutMode) -> Result<PutOutcome> {
    check_path(path)?;
    let content_type =
      if path.to_lowercase().ends_with(".pdf") { "application/pdf" } else { "application/octet-stream" };
    let upsert = if mode == PutMode::Replace { "true" } else { "false" };

    let response = self
      .authorized(self.client.post(self.object_url(path)))
      .header("content-type", content_type)
      .header("x-upsert", upsert)
      .body(bytes.to_vec())
      .send()
      .await?;

    let status = response.status();
    if status.is_success() {
      return Ok(PutOutcome::Written);
    }
    if mode == PutMode::IfAbsent && status == StatusCode::CONFLICT {
      return Ok(PutOutcome::AlreadyPresent);
    }
    if mode == PutMode::IfAbsent && status == StatusCode::BAD_REQUEST {
      let body = response.text().await.unwrap_or_default();
      if body.contains("Duplicate") || body.contains("already exists") {
        return Ok(PutOutcome::AlreadyPresent);
      }
      return Err(PaperwikiError::Storage(format!(
        "upload failed with 400: {}",
        truncate_chars(&body, 2000)
      )));
    }
    Err(Self::failure("upload", response).await)
  }

  fn public_url(&self, path: &str) -> String { public_object_url(&self.public_base, &self.bucket, path) }
}
