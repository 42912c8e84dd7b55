use std::{
  error::Error,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
};

use async_trait::async_trait;
use mockito::{Matcher, Mock, ServerGuard};
use paperwiki::{
  config::Config,
  error::PaperwikiError,
  indexer::{IndexRequest, Indexer},
  prelude::*,
  provider::PromptContext,
};
use tempfile::{tempdir, TempDir};
use tracing_test::traced_test;

mod backends;
mod workflows;

pub type TestResult<T> = Result<T, Box<dyn Error>>;

pub const ARXIV_ID: &str = "2301.07041";

pub const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/2301.07041v2</id>
    <title>Verifiable Fully Homomorphic
      Encryption</title>
    <summary>  Fully Homomorphic Encryption (FHE) is seeing increasing real-world deployment.  </summary>
    <published>2023-01-17T17:58:01Z</published>
    <author><name>Alexander Viand</name></author>
    <author><name>Christian Knabenhans</name></author>
    <author><name>Anwar Hithnawi</name></author>
    <category term="cs.CR" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

pub const EMPTY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query: id_list=2301.07041</title>
</feed>"#;

pub const DOCUMENT: &str = r#"{"sections": [
  {"id": "overview", "title": "Overview", "content": "Verifiable FHE."},
  {"title": "Methodology and Approach", "children": [{"title": "Threat Model", "content": "Malicious server."}]}
]}"#;

/// A backend answering with a scripted reply and counting its calls.
pub struct ScriptedProvider {
  name:  &'static str,
  reply: Result<String, String>,
  calls: AtomicUsize,
}

impl ScriptedProvider {
  pub fn ok(name: &'static str, text: &str) -> Arc<Self> {
    Arc::new(Self { name, reply: Ok(text.to_string()), calls: AtomicUsize::new(0) })
  }

  pub fn failing(name: &'static str, message: &str) -> Arc<Self> {
    Arc::new(Self { name, reply: Err(message.to_string()), calls: AtomicUsize::new(0) })
  }

  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl Provider for ScriptedProvider {
  fn name(&self) -> &str { self.name }

  fn default_model(&self) -> &str { "scripted" }

  async fn generate(&self, _model: &str, prompt: &PromptContext<'_>) -> paperwiki::error::Result<String> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    assert!(prompt.asset.is_some_and(|bytes| bytes.starts_with(b"%PDF")));
    self.reply.clone().map_err(PaperwikiError::ProviderInvocation)
  }
}

/// Temporary directories and a mock server standing in for arXiv and every backend.
pub struct Harness {
  pub server: ServerGuard,
  pub dir:    TempDir,
}

impl Harness {
  pub async fn new() -> Self {
    Self { server: mockito::Server::new_async().await, dir: tempdir().unwrap() }
  }

  /// Configuration pointing arXiv at the mock server and all state into the temporary directory.
  pub fn config(&self) -> Config {
    let mut config = Config::default()
      .with_database_path(&self.dir.path().join("paperwiki.db"))
      .with_storage_root(&self.dir.path().join("objects"));
    config.arxiv.api_url = format!("{}/api/query", self.server.url());
    config.arxiv.pdf_base_url = format!("{}/pdf", self.server.url());
    config
  }

  pub async fn indexer(&self, providers: Vec<Arc<dyn Provider>>) -> Indexer {
    Indexer::builder().with_config(self.config()).with_providers(providers).build().await.unwrap()
  }

  pub async fn mock_feed(&mut self, body: &str, hits: usize) -> Mock {
    self
      .server
      .mock("GET", "/api/query")
      .match_query(Matcher::UrlEncoded("id_list".into(), ARXIV_ID.into()))
      .with_status(200)
      .with_header("content-type", "application/atom+xml")
      .with_body(body)
      .expect(hits)
      .create_async()
      .await
  }

  pub async fn mock_pdf(&mut self, hits: usize) -> Mock {
    self
      .server
      .mock("GET", format!("/pdf/{ARXIV_ID}.pdf").as_str())
      .with_status(200)
      .with_header("content-type", "application/pdf")
      .with_body("%PDF-1.7\n% test document")
      .expect(hits)
      .create_async()
      .await
  }
}
