//! The indexing orchestrator.
//!
//! An [`Indexer`] turns an [`IndexRequest`] into a persisted record:
//!
//! 1. The identifier is normalized to its canonical form
//! 2. Unless the request forces a refresh, an existing record is returned as is
//! 3. Bibliographic metadata is fetched from arXiv
//! 4. The PDF is made available in object storage
//! 5. A document is synthesized by the first backend that produces one, or the stub
//! 6. The record is upserted and returned
//!
//! Each request runs under its own [`Deadline`] and collects its own [`TraceLog`]; the indexer
//! holds no per-request state and can serve concurrent requests.
//!
//! # Examples
//!
//! ```no_run
//! use paperwiki::{config::Config, indexer::{IndexRequest, Indexer}, provider::ProviderKind};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let indexer = Indexer::builder().with_config(Config::default()).build().await?;
//!
//! let mut request = IndexRequest::new("arXiv:2301.07041v1");
//! request.force = true;
//! request.provider = Some(ProviderKind::Gemini);
//!
//! match indexer.respond(&request).await {
//!   Ok(response) => println!("{} via {:?}", response.data.arxiv_id, response.provider),
//!   Err(failure) => eprintln!("{}: {}", failure.status, failure.error),
//! }
//! # Ok(())
//! # }
//! ```

use serde_json::json;

use super::*;
use crate::{
  asset::AssetCache,
  clients::ArxivClient,
  database::{Database, DatabaseInstruction, Lookup, Upsert},
  identifier::CanonicalId,
  provider::{PromptContext, Provider, ProviderKind},
  storage::ObjectStore,
  synthesis::Synthesizer,
};

/// A request to index one paper.
///
/// Deserializes from the JSON body accepted by the HTTP endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexRequest {
  /// Identifier in any accepted form
  #[serde(default)]
  pub arxiv_id:        String,
  /// Re-run the pipeline even if the paper is already indexed
  #[serde(default)]
  pub force:           bool,
  /// Backend to try first
  #[serde(default)]
  pub provider:        Option<ProviderKind>,
  /// Model override for the OpenAI backend
  #[serde(default)]
  pub openai_model:    Option<String>,
  /// Model override for the Gemini backend
  #[serde(default)]
  pub gemini_model:    Option<String>,
  /// Model override for the Anthropic backend
  #[serde(default)]
  pub anthropic_model: Option<String>,
  /// Return the request trace with the response
  #[serde(default)]
  pub debug:           bool,
}

impl IndexRequest {
  /// A non-forced request for `arxiv_id`.
  pub fn new(arxiv_id: impl Into<String>) -> Self {
    Self { arxiv_id: arxiv_id.into(), ..Self::default() }
  }

  /// Model overrides keyed by backend name. Blank overrides are ignored.
  pub fn models(&self) -> BTreeMap<String, String> {
    [
      (ProviderKind::Anthropic, &self.anthropic_model),
      (ProviderKind::OpenAi, &self.openai_model),
      (ProviderKind::Gemini, &self.gemini_model),
    ]
    .into_iter()
    .filter_map(|(kind, model)| {
      let model = model.as_deref()?.trim();
      (!model.is_empty()).then(|| (kind.as_str().to_string(), model.to_string()))
    })
    .collect()
  }
}

/// The answer to a successful [`IndexRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexResponse {
  /// Always `true`
  pub ok:              bool,
  /// The stored record
  pub data:            PersistedRecord,
  /// Set when the record was returned without running the pipeline
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub already_indexed: bool,
  /// Backend that wrote the document, or `stub`; absent when already indexed
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub provider:        Option<String>,
  /// Failure message of every backend tried before the winner
  #[serde(default)]
  pub provider_errors: BTreeMap<String, String>,
  /// The request trace, when asked for
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub debug:           Option<TraceLog>,
}

/// The answer to a request that failed with a fatal error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
  /// Error message
  pub error:  String,
  /// Trace of the request up to the failure
  pub debug:  Option<TraceLog>,
  /// HTTP status of the failure
  #[serde(skip)]
  pub status: u16,
}

/// Builder for an [`Indexer`].
///
/// Anything not supplied is derived from the configuration.
#[derive(Default)]
pub struct IndexerBuilder {
  config:    Option<Config>,
  database:  Option<Database>,
  store:     Option<Arc<dyn ObjectStore>>,
  providers: Option<Vec<Arc<dyn Provider>>>,
}

impl IndexerBuilder {
  /// Uses `config` instead of the configuration file at [`Config::default_path`].
  pub fn with_config(mut self, config: Config) -> Self {
    self.config = Some(config);
    self
  }

  /// Uses an already opened database.
  pub fn with_database(mut self, database: Database) -> Self {
    self.database = Some(database);
    self
  }

  /// Uses `store` instead of the configured storage backend.
  pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
    self.store = Some(store);
    self
  }

  /// Uses `providers`, in order, instead of the configured backends.
  pub fn with_providers(mut self, providers: Vec<Arc<dyn Provider>>) -> Self {
    self.providers = Some(providers);
    self
  }

  /// Validates the configuration and opens the database.
  ///
  /// # Errors
  ///
  /// [`PaperwikiError::ConfigurationMissing`] if the storage backend lacks credentials, or any
  /// error opening the database. No external service is contacted.
  pub async fn build(self) -> Result<Indexer> {
    let config = match self.config {
      Some(config) => config,
      None => Config::load(Config::default_path()?)?,
    };
    config.validate()?;

    let db = match self.database {
      Some(db) => db,
      None => Database::open(&config.database_path).await?,
    };
    let store = match self.store {
      Some(store) => store,
      None => storage::from_config(&config)?,
    };
    let providers = self.providers.unwrap_or_else(|| provider::from_config(&config.providers));

    let synthesizer = Synthesizer::new(providers);
    info!("Indexer ready with providers {:?}", synthesizer.provider_names());

    Ok(Indexer {
      arxiv: ArxivClient::new(&config.arxiv.api_url),
      assets: AssetCache::new(store, &config.arxiv.pdf_base_url)
        .with_conditional_put(config.storage.conditional_put),
      synthesizer,
      db,
      config,
    })
  }
}

/// Indexes papers.
pub struct Indexer {
  config:      Config,
  db:          Database,
  arxiv:       ArxivClient,
  assets:      AssetCache,
  synthesizer: Synthesizer,
}

impl Indexer {
  /// Starts building an indexer.
  pub fn builder() -> IndexerBuilder { IndexerBuilder::default() }

  /// The database records are written to.
  pub fn database(&self) -> &Database { &self.db }

  /// The configuration the indexer was built with.
  pub fn config(&self) -> &Config { &self.config }

  /// Indexes the paper named by `request`.
  ///
  /// The trace is attached to the response when `request.debug` is set.
  ///
  /// # Errors
  ///
  /// Only fatal errors are returned; backend failures end up in
  /// [`IndexResponse::provider_errors`].
  pub async fn index(&self, request: &IndexRequest) -> Result<IndexResponse> {
    let mut trace = TraceLog::new();
    let mut response = self.run(request, &mut trace).await?;
    if request.debug {
      response.debug = Some(trace);
    }
    Ok(response)
  }

  /// Like [`Indexer::index`], but shapes a failure as the error body of the HTTP endpoint.
  ///
  /// The trace is always attached to a failure.
  pub async fn respond(
    &self,
    request: &IndexRequest,
  ) -> std::result::Result<IndexResponse, ErrorResponse> {
    let mut trace = TraceLog::new();
    match self.run(request, &mut trace).await {
      Ok(mut response) => {
        if request.debug {
          response.debug = Some(trace);
        }
        Ok(response)
      },
      Err(e) => {
        warn!("Indexing {:?} failed: {e}", request.arxiv_id);
        trace.note_with("fatal error", json!({ "error": e.to_string() }));
        Err(ErrorResponse { error: e.to_string(), debug: Some(trace), status: e.status_code() })
      },
    }
  }

  async fn run(&self, request: &IndexRequest, trace: &mut TraceLog) -> Result<IndexResponse> {
    let input = request.arxiv_id.trim();
    if input.is_empty() {
      return Err(PaperwikiError::IdentifierMissing);
    }
    let id = CanonicalId::parse(input);
    trace.note_with("normalized arxiv id", json!({ "input": input, "arxivId": id.as_str() }));
    let deadline = Deadline::from(&self.config);

    if !request.force {
      let lookup = Lookup::by_arxiv_id(id.as_str());
      match deadline.bound("database lookup", lookup.execute(&self.db)).await {
        Ok(Some(record)) => {
          info!("{id} is already indexed");
          trace.note("already indexed");
          return Ok(IndexResponse {
            ok:              true,
            data:            record,
            already_indexed: true,
            provider:        None,
            provider_errors: BTreeMap::new(),
            debug:           None,
          });
        },
        Ok(None) => debug!("{id} is not indexed yet"),
        Err(e) => {
          warn!("Lookup of {id} failed, indexing anyway: {e}");
          trace.note_with("existing lookup error", json!({ "error": e.to_string() }));
        },
      }
    }

    let record = self.arxiv.fetch(&id, &deadline).await?;
    trace.note_with(
      "metadata",
      json!({ "title": record.title, "authors": record.authors.len(), "category": record.category }),
    );

    let asset = self.assets.ensure(&id, &deadline, trace).await?;

    let prompt = PromptContext {
      record:    &record,
      id:        &id,
      asset_url: &asset.public_url,
      asset:     Some(asset.bytes.as_slice()),
    };
    let outcome =
      self.synthesizer.synthesize(&prompt, request.provider, &request.models(), &deadline, trace).await;
    let provider = outcome.provider_label().to_string();

    let persisted =
      PersistedRecord::cached(id.as_str(), record, asset.public_url, outcome.document);
    let stored = deadline.bound("database upsert", Upsert::record(&persisted).execute(&self.db)).await?;
    trace.note_with("upserted", json!({ "provider": provider }));

    Ok(IndexResponse {
      ok:              true,
      data:            stored,
      already_indexed: false,
      provider:        Some(provider),
      provider_errors: outcome.errors,
      debug:           None,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::synthesis::fake::FakeProvider;

  const FEED: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom">
    <entry>
      <title>Attention Is All You Need</title>
      <summary>The dominant sequence transduction models...</summary>
      <published>2017-06-12T17:57:34Z</published>
      <author><name>Ashish Vaswani</name></author>
      <category term="cs.CL"/>
    </entry>
  </feed>"#;

  async fn indexer(
    server: &mockito::ServerGuard,
    dir: &tempfile::TempDir,
    providers: Vec<Arc<dyn Provider>>,
  ) -> Indexer {
    let mut config = Config::default()
      .with_database_path(&dir.path().join("paperwiki.db"))
      .with_storage_root(&dir.path().join("objects"));
    config.arxiv.api_url = format!("{}/api/query", server.url());
    config.arxiv.pdf_base_url = format!("{}/pdf", server.url());
    Indexer::builder().with_config(config).with_providers(providers).build().await.unwrap()
  }

  #[test]
  fn test_request_from_json() {
    let request: IndexRequest = serde_json::from_value(json!({
      "arxiv_id": "2301.07041",
      "provider": "gemini",
      "openai_model": "gpt-4o",
      "gemini_model": "  ",
    }))
    .unwrap();

    assert!(!request.force);
    assert_eq!(request.provider, Some(ProviderKind::Gemini));
    assert_eq!(request.models(), BTreeMap::from([("openai".to_string(), "gpt-4o".to_string())]));
  }

  #[test]
  fn test_response_shape() {
    let response = IndexResponse {
      ok:              true,
      data:            PersistedRecord::cached(
        "1706.03762",
        crate::provider::sample_record(),
        "file:///p.pdf".into(),
        GeneratedDocument::default(),
      ),
      already_indexed: false,
      provider:        Some("stub".into()),
      provider_errors: BTreeMap::new(),
      debug:           None,
    };

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["ok"], json!(true));
    assert_eq!(value["provider"], json!("stub"));
    assert_eq!(value["providerErrors"], json!({}));
    assert!(value.get("alreadyIndexed").is_none());
    assert!(value.get("debug").is_none());
  }

  #[traced_test]
  #[tokio::test]
  async fn test_missing_identifier() {
    let server = mockito::Server::new_async().await;
    let dir = tempdir().unwrap();
    let indexer = indexer(&server, &dir, Vec::new()).await;

    let failure = indexer.respond(&IndexRequest::new("   ")).await.unwrap_err();
    assert_eq!(failure.status, 400);
    assert_eq!(failure.error, "Missing arxiv_id");
    assert!(failure.debug.unwrap().contains("fatal error"));
  }

  #[traced_test]
  #[tokio::test]
  async fn test_index_then_cache_hit() {
    let mut server = mockito::Server::new_async().await;
    let arxiv = server
      .mock("GET", "/api/query")
      .match_query(mockito::Matcher::UrlEncoded("id_list".into(), "1706.03762".into()))
      .with_body(FEED)
      .expect(1)
      .create_async()
      .await;
    let origin = server
      .mock("GET", "/pdf/1706.03762.pdf")
      .with_body("%PDF-1.5")
      .expect(1)
      .create_async()
      .await;

    let dir = tempdir().unwrap();
    let gemini = FakeProvider::ok("gemini", r#"{"sections": [{"title": "Overview"}]}"#);
    let indexer = indexer(&server, &dir, vec![gemini.clone()]).await;

    let mut request = IndexRequest::new("https://arxiv.org/abs/1706.03762v7");
    request.debug = true;
    let first = indexer.index(&request).await.unwrap();
    assert_eq!(first.provider.as_deref(), Some("gemini"));
    assert_eq!(first.data.arxiv_id, "1706.03762");
    assert_eq!(first.data.title, "Attention Is All You Need");
    assert_eq!(first.data.wiki_content.as_ref().unwrap().sections[0].id, "overview");
    assert!(first.debug.unwrap().contains("provider chosen"));

    let second = indexer.index(&IndexRequest::new("arXiv:1706.03762")).await.unwrap();
    assert!(second.already_indexed);
    assert!(second.provider.is_none());
    assert!(second.debug.is_none());
    assert_eq!(second.data, first.data);
    assert_eq!(gemini.calls(), 1);

    arxiv.assert_async().await;
    origin.assert_async().await;
  }
}
