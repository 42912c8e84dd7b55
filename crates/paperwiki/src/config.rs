//! Configuration for the indexer.
//!
//! Configuration is read from a TOML file (by default `<config_dir>/paperwiki/config.toml`) and
//! then overlaid with environment variables, so that secrets such as API keys never need to be
//! written to disk. A missing file is not an error; the defaults index into a local SQLite database
//! and a local object store under the platform data directory.
//!
//! # Example configuration
//!
//! ```toml
//! database_path = "/var/lib/paperwiki/paperwiki.db"
//!
//! [storage]
//! backend = "supabase"
//! bucket = "papers"
//! url = "https://project.supabase.co"
//!
//! [providers.anthropic]
//! model = "claude-3-7-sonnet-20250219"
//!
//! [timeouts]
//! request_secs = 300
//! call_secs = 120
//! ```
//!
//! # Environment
//!
//! | Variable | Overrides |
//! |---|---|
//! | `ANTHROPIC_API_KEY`, `OPENAI_API_KEY`, `GEMINI_API_KEY` | `providers.<name>.api_key` |
//! | `ANTHROPIC_MODEL`, `OPENAI_MODEL`, `GEMINI_MODEL` | `providers.<name>.model` |
//! | `PROJECT_URL`, `SUPABASE_URL`, `SB_URL` | `storage.url` |
//! | `SERVICE_ROLE_KEY`, `SUPABASE_SERVICE_ROLE_KEY`, `SB_SERVICE_ROLE_KEY` | `storage.service_key` |
//!
//! Where a row lists several variables, the first one set wins.

use super::*;

/// Default model for the Anthropic backend.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-7-sonnet-20250219";
/// Default model for the OpenAI backend.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
/// Default model for the Gemini backend.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Path of the SQLite database holding indexed papers
  pub database_path: PathBuf,
  /// Object storage for cached PDFs
  pub storage:       StorageConfig,
  /// Endpoints of the arXiv services
  pub arxiv:         ArxivConfig,
  /// Generation backends
  pub providers:     ProvidersConfig,
  /// Time bounds on external calls
  pub timeouts:      TimeoutConfig,
}

/// Which object store holds cached PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
  /// Files in a local directory
  #[default]
  Local,
  /// A Supabase-compatible storage REST API
  Supabase,
}

/// Object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
  /// Storage implementation to use
  pub backend:         StorageBackend,
  /// Bucket holding the PDFs
  pub bucket:          String,
  /// Root directory of the local backend
  pub root:            PathBuf,
  /// Base URL of the storage service (supabase backend)
  pub url:             Option<String>,
  /// Service key of the storage service (supabase backend)
  pub service_key:     Option<String>,
  /// Base used when composing public URLs, if different from `url`
  pub public_base_url: Option<String>,
  /// Upload with a single create-if-absent write instead of list-then-replace
  pub conditional_put: bool,
}

/// arXiv endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxivConfig {
  /// Atom query API
  pub api_url:      String,
  /// Base URL PDFs are downloaded from (`<pdf_base_url>/<id>.pdf`)
  pub pdf_base_url: String,
}

/// Configuration of every generation backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersConfig {
  /// Anthropic messages API
  pub anthropic: ProviderConfig,
  /// OpenAI chat completions API
  pub openai:    ProviderConfig,
  /// Gemini generateContent API
  pub gemini:    ProviderConfig,
}

/// Configuration of one generation backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProviderConfig {
  /// Credential; a backend without one is not tried unless explicitly requested
  pub api_key:  Option<String>,
  /// Model name; each backend has its own default
  pub model:    Option<String>,
  /// API base URL; each backend has its own default
  pub base_url: Option<String>,
}

impl ProviderConfig {
  /// Whether this backend carries a non-empty credential.
  pub fn is_configured(&self) -> bool {
    self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
  }
}

/// Time bounds on external calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
  /// Budget of a whole indexing request
  pub request_secs: u64,
  /// Budget of a single external call
  pub call_secs:    u64,
}

impl Default for Config {
  fn default() -> Self {
    let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("paperwiki");
    Self {
      database_path: data_dir.join("paperwiki.db"),
      storage:       StorageConfig { root: data_dir.join("objects"), ..StorageConfig::default() },
      arxiv:         ArxivConfig::default(),
      providers:     ProvidersConfig::default(),
      timeouts:      TimeoutConfig::default(),
    }
  }
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      backend:         StorageBackend::Local,
      bucket:          "papers".to_string(),
      root:            PathBuf::from("objects"),
      url:             None,
      service_key:     None,
      public_base_url: None,
      conditional_put: true,
    }
  }
}

impl Default for ArxivConfig {
  fn default() -> Self {
    Self {
      api_url:      "https://export.arxiv.org/api/query".to_string(),
      pdf_base_url: "https://arxiv.org/pdf".to_string(),
    }
  }
}

impl Default for TimeoutConfig {
  fn default() -> Self { Self { request_secs: 300, call_secs: 120 } }
}

impl Config {
  /// Returns the default path of the configuration file.
  ///
  /// - On Linux: `~/.config/paperwiki/config.toml`
  /// - On macOS: `~/Library/Application Support/paperwiki/config.toml`
  /// - On Windows: `%APPDATA%\paperwiki\config.toml`
  pub fn default_path() -> Result<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("paperwiki").join("config.toml")).ok_or_else(|| {
      PaperwikiError::ConfigurationMissing("no configuration directory on this platform".into())
    })
  }

  /// Loads the configuration file at `path` (defaults if it does not exist) and applies the
  /// process environment on top.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let config = if path.exists() {
      debug!("Loading configuration from {}", path.display());
      toml::from_str(&std::fs::read_to_string(path)?)?
    } else {
      debug!("No configuration at {}, using defaults", path.display());
      Self::default()
    };
    Ok(config.with_env(|key| std::env::var(key).ok()))
  }

  /// Writes this configuration to `path`, creating parent directories.
  ///
  /// Credentials are written as well, so callers usually save a configuration that was not
  /// overlaid with the environment.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(self)?)?;
    Ok(())
  }

  /// Overlays values found through `lookup` (normally the process environment).
  ///
  /// Empty values are ignored.
  pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
    let first = |keys: &[&str]| keys.iter().filter_map(|k| lookup(*k)).find(|v| !v.trim().is_empty());

    let providers = [
      (&mut self.providers.anthropic, "ANTHROPIC"),
      (&mut self.providers.openai, "OPENAI"),
      (&mut self.providers.gemini, "GEMINI"),
    ];
    for (provider, prefix) in providers {
      if let Some(key) = first(&[format!("{prefix}_API_KEY").as_str()]) {
        provider.api_key = Some(key);
      }
      if let Some(model) = first(&[format!("{prefix}_MODEL").as_str()]) {
        provider.model = Some(model);
      }
    }

    if let Some(url) = first(&["PROJECT_URL", "SUPABASE_URL", "SB_URL"]) {
      self.storage.url = Some(url);
    }
    if let Some(key) = first(&["SERVICE_ROLE_KEY", "SUPABASE_SERVICE_ROLE_KEY", "SB_SERVICE_ROLE_KEY"]) {
      self.storage.service_key = Some(key);
    }
    self
  }

  /// Sets the database path.
  pub fn with_database_path(mut self, path: &Path) -> Self {
    self.database_path = path.to_path_buf();
    self
  }

  /// Sets the root directory of the local object store.
  pub fn with_storage_root(mut self, path: &Path) -> Self {
    self.storage.root = path.to_path_buf();
    self
  }

  /// Checks that everything required to serve a request is present.
  ///
  /// Runs before any external call is made.
  pub fn validate(&self) -> Result<()> {
    if self.storage.bucket.trim().is_empty() {
      return Err(PaperwikiError::ConfigurationMissing("storage.bucket".into()));
    }
    if self.storage.backend == StorageBackend::Supabase {
      if self.storage.url.as_deref().map_or(true, |url| url.trim().is_empty()) {
        return Err(PaperwikiError::ConfigurationMissing(
          "storage.url (set PROJECT_URL or SUPABASE_URL)".into(),
        ));
      }
      if self.storage.service_key.as_deref().map_or(true, |key| key.trim().is_empty()) {
        return Err(PaperwikiError::ConfigurationMissing(
          "storage.service_key (set SERVICE_ROLE_KEY)".into(),
        ));
      }
    }
    Ok(())
  }
}
