//! Generation backends.
//!
//! A generation backend turns a prompt describing a paper into free-form text that is expected to
//! encode a [`GeneratedDocument`]. Every backend implements [`Provider`], so the synthesis
//! orchestrator sees only a list of trait objects. Three adapters are provided:
//!
//! - [`AnthropicProvider`]: the Anthropic messages API
//! - [`OpenAiProvider`]: the OpenAI chat completions API
//! - [`GeminiProvider`]: the Gemini `generateContent` API, which also receives the PDF inline
//!
//! Adapters never retry. Any failure, whether network, status or body, is reported as
//! [`PaperwikiError::ProviderInvocation`] so the orchestrator can move on to the next backend.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use super::*;
use crate::{config::ProvidersConfig, format::truncate_chars, identifier::CanonicalId};

pub mod anthropic;
pub mod gemini;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// System prompt shared by the backends that accept one.
pub const SYSTEM_PROMPT: &str =
  "You are a strict JSON formatter. Output ONLY a JSON object. No code fences. No prose.";

/// Longest error body kept in a failure message.
const MAX_ERROR_BODY: usize = 2000;

/// The known generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
  /// Anthropic messages API
  Anthropic,
  /// OpenAI chat completions API
  OpenAi,
  /// Gemini generateContent API
  Gemini,
}

impl ProviderKind {
  /// Default candidate order.
  pub const PRIORITY: [ProviderKind; 3] =
    [ProviderKind::Anthropic, ProviderKind::OpenAi, ProviderKind::Gemini];

  /// Name used in requests, responses and `providerErrors`.
  pub fn as_str(&self) -> &'static str {
    match self {
      ProviderKind::Anthropic => "anthropic",
      ProviderKind::OpenAi => "openai",
      ProviderKind::Gemini => "gemini",
    }
  }
}

impl Display for ProviderKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ProviderKind {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    ProviderKind::PRIORITY
      .into_iter()
      .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| format!("unknown provider {s:?}, expected one of anthropic, openai, gemini"))
  }
}

/// Everything a backend needs to write about one paper.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
  /// Bibliographic metadata
  pub record:    &'a BibliographicRecord,
  /// Canonical identifier
  pub id:        &'a CanonicalId,
  /// Public URL of the cached PDF
  pub asset_url: &'a str,
  /// PDF bytes, for backends that read them
  pub asset:     Option<&'a [u8]>,
}

impl PromptContext<'_> {
  /// The user prompt describing the paper and the expected JSON shape.
  pub fn instructions(&self) -> String {
    let record = self.record;
    let authors =
      if record.authors.is_empty() { "(unknown)".to_string() } else { record.authors.join(", ") };
    format!(
      r#"Generate a concise wiki-style analysis of this arXiv paper as JSON.
Return an object {{"sections": [...]}} where each section is {{"id": "...", "title": "...", "content": "markdown"}} and may carry nested "children" of the same shape.
Use these section ids in order: overview, methodology, results, theoretical, impact, related.
Be factual and concise.

Title: {title}
arXiv: {id}
Category: {category}
Authors: {authors}
Published: {published}
Abstract: {abstract_text}
PDF: {asset_url}

Output VALID JSON ONLY."#,
      title = record.title,
      id = self.id,
      category = record.category,
      published = record.published,
      abstract_text = record.abstract_text,
      asset_url = self.asset_url,
    )
  }
}

/// A generation backend.
///
/// # Examples
///
/// ```no_run
/// use paperwiki::{error::Result, provider::{PromptContext, Provider}};
///
/// struct Canned;
///
/// #[async_trait::async_trait]
/// impl Provider for Canned {
///   fn name(&self) -> &str { "canned" }
///
///   fn default_model(&self) -> &str { "v1" }
///
///   async fn generate(&self, _model: &str, _prompt: &PromptContext<'_>) -> Result<String> {
///     Ok(r#"[{"title": "Overview", "content": "..."}]"#.to_string())
///   }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
  /// Name used in `providerErrors` and as the winning `provider` of a response.
  fn name(&self) -> &str;

  /// Model used when a request does not override it.
  fn default_model(&self) -> &str;

  /// Checks backend-specific preconditions on the model before any call is made.
  fn validate(&self, _model: &str) -> Result<()> { Ok(()) }

  /// Asks the backend to write a document and returns its raw text.
  async fn generate(&self, model: &str, prompt: &PromptContext<'_>) -> Result<String>;
}

/// Builds every credentialed backend, in [`ProviderKind::PRIORITY`] order.
pub fn from_config(providers: &ProvidersConfig) -> Vec<Arc<dyn Provider>> {
  let mut configured: Vec<Arc<dyn Provider>> = Vec::new();
  if let Some(provider) = AnthropicProvider::from_config(&providers.anthropic) {
    configured.push(Arc::new(provider));
  }
  if let Some(provider) = OpenAiProvider::from_config(&providers.openai) {
    configured.push(Arc::new(provider));
  }
  if let Some(provider) = GeminiProvider::from_config(&providers.gemini) {
    configured.push(Arc::new(provider));
  }
  debug!("Configured providers: {:?}", configured.iter().map(|p| p.name()).collect::<Vec<_>>());
  configured
}

/// Sends a request and decodes a successful JSON body.
///
/// `label` prefixes failure messages, e.g. `OpenAI 429: {body}`.
async fn send_json<T: DeserializeOwned>(label: &str, request: RequestBuilder) -> Result<T> {
  let response = request
    .send()
    .await
    .map_err(|e| {
      PaperwikiError::ProviderInvocation(format!("{label} request failed: {}", e.without_url()))
    })?;
  let status = response.status();
  let body = response
    .text()
    .await
    .map_err(|e| {
      PaperwikiError::ProviderInvocation(format!("{label} body unreadable: {}", e.without_url()))
    })?;

  if !status.is_success() {
    return Err(PaperwikiError::ProviderInvocation(format!(
      "{label} {}: {}",
      status.as_u16(),
      truncate_chars(&body, MAX_ERROR_BODY)
    )));
  }

  serde_json::from_str(&body).map_err(|e| {
    PaperwikiError::ProviderInvocation(format!(
      "{label} returned an unexpected body ({e}): {}",
      truncate_chars(&body, MAX_ERROR_BODY)
    ))
  })
}

#[cfg(test)]
pub(crate) fn sample_record() -> BibliographicRecord {
  BibliographicRecord {
    title:         "Paper".into(),
    abstract_text: "Abstract text".into(),
    authors:       vec![],
    category:      "cs.LG".into(),
    published:     "Unknown".into(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ProviderConfig;

  #[test]
  fn test_provider_kind() {
    assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
    assert_eq!(ProviderKind::Gemini.to_string(), "gemini");
    assert!("mistral".parse::<ProviderKind>().is_err());
    assert_eq!(serde_json::to_string(&ProviderKind::OpenAi).unwrap(), r#""openai""#);
    assert_eq!(serde_json::from_str::<ProviderKind>(r#""anthropic""#).unwrap(), ProviderKind::Anthropic);
  }

  #[test]
  fn test_from_config_keeps_priority_order() {
    let key = |k: &str| ProviderConfig { api_key: Some(k.into()), ..ProviderConfig::default() };
    let providers = ProvidersConfig { anthropic: ProviderConfig::default(), openai: key("sk"), gemini: key("g") };

    let names: Vec<String> = from_config(&providers).iter().map(|p| p.name().to_string()).collect();
    assert_eq!(names, ["openai", "gemini"]);

    assert!(from_config(&ProvidersConfig::default()).is_empty());
  }

  #[test]
  fn test_instructions_embed_record() {
    let record = sample_record();
    let id = CanonicalId::parse("2301.07041");
    let prompt = PromptContext { record: &record, id: &id, asset_url: "https://x/a.pdf", asset: None };
    let text = prompt.instructions();
    assert!(text.contains("Title: Paper"));
    assert!(text.contains("arXiv: 2301.07041"));
    assert!(text.contains("Category: cs.LG"));
    assert!(text.contains("Authors: (unknown)"));
    assert!(text.contains("PDF: https://x/a.pdf"));
    assert!(text.contains(r#"{"sections": [...]}"#));
  }
}
