use base64::{engine::general_purpose::STANDARD, Engine};
use url::Url;

use super::*;
use crate::config::{ProviderConfig, DEFAULT_GEMINI_MODEL};

/// Default base URL of the Gemini API.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// Largest PDF sent inline with a request.
pub const MAX_INLINE_BYTES: usize = 20 * 1024 * 1024;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
  contents:          Vec<Content>,
  generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
  #[serde(default)]
  parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  inline_data: Option<InlineData>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  text:        Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
  mime_type: String,
  data:      String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  temperature:        f32,
  max_output_tokens:  u32,
  response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
  #[serde(default)]
  content: Content,
}

/// The Gemini `generateContent` API.
///
/// Unlike the other adapters, Gemini reads the PDF itself: when the asset is at most
/// [`MAX_INLINE_BYTES`] it is attached to the request as base64 inline data.
pub struct GeminiProvider {
  client:        reqwest::Client,
  api_key:       String,
  base_url:      String,
  default_model: String,
}

impl GeminiProvider {
  /// Creates an adapter using `api_key` against the public API.
  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      client:        reqwest::Client::new(),
      api_key:       api_key.into(),
      base_url:      GEMINI_BASE_URL.to_string(),
      default_model: DEFAULT_GEMINI_MODEL.to_string(),
    }
  }

  /// Sends requests to `base_url` instead of the public API.
  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into().trim_end_matches('/').to_string();
    self
  }

  /// Uses `model` when a request does not name one.
  pub fn with_model(mut self, model: impl Into<String>) -> Self {
    self.default_model = model.into();
    self
  }

  /// Builds the adapter if the configuration carries a credential.
  pub fn from_config(config: &ProviderConfig) -> Option<Self> {
    let api_key = config.api_key.as_deref().filter(|_| config.is_configured())?;
    let mut provider = Self::new(api_key);
    if let Some(base_url) = &config.base_url {
      provider = provider.with_base_url(base_url);
    }
    if let Some(model) = &config.model {
      provider = provider.with_model(model);
    }
    Some(provider)
  }

  fn parts(prompt: &PromptContext<'_>) -> Vec<Part> {
    let mut parts = Vec::new();
    match prompt.asset {
      Some(bytes) if bytes.len() <= MAX_INLINE_BYTES => parts.push(Part {
        inline_data: Some(InlineData {
          mime_type: "application/pdf".to_string(),
          data:      STANDARD.encode(bytes),
        }),
        text:        None,
      }),
      Some(bytes) => debug!("PDF of {} bytes is too large to send inline", bytes.len()),
      None => {},
    }
    parts.push(Part { inline_data: None, text: Some(prompt.instructions()) });
    parts
  }

  /// The `generateContent` URL of `model`, with the model name as one encoded path segment.
  fn endpoint(&self, model: &str) -> Result<Url> {
    let mut url = Url::parse(&self.base_url)?;
    url
      .path_segments_mut()
      .map_err(|_| {
        PaperwikiError::ProviderInvocation(format!("Gemini base URL {} cannot take a path", self.base_url))
      })?
      .pop_if_empty()
      .extend(["v1beta", "models", &format!("{model}:generateContent")]);
    Ok(url)
  }
}

#[async_trait]
impl Provider for GeminiProvider {
  fn name(&self) -> &str { ProviderKind::Gemini.as_str() }

  fn default_model(&self) -> &str { &self.default_model }

  async fn generate(&self, model: &str, prompt: &PromptContext<'_>) -> Result<String> {
    let body = GenerateRequest {
      contents:          vec![Content { parts: Self::parts(prompt) }],
      generation_config: GenerationConfig {
        temperature:        0.2,
        max_output_tokens:  2048,
        response_mime_type: "application/json",
      },
    };

    debug!("Requesting a document from Gemini model {model}");
    let request = self
      .client
      .post(self.endpoint(model)?)
      .header("x-goog-api-key", &self.api_key)
      .json(&body);
    let response: GenerateResponse = send_json("Gemini", request).await?;

    let text = response
      .candidates
      .into_iter()
      .next()
      .map(|candidate| {
        candidate
          .content
          .parts
          .into_iter()
          .filter_map(|part| part.text)
          .filter(|text| !text.is_empty())
          .collect::<Vec<_>>()
          .join("\n")
      })
      .unwrap_or_default();
    trace!("Gemini response text: {text}");
    Ok(text)
  }
}
