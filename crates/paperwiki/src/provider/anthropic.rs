use super::*;
use crate::config::{ProviderConfig, DEFAULT_ANTHROPIC_MODEL};

/// Default base URL of the Anthropic API.
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
/// Value of the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

lazy_static! {
  static ref VALID_MODEL: Regex =
    Regex::new(r"^(claude-3-(opus|sonnet|haiku)-\d{8}|claude-3-7-sonnet-\d{8})$").unwrap();
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
  model:      &'a str,
  max_tokens: u32,
  system:     &'a str,
  messages:   Vec<Message>,
}

#[derive(Serialize)]
struct Message {
  role:    &'static str,
  content: Vec<ContentBlock>,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
  Text {
    text: String,
  },
  #[serde(other)]
  Other,
}

#[derive(Deserialize)]
struct MessagesResponse {
  #[serde(default)]
  content: Vec<ContentBlock>,
}

/// The Anthropic messages API.
pub struct AnthropicProvider {
  client:        reqwest::Client,
  api_key:       String,
  base_url:      String,
  default_model: String,
}

impl AnthropicProvider {
  /// Creates an adapter using `api_key` against the public API.
  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      client:        reqwest::Client::new(),
      api_key:       api_key.into(),
      base_url:      ANTHROPIC_BASE_URL.to_string(),
      default_model: DEFAULT_ANTHROPIC_MODEL.to_string(),
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
    if !config.is_configured() {
      return None;
    }
    let mut provider = Self::new(config.api_key.clone().unwrap_or_default());
    if let Some(base_url) = &config.base_url {
      provider = provider.with_base_url(base_url);
    }
    if let Some(model) = &config.model {
      provider = provider.with_model(model);
    }
    Some(provider)
  }
}

#[async_trait]
impl Provider for AnthropicProvider {
  fn name(&self) -> &str { ProviderKind::Anthropic.as_str() }

  fn default_model(&self) -> &str { &self.default_model }

  fn validate(&self, model: &str) -> Result<()> {
    if VALID_MODEL.is_match(model) {
      Ok(())
    } else {
      Err(PaperwikiError::ProviderInvocation(format!("Invalid Anthropic model: {model}")))
    }
  }

  async fn generate(&self, model: &str, prompt: &PromptContext<'_>) -> Result<String> {
    let body = MessagesRequest {
      model,
      max_tokens: 2048,
      system: SYSTEM_PROMPT,
      messages: vec![Message {
        role:    "user",
        content: vec![ContentBlock::Text { text: prompt.instructions() }],
      }],
    };

    debug!("Requesting a document from Anthropic model {model}");
    let request = self
      .client
      .post(format!("{}/v1/messages", self.base_url))
      .header("x-api-key", &self.api_key)
      .header("anthropic-version", ANTHROPIC_VERSION)
      .json(&body);
    let response: MessagesResponse = send_json("Anthropic", request).await?;

    let text = response
      .content
      .into_iter()
      .filter_map(|block| match block {
        ContentBlock::Text { text } => Some(text),
        ContentBlock::Other => None,
      })
      .collect::<Vec<_>>()
      .join("\n");
    trace!("Anthropic response text: {text}");
    Ok(text)
  }
}
