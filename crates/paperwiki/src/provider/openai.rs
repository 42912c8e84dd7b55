use serde_json::json;

use super::*;
use crate::config::{ProviderConfig, DEFAULT_OPENAI_MODEL};

/// Default base URL of the OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct ChatRequest<'a> {
  model:           &'a str,
  temperature:     f32,
  response_format: Value,
  messages:        Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
  role:    String,
  #[serde(default)]
  content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: ChatMessage,
}

/// The OpenAI chat completions API, in JSON-object response mode.
pub struct OpenAiProvider {
  client:        reqwest::Client,
  api_key:       String,
  base_url:      String,
  default_model: String,
}

impl OpenAiProvider {
  /// Creates an adapter using `api_key` against the public API.
  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      client:        reqwest::Client::new(),
      api_key:       api_key.into(),
      base_url:      OPENAI_BASE_URL.to_string(),
      default_model: DEFAULT_OPENAI_MODEL.to_string(),
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
}

#[async_trait]
impl Provider for OpenAiProvider {
  fn name(&self) -> &str { ProviderKind::OpenAi.as_str() }

  fn default_model(&self) -> &str { &self.default_model }

  async fn generate(&self, model: &str, prompt: &PromptContext<'_>) -> Result<String> {
    let body = ChatRequest {
      model,
      temperature: 0.2,
      response_format: json!({ "type": "json_object" }),
      messages: vec![
        ChatMessage { role: "system".into(), content: Some(SYSTEM_PROMPT.into()) },
        ChatMessage { role: "user".into(), content: Some(prompt.instructions()) },
      ],
    };

    debug!("Requesting a document from OpenAI model {model}");
    let request = self
      .client
      .post(format!("{}/chat/completions", self.base_url))
      .bearer_auth(&self.api_key)
      .json(&body);
    let response: ChatResponse = send_json("OpenAI", request).await?;

    let text = response
      .choices
      .into_iter()
      .next()
      .and_then(|choice| choice.message.content)
      .unwrap_or_default();
    trace!("OpenAI response text: {text}");
    Ok(text)
  }
}

#[cfg(test)]
mod tests {
  use mockito::Matcher;

  use super::*;

  #[tokio::test]
  async fn test_generate_reads_first_choice() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/chat/completions")
      .match_header("authorization", "Bearer sk-test")
      .match_body(Matcher::PartialJson(json!({
        "model": "gpt-4o-mini",
        "response_format": { "type": "json_object" },
      })))
      .with_status(200)
      .with_body(
        json!({
          "choices": [{ "index": 0, "message": { "role": "assistant", "content": "{\"sections\": []}" } }]
        })
        .to_string(),
      )
      .expect(1)
      .create_async()
      .await;

    let record = sample_record();
    let id = CanonicalId::parse("1234.5678");
    let prompt = PromptContext { record: &record, id: &id, asset_url: "u", asset: None };

    let provider = OpenAiProvider::new("sk-test").with_base_url(server.url());
    assert_eq!(provider.default_model(), "gpt-4o-mini");
    let text = provider.generate(provider.default_model(), &prompt).await.unwrap();
    assert_eq!(text, "{\"sections\": []}");
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_error_body_is_truncated() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/chat/completions")
      .with_status(429)
      .with_body("x".repeat(5000))
      .create_async()
      .await;

    let record = sample_record();
    let id = CanonicalId::parse("1234.5678");
    let prompt = PromptContext { record: &record, id: &id, asset_url: "u", asset: None };

    let provider = OpenAiProvider::new("sk-test").with_base_url(server.url());
    match provider.generate("gpt-4o-mini", &prompt).await {
      Err(PaperwikiError::ProviderInvocation(msg)) => {
        assert!(msg.starts_with("OpenAI 429: xxx"));
        assert_eq!(msg.len(), "OpenAI 429: ".len() + 2000);
      },
      other => panic!("unexpected result {other:?}"),
    }
  }

  #[test]
  fn test_from_config_requires_key() {
    assert!(OpenAiProvider::from_config(&ProviderConfig::default()).is_none());
    let config = ProviderConfig { api_key: Some("sk".into()), model: Some("gpt-4o".into()), base_url: None };
    assert_eq!(OpenAiProvider::from_config(&config).unwrap().default_model(), "gpt-4o");
  }
}
