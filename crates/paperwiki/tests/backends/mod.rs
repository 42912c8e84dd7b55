use paperwiki::config::ProviderConfig;
use serde_json::json;

use super::*;

fn with_backends(harness: &Harness) -> Config {
  let mut config = harness.config();
  let backend = |key: &str| ProviderConfig {
    api_key:  Some(key.to_string()),
    model:    None,
    base_url: Some(harness.server.url()),
  };
  config.providers.anthropic = backend("sk-ant");
  config.providers.openai = backend("sk-openai");
  config.providers.gemini = backend("gemini-key");
  config
}

async fn mock_openai(harness: &mut Harness, model: &str, content: &str, hits: usize) -> Mock {
  harness
    .server
    .mock("POST", "/chat/completions")
    .match_header("authorization", "Bearer sk-openai")
    .match_body(Matcher::PartialJson(json!({ "model": model })))
    .with_status(200)
    .with_body(json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] }).to_string())
    .expect(hits)
    .create_async()
    .await
}

async fn mock_anthropic(harness: &mut Harness, status: usize, body: &str, hits: usize) -> Mock {
  harness
    .server
    .mock("POST", "/v1/messages")
    .match_header("x-api-key", "sk-ant")
    .with_status(status)
    .with_body(body)
    .expect(hits)
    .create_async()
    .await
}

#[traced_test]
#[tokio::test]
async fn test_fallback_across_configured_backends() -> TestResult<()> {
  let mut harness = Harness::new().await;
  let _feed = harness.mock_feed(FEED, 1).await;
  let _pdf = harness.mock_pdf(1).await;
  let anthropic = mock_anthropic(&mut harness, 529, "overloaded", 1).await;
  let openai = mock_openai(&mut harness, "gpt-4o-mini", "Sorry, no JSON today.", 1).await;
  let fenced = format!("Sure!\n```json\n{DOCUMENT}\n```");
  let gemini = harness
    .server
    .mock("POST", "/v1beta/models/gemini-2.5-pro:generateContent")
    .match_header("x-goog-api-key", "gemini-key")
    .match_body(Matcher::PartialJson(json!({
      "contents": [{ "parts": [{ "inlineData": { "mimeType": "application/pdf" } }] }]
    })))
    .with_status(200)
    .with_body(json!({ "candidates": [{ "content": { "parts": [{ "text": fenced }] } }] }).to_string())
    .expect(1)
    .create_async()
    .await;

  let indexer = Indexer::builder().with_config(with_backends(&harness)).build().await?;
  let response = indexer.index(&IndexRequest::new(ARXIV_ID)).await?;

  assert_eq!(response.provider.as_deref(), Some("gemini"));
  assert_eq!(response.provider_errors["anthropic"], "Anthropic 529: overloaded");
  assert!(response.provider_errors["openai"].starts_with("Invalid generation output: no JSON found"));
  assert_eq!(response.data.wiki_content.unwrap().sections[0].content.as_deref(), Some("Verifiable FHE."));

  anthropic.assert_async().await;
  openai.assert_async().await;
  gemini.assert_async().await;
  Ok(())
}

#[tokio::test]
async fn test_explicit_backend_and_model_override() -> TestResult<()> {
  let mut harness = Harness::new().await;
  let _feed = harness.mock_feed(FEED, 1).await;
  let _pdf = harness.mock_pdf(1).await;
  let anthropic = mock_anthropic(&mut harness, 200, "{}", 0).await;
  let openai = mock_openai(&mut harness, "gpt-4o", DOCUMENT, 1).await;

  let indexer = Indexer::builder().with_config(with_backends(&harness)).build().await?;
  let request: IndexRequest = serde_json::from_value(json!({
    "arxiv_id": format!("https://arxiv.org/abs/{ARXIV_ID}v2"),
    "provider": "openai",
    "openai_model": "gpt-4o",
  }))?;
  let response = indexer.index(&request).await?;

  assert_eq!(response.provider.as_deref(), Some("openai"));
  assert!(response.provider_errors.is_empty());

  anthropic.assert_async().await;
  openai.assert_async().await;
  Ok(())
}

#[tokio::test]
async fn test_invalid_anthropic_model_is_not_sent() -> TestResult<()> {
  let mut harness = Harness::new().await;
  let _feed = harness.mock_feed(FEED, 1).await;
  let _pdf = harness.mock_pdf(1).await;
  let anthropic = mock_anthropic(&mut harness, 200, "{}", 0).await;
  let openai = mock_openai(&mut harness, "gpt-4o-mini", DOCUMENT, 1).await;

  let indexer = Indexer::builder().with_config(with_backends(&harness)).build().await?;
  let mut request = IndexRequest::new(ARXIV_ID);
  request.anthropic_model = Some("claude-2.1".into());
  let response = indexer.index(&request).await?;

  assert_eq!(response.provider.as_deref(), Some("openai"));
  assert_eq!(response.provider_errors["anthropic"], "Invalid Anthropic model: claude-2.1");

  anthropic.assert_async().await;
  openai.assert_async().await;
  Ok(())
}
