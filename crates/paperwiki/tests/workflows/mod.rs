use paperwiki::{database::List, record::Status, synthesis::STUB_PROVIDER};

use super::*;

mod concurrency;

#[traced_test]
#[tokio::test]
async fn test_first_successful_backend_wins() -> TestResult<()> {
  let mut harness = Harness::new().await;
  let _feed = harness.mock_feed(FEED, 1).await;
  let _pdf = harness.mock_pdf(1).await;

  let a = ScriptedProvider::failing("anthropic", "Anthropic 500: internal error");
  let b = ScriptedProvider::ok("openai", "I cannot help with that.");
  let c = ScriptedProvider::ok("gemini", DOCUMENT);
  let indexer = harness.indexer(vec![a.clone(), b.clone(), c.clone()]).await;

  let response = indexer.index(&IndexRequest::new(ARXIV_ID)).await?;

  assert!(response.ok);
  assert_eq!(response.provider.as_deref(), Some("gemini"));
  assert_eq!(response.provider_errors.len(), 2);
  assert_eq!(response.provider_errors["anthropic"], "Anthropic 500: internal error");
  assert!(response.provider_errors["openai"].starts_with("Invalid generation output"));

  let document = response.data.wiki_content.as_ref().unwrap();
  assert_eq!(document.sections.len(), 2);
  assert_eq!(document.sections[1].id, "methodology-and-approach");
  assert_eq!(document.sections[1].children[0].id, "threat-model");

  assert_eq!(response.data.status, Status::Cached);
  assert_eq!(response.data.title, "Verifiable Fully Homomorphic Encryption");
  assert_eq!(response.data.authors.len(), 3);
  assert_eq!(response.data.category, "cs.CR");
  assert!(response.data.pdf_url.ends_with("/papers/2301.07041.pdf"));
  assert!(response.data.last_indexed.is_some());
  assert_eq!((a.calls(), b.calls(), c.calls()), (1, 1, 1));
  Ok(())
}

#[tokio::test]
async fn test_no_backends_yields_stub() -> TestResult<()> {
  let mut harness = Harness::new().await;
  let _feed = harness.mock_feed(FEED, 1).await;
  let _pdf = harness.mock_pdf(1).await;
  let indexer = harness.indexer(Vec::new()).await;

  let response = indexer.index(&IndexRequest::new(ARXIV_ID)).await?;

  assert!(response.ok);
  assert_eq!(response.provider.as_deref(), Some(STUB_PROVIDER));
  assert!(response.provider_errors.is_empty());
  let document = response.data.wiki_content.unwrap();
  let ids: Vec<&str> = document.sections.iter().map(|s| s.id.as_str()).collect();
  assert_eq!(ids, ["overview", "methodology", "results", "theoretical", "impact", "related"]);
  assert!(document.sections[0].content.as_deref().unwrap().contains("in cs.CR"));
  Ok(())
}

#[tokio::test]
async fn test_all_backends_failing_yields_stub() -> TestResult<()> {
  let mut harness = Harness::new().await;
  let _feed = harness.mock_feed(FEED, 1).await;
  let _pdf = harness.mock_pdf(1).await;
  let indexer = harness
    .indexer(vec![
      ScriptedProvider::failing("anthropic", "Anthropic 401: invalid x-api-key"),
      ScriptedProvider::ok("gemini", "```json\n[]\n```"),
    ])
    .await;

  let response = indexer.index(&IndexRequest::new(ARXIV_ID)).await?;

  assert_eq!(response.provider.as_deref(), Some("stub"));
  assert_eq!(response.provider_errors.keys().collect::<Vec<_>>(), ["anthropic", "gemini"]);
  assert_eq!(response.data.status, Status::Cached);
  assert_eq!(response.data.wiki_content.unwrap().sections.len(), 6);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_second_request_is_served_from_database() -> TestResult<()> {
  let mut harness = Harness::new().await;
  let feed = harness.mock_feed(FEED, 1).await;
  let pdf = harness.mock_pdf(1).await;
  let backend = ScriptedProvider::ok("anthropic", DOCUMENT);
  let indexer = harness.indexer(vec![backend.clone()]).await;

  let first = indexer.index(&IndexRequest::new(format!("https://arxiv.org/pdf/{ARXIV_ID}v2.pdf"))).await?;
  assert!(!first.already_indexed);

  let mut request = IndexRequest::new(format!("arXiv:{ARXIV_ID}"));
  request.debug = true;
  let second = indexer.index(&request).await?;

  assert!(second.already_indexed);
  assert!(second.provider.is_none());
  assert_eq!(second.data, first.data);
  assert_eq!(backend.calls(), 1);
  let trace = second.debug.unwrap();
  assert!(trace.contains("already indexed"));
  assert!(!trace.contains("metadata"));

  feed.assert_async().await;
  pdf.assert_async().await;
  Ok(())
}

#[tokio::test]
async fn test_forced_request_regenerates_without_download() -> TestResult<()> {
  let mut harness = Harness::new().await;
  let feed = harness.mock_feed(FEED, 2).await;
  let pdf = harness.mock_pdf(1).await;

  let first = harness
    .indexer(vec![ScriptedProvider::ok("openai", r#"[{"title": "First"}]"#)])
    .await
    .index(&IndexRequest::new(ARXIV_ID))
    .await?;
  assert_eq!(first.data.wiki_content.unwrap().sections[0].title, "First");

  let backend = ScriptedProvider::ok("gemini", r#"Here you go: [{"title": "Second"}] Enjoy!"#);
  let indexer = harness.indexer(vec![backend.clone()]).await;
  let mut request = IndexRequest::new(ARXIV_ID);
  request.force = true;
  request.debug = true;
  let second = indexer.index(&request).await?;

  assert!(!second.already_indexed);
  assert_eq!(second.provider.as_deref(), Some("gemini"));
  assert_eq!(second.data.wiki_content.as_ref().unwrap().sections[0].title, "Second");
  assert_eq!(second.data.created_at, first.data.created_at);
  assert!(second.debug.unwrap().contains("pdf found in storage"));
  assert_eq!(backend.calls(), 1);

  let stored = List::newest(10).execute(indexer.database()).await?;
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0], second.data);

  feed.assert_async().await;
  pdf.assert_async().await;
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_missing_entry_writes_nothing() -> TestResult<()> {
  let mut harness = Harness::new().await;
  let _feed = harness.mock_feed(EMPTY_FEED, 1).await;
  let pdf = harness.mock_pdf(0).await;
  let backend = ScriptedProvider::ok("anthropic", DOCUMENT);
  let indexer = harness.indexer(vec![backend.clone()]).await;

  let result = indexer.index(&IndexRequest::new(ARXIV_ID)).await;

  assert!(matches!(result, Err(PaperwikiError::MetadataNotFound(id)) if id == ARXIV_ID));
  assert!(List::newest(10).execute(indexer.database()).await?.is_empty());
  assert!(Lookup::by_arxiv_id(ARXIV_ID).execute(indexer.database()).await?.is_none());
  assert_eq!(backend.calls(), 0);
  pdf.assert_async().await;
  Ok(())
}

#[tokio::test]
async fn test_origin_failure_is_fatal() -> TestResult<()> {
  let mut harness = Harness::new().await;
  let _feed = harness.mock_feed(FEED, 1).await;
  let _pdf = harness
    .server
    .mock("GET", format!("/pdf/{ARXIV_ID}.pdf").as_str())
    .with_status(404)
    .create_async()
    .await;
  let indexer = harness.indexer(Vec::new()).await;

  let failure = indexer.respond(&IndexRequest::new(ARXIV_ID)).await.unwrap_err();

  assert_eq!(failure.status, 500);
  assert_eq!(failure.error, "PDF download failed: 404");
  let trace = failure.debug.unwrap();
  assert!(trace.contains("metadata"));
  assert!(trace.contains("fatal error"));
  assert!(List::newest(10).execute(indexer.database()).await?.is_empty());
  Ok(())
}

#[tokio::test]
async fn test_missing_identifier_is_rejected() -> TestResult<()> {
  let harness = Harness::new().await;
  let indexer = harness.indexer(Vec::new()).await;

  let request: IndexRequest = serde_json::from_str(r#"{"force": true}"#)?;
  let failure = indexer.respond(&request).await.unwrap_err();

  assert_eq!(failure.status, 400);
  assert_eq!(serde_json::to_value(&failure)?["error"], "Missing arxiv_id");
  Ok(())
}
