use super::*;

#[tokio::test]
async fn test_concurrent_requests_share_one_record() -> TestResult<()> {
  let mut harness = Harness::new().await;
  let _feed = harness.mock_feed(FEED, 2).await;
  let _pdf = harness.mock_pdf(2).await;
  let backend = ScriptedProvider::ok("openai", DOCUMENT);
  let indexer = Arc::new(harness.indexer(vec![backend.clone()]).await);

  let mut request = IndexRequest::new(ARXIV_ID);
  request.force = true;
  let (a, b) = tokio::join!(indexer.index(&request), indexer.index(&request));

  assert_eq!(a?.data.arxiv_id, ARXIV_ID);
  assert_eq!(b?.data.arxiv_id, ARXIV_ID);
  assert_eq!(backend.calls(), 2);

  let stored = List::newest(10).execute(indexer.database()).await?;
  assert_eq!(stored.len(), 1);
  let objects = std::fs::read_dir(harness.dir.path().join("objects").join("papers"))?
    .filter_map(|entry| entry.ok())
    .filter(|entry| entry.file_name() == "2301.07041.pdf")
    .count();
  assert_eq!(objects, 1);
  Ok(())
}
