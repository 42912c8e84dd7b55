use super::*;

/// Function for the [`Commands::Serve`] in the CLI.
///
/// Runs until interrupted with Ctrl-C.
pub async fn serve(cli: &Cli, addr: SocketAddr) -> Result<()> {
  let indexer = Arc::new(Indexer::builder().with_config(cli.load_config()?).build().await?);
  let listener = tokio::net::TcpListener::bind(addr).await?;
  info!("Listening on {}", listener.local_addr()?);
  cli.reply(ResponseContent::Success(&format!("Serving on http://{addr}")))?;

  axum::serve(listener, server::router(indexer))
    .with_graceful_shutdown(async {
      if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
      }
      info!("Shutting down");
    })
    .await?;
  Ok(())
}
