//! Indexing a paper from the command line.

use super::*;

#[derive(Args, Clone)]
pub struct IndexOptions {
  /// Paper identifier in any accepted form
  pub identifier:      String,
  /// Re-run the pipeline even if the paper is already indexed
  #[arg(long)]
  pub force:           bool,
  /// Backend to try first (anthropic, openai, gemini)
  #[arg(long)]
  pub provider:        Option<ProviderKind>,
  /// Model override for the Anthropic backend
  #[arg(long)]
  pub anthropic_model: Option<String>,
  /// Model override for the OpenAI backend
  #[arg(long)]
  pub openai_model:    Option<String>,
  /// Model override for the Gemini backend
  #[arg(long)]
  pub gemini_model:    Option<String>,
  /// Print the full response, including the request trace, as JSON
  #[arg(long)]
  pub json:            bool,
}

impl From<IndexOptions> for IndexRequest {
  fn from(options: IndexOptions) -> Self {
    IndexRequest {
      arxiv_id:        options.identifier,
      force:           options.force,
      provider:        options.provider,
      openai_model:    options.openai_model,
      gemini_model:    options.gemini_model,
      anthropic_model: options.anthropic_model,
      debug:           options.json,
    }
  }
}

/// Function for the [`Commands::Index`] in the CLI.
pub async fn index(cli: &Cli, options: IndexOptions) -> Result<()> {
  let json = options.json;
  let indexer = Indexer::builder().with_config(cli.load_config()?).build().await?;
  let request = IndexRequest::from(options);

  match indexer.respond(&request).await {
    Ok(response) if json => println!("{}", serde_json::to_string_pretty(&response)?),
    Ok(response) => cli.reply(ResponseContent::Indexed(&response))?,
    Err(failure) => {
      if json {
        println!("{}", serde_json::to_string_pretty(&failure)?);
      }
      return Err(PaperwikidError::Indexing(failure.error));
    },
  }
  Ok(())
}
