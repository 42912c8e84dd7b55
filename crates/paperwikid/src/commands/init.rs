//! Writing a fresh configuration file.

use super::*;

#[derive(Args, Clone)]
pub struct InitOptions {
  /// Where the SQLite database is kept
  #[arg(long)]
  pub database_path: Option<PathBuf>,
  /// Root directory of the local object store
  #[arg(long)]
  pub storage_root:  Option<PathBuf>,
}

/// Function for the [`Commands::Init`] in the CLI.
///
/// API keys are never written; they are read from the environment at run time.
pub async fn init(cli: &Cli, options: InitOptions) -> Result<()> {
  let path = cli.config_path()?;

  if path.exists()
    && !cli.confirm(&format!(
      "A configuration already exists at {}, do you want to overwrite it?",
      path.display()
    ))?
  {
    cli.reply(ResponseContent::Info("Keeping the existing configuration"))?;
    return Ok(());
  }

  let mut config = Config::default();
  if let Some(database_path) = &options.database_path {
    config = config.with_database_path(database_path);
  }
  if let Some(storage_root) = &options.storage_root {
    config = config.with_storage_root(storage_root);
  }
  config.save(&path)?;
  Database::open(&config.database_path).await?;

  cli.reply(ResponseContent::Success(&format!(
    "Wrote configuration to {}\nDatabase path: {}\nObject storage: {}",
    path.display(),
    config.database_path.display(),
    config.storage.root.display(),
  )))?;
  cli.reply(ResponseContent::Info(
    "Set ANTHROPIC_API_KEY, OPENAI_API_KEY or GEMINI_API_KEY to enable generation backends",
  ))?;
  Ok(())
}
