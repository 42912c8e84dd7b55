use super::*;

/// Function for the [`Commands::List`] in the CLI.
pub async fn list(cli: &Cli, limit: usize, json: bool) -> Result<()> {
  let config = cli.load_config()?;
  let db = Database::open(&config.database_path).await?;
  let records = List::newest(limit).execute(&db).await?;

  if json {
    println!("{}", serde_json::to_string_pretty(&records)?);
  } else if records.is_empty() {
    cli.reply(ResponseContent::Info("No papers indexed yet"))?;
  } else {
    cli.reply(ResponseContent::Records(&records))?;
  }
  Ok(())
}
