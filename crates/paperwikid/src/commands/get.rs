use super::*;

/// Function for the [`Commands::Get`] in the CLI.
pub async fn get(cli: &Cli, identifier: &str, json: bool) -> Result<()> {
  let config = cli.load_config()?;
  let db = Database::open(&config.database_path).await?;
  let id = CanonicalId::parse(identifier);

  match Lookup::by_arxiv_id(id.as_str()).execute(&db).await? {
    Some(record) if json => println!("{}", serde_json::to_string_pretty(&record)?),
    Some(record) => cli.reply(ResponseContent::Record(&record))?,
    None => cli.reply(ResponseContent::Warning(&format!("{id} is not indexed")))?,
  }
  Ok(())
}
