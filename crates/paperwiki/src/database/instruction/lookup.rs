//! Read-only instructions.

use super::*;

/// Fetches the record of one canonical identifier.
#[derive(Debug, Clone)]
pub struct Lookup {
  arxiv_id: String,
}

impl Lookup {
  /// Looks up `arxiv_id`, which must already be canonical.
  pub fn by_arxiv_id(arxiv_id: &str) -> Self { Self { arxiv_id: arxiv_id.to_string() } }
}

#[async_trait]
impl DatabaseInstruction for Lookup {
  type Output = Option<PersistedRecord>;

  async fn execute(&self, db: &Database) -> Result<Self::Output> {
    let arxiv_id = self.arxiv_id.clone();
    let record = db
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare_cached(&format!("SELECT {RECORD_COLUMNS} FROM papers WHERE arxiv_id = ?1"))?;
        Ok(stmt.query_row(params![arxiv_id], record_from_row).optional()?)
      })
      .await?;

    trace!("Lookup of {} found a record: {}", self.arxiv_id, record.is_some());
    Ok(record)
  }
}

/// Lists records, most recently indexed first.
#[derive(Debug, Clone, Copy)]
pub struct List {
  limit: usize,
}

impl List {
  /// At most `limit` records.
  pub fn newest(limit: usize) -> Self { Self { limit } }
}

#[async_trait]
impl DatabaseInstruction for List {
  type Output = Vec<PersistedRecord>;

  async fn execute(&self, db: &Database) -> Result<Self::Output> {
    let limit = i64::try_from(self.limit).unwrap_or(i64::MAX);
    let records = db
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(&format!(
          "SELECT {RECORD_COLUMNS} FROM papers
           ORDER BY last_indexed IS NULL, last_indexed DESC, id DESC
           LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
      })
      .await?;
    Ok(records)
  }
}
