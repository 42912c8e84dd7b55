//! Write instructions.

use chrono::SecondsFormat;

use super::*;

/// Inserts a record, or replaces every field of the existing record with the same identifier.
///
/// `created_at` is kept from the first write. The stored row is returned as read back from the
/// database.
#[derive(Debug, Clone)]
pub struct Upsert<'a> {
  record: &'a PersistedRecord,
}

impl<'a> Upsert<'a> {
  /// Writes `record`.
  pub fn record(record: &'a PersistedRecord) -> Self { Self { record } }
}

#[async_trait]
impl DatabaseInstruction for Upsert<'_> {
  type Output = PersistedRecord;

  async fn execute(&self, db: &Database) -> Result<Self::Output> {
    let record = self.record;
    let arxiv_id = record.arxiv_id.clone();
    let title = record.title.clone();
    let authors = serde_json::to_string(&record.authors)?;
    let abstract_text = record.abstract_text.clone();
    let category = record.category.clone();
    let published = record.published.clone();
    let pdf_url = record.pdf_url.clone();
    let wiki_content = record.wiki_content.as_ref().map(serde_json::to_string).transpose()?;
    let status = record.status.as_str();
    let last_indexed = record.last_indexed.map(|t| t.to_rfc3339_opts(SecondsFormat::Micros, true));

    let stored = db
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(&format!(
          "INSERT INTO papers (arxiv_id, title, authors, abstract, category, published, pdf_url,
                               wiki_content, status, last_indexed)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
           ON CONFLICT(arxiv_id) DO UPDATE SET
             title = excluded.title,
             authors = excluded.authors,
             abstract = excluded.abstract,
             category = excluded.category,
             published = excluded.published,
             pdf_url = excluded.pdf_url,
             wiki_content = excluded.wiki_content,
             status = excluded.status,
             last_indexed = excluded.last_indexed
           RETURNING {RECORD_COLUMNS}"
        ))?;
        Ok(stmt.query_row(
          params![
            arxiv_id,
            title,
            authors,
            abstract_text,
            category,
            published,
            pdf_url,
            wiki_content,
            status,
            last_indexed
          ],
          record_from_row,
        )?)
      })
      .await?;

    info!("Stored record for {} ({})", stored.arxiv_id, stored.status);
    Ok(stored)
  }
}
