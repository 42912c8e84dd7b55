//! SQLite persistence of indexed papers.
//!
//! Every operation on the database is expressed as a [`DatabaseInstruction`] and runs on the
//! connection's background thread, so callers never block the async runtime.
//!
//! The schema holds one row per canonical identifier. Authors and the generated document are
//! stored as JSON text, timestamps as RFC 3339 strings.
//!
//! # Examples
//!
//! ```no_run
//! use paperwiki::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open(Database::default_path()).await?;
//! for record in List::newest(10).execute(&db).await? {
//!   println!("{} ({})", record.title, record.arxiv_id);
//! }
//! # Ok(())
//! # }
//! ```

use rusqlite::{types::Type, Row};
use tokio_rusqlite::Connection;

use super::*;

pub mod instruction;

pub use self::instruction::*;

/// Columns selected for a [`PersistedRecord`], in the order [`record_from_row`] reads them.
const RECORD_COLUMNS: &str = "arxiv_id, title, authors, abstract, category, published, pdf_url, \
                              wiki_content, status, last_indexed, created_at";

/// Handle on the papers database.
pub struct Database {
  conn: Connection,
}

impl Database {
  /// Opens the database at `path`, creating it and its parent directory if needed.
  ///
  /// The schema is applied on every open and is idempotent.
  ///
  /// # Examples
  ///
  /// ```no_run
  /// # use paperwiki::database::Database;
  /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
  /// let db = Database::open("papers.db").await?;
  /// # Ok(())
  /// # }
  /// ```
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(parent).await?;
    }
    let conn = Connection::open(path).await?;

    conn
      .call(|conn| {
        conn.execute_batch(include_str!(concat!(
          env!("CARGO_MANIFEST_DIR"),
          "/migrations/init.sql"
        )))?;
        Ok(())
      })
      .await?;

    debug!("Opened database at {}", path.display());
    Ok(Self { conn })
  }

  /// Returns the default path for the database file.
  ///
  /// - On Unix: `~/.local/share/paperwiki/paperwiki.db`
  /// - On macOS: `~/Library/Application Support/paperwiki/paperwiki.db`
  /// - On Windows: `%APPDATA%\paperwiki\paperwiki.db`
  /// - Fallback: `./paperwiki/paperwiki.db`
  pub fn default_path() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("paperwiki").join("paperwiki.db")
  }
}

fn conversion_failure(
  index: usize,
  e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
  rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
}

fn timestamp(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
  row
    .get::<_, Option<String>>(index)?
    .map(|s| {
      DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_failure(index, e))
    })
    .transpose()
}

/// Reads a row selected with [`RECORD_COLUMNS`].
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<PersistedRecord> {
  let authors: String = row.get(2)?;
  let wiki_content: Option<String> = row.get(7)?;
  let status: String = row.get(8)?;

  Ok(PersistedRecord {
    arxiv_id:      row.get(0)?,
    title:         row.get(1)?,
    authors:       serde_json::from_str(&authors).map_err(|e| conversion_failure(2, e))?,
    abstract_text: row.get(3)?,
    category:      row.get(4)?,
    published:     row.get(5)?,
    pdf_url:       row.get(6)?,
    wiki_content:  wiki_content
      .map(|json| serde_json::from_str(&json))
      .transpose()
      .map_err(|e| conversion_failure(7, e))?,
    status:        status.parse().map_err(|e: PaperwikiError| conversion_failure(8, e))?,
    last_indexed:  timestamp(row, 9)?,
    created_at:    timestamp(row, 10)?,
  })
}
