//! The persisted form of an indexed paper.

use super::*;

/// Lifecycle state of a [`PersistedRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  /// Created but not yet indexed
  #[default]
  Pending,
  /// Indexed; the record carries a document
  Cached,
  /// Indexing failed
  Failed,
}

impl Status {
  /// Database representation.
  pub fn as_str(&self) -> &'static str {
    match self {
      Status::Pending => "pending",
      Status::Cached => "cached",
      Status::Failed => "failed",
    }
  }
}

impl Display for Status {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Status {
  type Err = PaperwikiError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "pending" => Ok(Status::Pending),
      "cached" => Ok(Status::Cached),
      "failed" => Ok(Status::Failed),
      other => Err(PaperwikiError::Storage(format!("unknown record status {other:?}"))),
    }
  }
}

/// One indexed paper, as stored in the database and returned to callers.
///
/// There is exactly one record per canonical identifier. A record with [`Status::Cached`] always
/// carries a document, which may be the stub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
  /// Canonical identifier
  pub arxiv_id:      String,
  /// Title
  pub title:         String,
  /// Author names in publication order
  pub authors:       Vec<String>,
  /// Abstract
  #[serde(rename = "abstract")]
  pub abstract_text: String,
  /// Primary category
  pub category:      String,
  /// Publication timestamp as given by the bibliographic service
  pub published:     String,
  /// Public URL of the cached PDF
  pub pdf_url:       String,
  /// The analytical document
  pub wiki_content:  Option<GeneratedDocument>,
  /// Lifecycle state
  pub status:        Status,
  /// When the document was last written
  pub last_indexed:  Option<DateTime<Utc>>,
  /// When the record was first written; set by the database
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at:    Option<DateTime<Utc>>,
}

impl PersistedRecord {
  /// A freshly indexed record.
  pub fn cached(
    id: &str,
    record: BibliographicRecord,
    pdf_url: String,
    document: GeneratedDocument,
  ) -> Self {
    Self {
      arxiv_id: id.to_string(),
      title: record.title,
      authors: record.authors,
      abstract_text: record.abstract_text,
      category: record.category,
      published: record.published,
      pdf_url,
      wiki_content: Some(document),
      status: Status::Cached,
      last_indexed: Some(Utc::now()),
      created_at: None,
    }
  }
}
