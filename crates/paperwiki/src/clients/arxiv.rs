use quick_xml::de::from_str;

use super::*;
use crate::{format::collapse_whitespace, identifier::CanonicalId};

/// Category used when an entry carries none.
pub const DEFAULT_CATEGORY: &str = "Computer Science";
/// Publication date used when an entry carries none.
pub const UNKNOWN_PUBLISHED: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct Feed {
  #[serde(rename = "entry", default)]
  entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
  #[serde(default)]
  title:      String,
  #[serde(default)]
  summary:    String,
  #[serde(default)]
  published:  String,
  #[serde(rename = "author", default)]
  authors:    Vec<Author>,
  #[serde(rename = "category", default)]
  categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct Author {
  #[serde(default)]
  name: String,
}

#[derive(Debug, Deserialize)]
struct Category {
  #[serde(rename = "@term")]
  term: String,
}

/// Bibliographic metadata of a paper.
///
/// Fetched fresh on every indexing run; only the persisted record keeps a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographicRecord {
  /// Title, never empty
  pub title:         String,
  /// Abstract
  #[serde(rename = "abstract")]
  pub abstract_text: String,
  /// Author names in publication order
  pub authors:       Vec<String>,
  /// Primary category, or [`DEFAULT_CATEGORY`]
  pub category:      String,
  /// Publication timestamp as given by the service, or [`UNKNOWN_PUBLISHED`]
  pub published:     String,
}

/// Client for the arXiv Atom query API.
pub struct ArxivClient {
  client:  reqwest::Client,
  api_url: String,
}

impl ArxivClient {
  /// Creates a new [`ArxivClient`] querying `api_url`.
  pub fn new(api_url: impl Into<String>) -> Self {
    Self { client: reqwest::Client::new(), api_url: api_url.into() }
  }

  /// Fetches the record of `id`.
  ///
  /// # Errors
  ///
  /// - [`PaperwikiError::ApiError`] if the service answers with a non-2xx status or unreadable XML
  /// - [`PaperwikiError::MetadataNotFound`] if the feed has no entry or the entry has no title
  /// - [`PaperwikiError::Timeout`] if the call outlives its deadline
  pub async fn fetch(&self, id: &CanonicalId, deadline: &Deadline) -> Result<BibliographicRecord> {
    debug!("Fetching from arXiv via: {}?id_list={id}", self.api_url);

    let body = deadline
      .bound("arXiv metadata request", async {
        let response =
          self.client.get(&self.api_url).query(&[("id_list", id.as_str())]).send().await?;
        let status = response.status();
        if !status.is_success() {
          return Err(PaperwikiError::ApiError(format!("arXiv API failed: {}", status.as_u16())));
        }
        Ok(response.text().await?)
      })
      .await?;

    trace!("arXiv response: {body}");
    parse_feed(&body, id)
  }
}

/// Reads the first entry of an Atom feed.
pub fn parse_feed(xml: &str, id: &CanonicalId) -> Result<BibliographicRecord> {
  let feed: Feed =
    from_str(xml).map_err(|e| PaperwikiError::ApiError(format!("Failed to parse XML: {e}")))?;

  let entry = feed.entries.into_iter().next().ok_or_else(|| {
    warn!("No <entry> found in arXiv response for {id}");
    PaperwikiError::MetadataNotFound(id.to_string())
  })?;

  let title = collapse_whitespace(&entry.title);
  if title.is_empty() {
    warn!("arXiv entry for {id} has no title");
    return Err(PaperwikiError::MetadataNotFound(id.to_string()));
  }

  let published = entry.published.trim();
  Ok(BibliographicRecord {
    title,
    abstract_text: collapse_whitespace(&entry.summary),
    authors: entry
      .authors
      .iter()
      .map(|author| collapse_whitespace(&author.name))
      .filter(|name| !name.is_empty())
      .collect(),
    category: entry
      .categories
      .first()
      .map(|category| category.term.trim().to_string())
      .filter(|term| !term.is_empty())
      .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
    published: if published.is_empty() { UNKNOWN_PUBLISHED.to_string() } else { published.to_string() },
  })
}
