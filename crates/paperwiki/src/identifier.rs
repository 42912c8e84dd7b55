//! Canonicalization of arXiv identifiers.
//!
//! Users paste identifiers in many shapes. All of the following name the same paper and normalize
//! to `2301.07041`:
//!
//! - `2301.07041`
//! - `2301.07041v2`
//! - `arXiv:2301.07041`
//! - `2301.07041.pdf`
//! - `https://arxiv.org/abs/2301.07041v2`
//! - `https://arxiv.org/pdf/2301.07041v1.pdf`
//!
//! # Examples
//!
//! ```
//! use paperwiki::identifier::{normalize, CanonicalId};
//!
//! assert_eq!(normalize("https://arxiv.org/abs/2301.07041v2"), "2301.07041");
//! assert_eq!(CanonicalId::parse("arXiv:2301.07041").as_str(), "2301.07041");
//! ```

use url::Url;

use super::*;

lazy_static! {
  static ref ARXIV_PREFIX: Regex = Regex::new(r"(?i)^arxiv:").unwrap();
  static ref PDF_SUFFIX: Regex = Regex::new(r"(?i)\.pdf$").unwrap();
  static ref VERSION_SUFFIX: Regex = Regex::new(r"(?i)v\d+$").unwrap();
}

/// A normalized paper identifier, the key used by storage and the database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(String);

impl CanonicalId {
  /// Normalizes `input` into a canonical identifier. See [`normalize`].
  pub fn parse(input: &str) -> Self { Self(normalize(input)) }

  /// The identifier as a string slice.
  pub fn as_str(&self) -> &str { &self.0 }

  /// The deterministic object path of this paper's PDF (`<id>.pdf`).
  pub fn asset_path(&self) -> String { format!("{}.pdf", self.0) }
}

impl Display for CanonicalId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

/// Normalizes an arbitrary identifier string.
///
/// URLs contribute the path segment right after an `abs` or `pdf` segment. The result then has an
/// `arxiv:` prefix, a `.pdf` suffix and a `vN` version suffix removed. A URL that cannot be parsed
/// is not an error: the trimmed input is used as is.
///
/// The function is idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(input: &str) -> String {
  let trimmed = input.trim();
  let candidate = match extract_from_url(trimmed) {
    Ok(Some(id)) => id,
    Ok(None) => trimmed.to_string(),
    Err(e) => {
      warn!("{e}, using the input as given");
      trimmed.to_string()
    },
  };
  strip_decorations(&candidate)
}

/// Pulls the identifier segment out of an abstract or PDF URL.
///
/// Returns `Ok(None)` when the input is not a URL or has no `abs`/`pdf` segment.
fn extract_from_url(input: &str) -> Result<Option<String>> {
  if !input.contains("://") {
    return Ok(None);
  }

  let url =
    Url::parse(input).map_err(|e| PaperwikiError::IdentifierMalformed(format!("{input}: {e}")))?;

  let segments: Vec<&str> =
    url.path_segments().map(|s| s.filter(|p| !p.is_empty()).collect()).unwrap_or_default();

  let id = segments
    .iter()
    .position(|segment| *segment == "abs" || *segment == "pdf")
    .and_then(|idx| segments.get(idx + 1))
    .map(|segment| PDF_SUFFIX.replace(segment, "").into_owned());

  trace!("Extracted {id:?} from URL {input}");
  Ok(id)
}

/// Removes prefixes and suffixes until none is left.
fn strip_decorations(id: &str) -> String {
  let mut current = id.trim().to_string();
  loop {
    let next = ARXIV_PREFIX.replace(&current, "");
    let next = PDF_SUFFIX.replace(&next, "");
    let next = VERSION_SUFFIX.replace(&next, "").trim().to_string();
    if next == current {
      return current;
    }
    current = next;
  }
}
