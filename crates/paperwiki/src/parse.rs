//! Extraction of a [`GeneratedDocument`] from free-form backend output.
//!
//! Generation backends are asked for bare JSON but do not always comply: output may be wrapped
//! in prose, placed in a code fence, or both. Extraction runs an ordered list of [`Strategy`]s
//! and keeps the first one that yields valid JSON:
//!
//! 1. [`Strategy::Direct`]: the trimmed text parsed as is
//! 2. [`Strategy::Fenced`]: the interior of the first triple-backtick block
//! 3. [`Strategy::Bracketed`]: from the first `{` or `[` to the last matching closer
//!
//! The extracted value is then read as one of three shapes: an array of sections, an object
//! wrapping such an array under `sections`, or a legacy mapping of `{ key: { title, content } }`
//! where each key becomes the section id.
//!
//! # Examples
//!
//! ```
//! use paperwiki::parse::parse_document;
//!
//! let text = "Sure! ```json\n[{\"title\": \"Key Results\", \"content\": \"...\"}]\n```";
//! let document = parse_document(text).unwrap();
//! assert_eq!(document.sections[0].id, "key-results");
//! ```

use serde_json::Map;
use thiserror::Error;

use super::*;
use crate::document::Section;

lazy_static! {
  static ref FENCED_BLOCK: Regex = Regex::new(r"(?s)```[A-Za-z0-9_-]*\s*(.*?)\s*```").unwrap();
}

/// A way of locating JSON inside backend text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  /// The whole trimmed text
  Direct,
  /// The interior of a fenced code block
  Fenced,
  /// The span between the first opening bracket and the last matching closer
  Bracketed,
}

impl Strategy {
  /// Every strategy, in the order they are tried.
  pub const ORDER: [Strategy; 3] = [Strategy::Direct, Strategy::Fenced, Strategy::Bracketed];

  fn extract(self, text: &str) -> std::result::Result<Value, String> {
    let candidate = match self {
      Strategy::Direct => text,
      Strategy::Fenced => FENCED_BLOCK
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str())
        .ok_or("no fenced block")?,
      Strategy::Bracketed => bracketed(text).ok_or("no bracketed region")?,
    };
    serde_json::from_str(candidate).map_err(|e| e.to_string())
  }
}

impl Display for Strategy {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Strategy::Direct => write!(f, "direct"),
      Strategy::Fenced => write!(f, "fenced"),
      Strategy::Bracketed => write!(f, "bracketed"),
    }
  }
}

/// Why one strategy did not produce JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
  /// Strategy that was tried
  pub strategy: Strategy,
  /// What went wrong
  pub reason:   String,
}

/// Backend output that could not be turned into a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
  /// No strategy found valid JSON.
  #[error("no JSON found ({})", describe(.attempts))]
  NoJson {
    /// One entry per strategy, in the order tried
    attempts: Vec<Attempt>,
  },

  /// JSON was found but does not describe a list of sections.
  #[error("{strategy} JSON does not describe sections: {reason}")]
  Schema {
    /// Strategy that found the JSON
    strategy: Strategy,
    /// What is wrong with its shape
    reason:   String,
  },
}

fn describe(attempts: &[Attempt]) -> String {
  attempts.iter().map(|a| format!("{}: {}", a.strategy, a.reason)).collect::<Vec<_>>().join("; ")
}

/// Parses backend text into a document.
pub fn parse_document(text: &str) -> std::result::Result<GeneratedDocument, ParseError> {
  let (strategy, value) = extract_json(text)?;
  let sections = sections_from_value(&value).map_err(|reason| ParseError::Schema { strategy, reason })?;
  if sections.is_empty() {
    return Err(ParseError::Schema { strategy, reason: "no sections".into() });
  }
  Ok(GeneratedDocument::new(sections))
}

/// Finds the first JSON value in `text`, reporting which strategy found it.
pub fn extract_json(text: &str) -> std::result::Result<(Strategy, Value), ParseError> {
  let trimmed = text.trim();
  let mut attempts = Vec::new();
  for strategy in Strategy::ORDER {
    match strategy.extract(trimmed) {
      Ok(value) => {
        trace!("Extracted JSON with the {strategy} strategy");
        return Ok((strategy, value));
      },
      Err(reason) => attempts.push(Attempt { strategy, reason }),
    }
  }
  debug!("No JSON in backend output: {}", describe(&attempts));
  Err(ParseError::NoJson { attempts })
}

/// The span from the first opening bracket to the last closer of the same kind.
fn bracketed(text: &str) -> Option<&str> {
  let (start, opener) = text.char_indices().find(|(_, c)| *c == '{' || *c == '[')?;
  let closer = if opener == '{' { '}' } else { ']' };
  let end = text.rfind(closer)?;
  (end > start).then(|| &text[start..=end])
}

fn sections_from_value(value: &Value) -> std::result::Result<Vec<Section>, String> {
  match value {
    Value::Array(items) => items.iter().map(|item| section(item, None)).collect(),
    Value::Object(map) => match map.get("sections") {
      Some(Value::Array(items)) => items.iter().map(|item| section(item, None)).collect(),
      Some(_) => Err("`sections` is not an array".into()),
      None => map.iter().map(|(key, item)| mapped_section(key, item)).collect(),
    },
    other => Err(format!("expected an array or an object, found {}", kind(other))),
  }
}

/// Reads one entry of a legacy mapping, which must be an object with a title or content.
fn mapped_section(key: &str, value: &Value) -> std::result::Result<Section, String> {
  match value {
    Value::Object(object) if object.contains_key("title") || object.contains_key("content") =>
      section(value, Some(key)),
    Value::Object(_) => Err(format!("`{key}` has neither a title nor content")),
    other => Err(format!("`{key}` is {}, not a section object", kind(other))),
  }
}

/// Reads one section. `key` is the mapping key of a legacy-shaped document.
fn section(value: &Value, key: Option<&str>) -> std::result::Result<Section, String> {
  let Value::Object(object) = value else {
    return Err(format!("expected a section object, found {}", kind(value)));
  };

  let title = text_field(object, "title");
  let id = text_field(object, "id")
    .or_else(|| key.map(str::to_string).filter(|k| !k.trim().is_empty()))
    .or_else(|| title.as_deref().map(|t| format::slugify(t, None)).filter(|slug| !slug.is_empty()))
    .ok_or("section has neither an id nor a usable title")?;
  let title = title.unwrap_or_else(|| id.clone());

  let content = match object.get("content") {
    None | Some(Value::Null) => None,
    Some(Value::String(content)) => Some(content.clone()),
    Some(other) => Some(other.to_string()),
  };

  let children = match object.get("children") {
    None | Some(Value::Null) => Vec::new(),
    Some(Value::Array(items)) =>
      items.iter().map(|item| section(item, None)).collect::<std::result::Result<_, _>>()?,
    Some(other) => return Err(format!("`children` of {id} is {}, not an array", kind(other))),
  };

  Ok(Section { id, title, content, children })
}

/// A trimmed, non-empty string or number field.
fn text_field(object: &Map<String, Value>, name: &str) -> Option<String> {
  match object.get(name)? {
    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

fn kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}
