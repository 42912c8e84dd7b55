//! Text formatting utilities.
//!
//! Helpers for turning free text into stable identifiers and for tidying text that arrives from
//! external services: section titles become slugs, XML text nodes get their whitespace collapsed,
//! and long error bodies are clipped before they end up in a response.
//!
//! # Examples
//!
//! ```
//! use paperwiki::format;
//!
//! assert_eq!(format::slugify("Methodology and Approach", None), "methodology-and-approach");
//! assert_eq!(format::collapse_whitespace("  Attention \n  Is All\tYou Need "), "Attention Is All You Need");
//! ```

/// Turns a title into a lowercase, hyphen-separated slug.
///
/// Every run of characters that are not ASCII alphanumerics becomes a single word boundary. The
/// slug is truncated at word boundaries to `max_length` characters (default 50).
///
/// ```
/// use paperwiki::format;
///
/// assert_eq!(format::slugify("Results & Analysis", None), "results-analysis");
/// assert_eq!(format::slugify("This Is A Very Long Title Indeed", Some(20)), "this-is-a-very-long");
/// ```
pub fn slugify(title: &str, max_length: Option<usize>) -> String {
  let lowered = title.to_lowercase();
  let words: Vec<&str> =
    lowered.split(|c: char| !c.is_ascii_alphanumeric()).filter(|w| !w.is_empty()).collect();

  let max_length = max_length.unwrap_or(50);
  let mut result = String::new();

  for (i, word) in words.iter().enumerate() {
    let needed = if i > 0 { word.len() + 1 } else { word.len() };
    if result.len() + needed > max_length {
      // Keep at least a prefix of the first word so the slug is never empty
      if i == 0 {
        result.push_str(&word[..max_length.min(word.len())]);
      }
      break;
    }
    if i > 0 {
      result.push('-');
    }
    result.push_str(word);
  }

  result
}

/// Collapses every run of whitespace into a single space and trims both ends.
pub fn collapse_whitespace(text: &str) -> String { text.split_whitespace().collect::<Vec<_>>().join(" ") }

/// Clips `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
  match text.char_indices().nth(max_chars) {
    Some((idx, _)) => &text[..idx],
    None => text,
  }
}
