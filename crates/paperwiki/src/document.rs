//! The analytical document written for a paper.
//!
//! A [`GeneratedDocument`] is an ordered list of [`Section`]s. Sections carry a slug id, a title,
//! optional markdown content and optional nested children of the same shape. Documents are
//! stored as JSON in the `wiki_content` column and serialize as a bare array of sections.

use super::*;
use crate::identifier::CanonicalId;

/// One section of a [`GeneratedDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
  /// Slug identifying the section within its document
  pub id:       String,
  /// Human-readable heading
  pub title:    String,
  /// Markdown body
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content:  Option<String>,
  /// Nested subsections
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub children: Vec<Section>,
}

impl Section {
  /// A leaf section with content.
  pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
    Self { id: id.into(), title: title.into(), content: Some(content.into()), children: Vec::new() }
  }

  /// Adds a child section.
  pub fn with_child(mut self, child: Section) -> Self {
    self.children.push(child);
    self
  }
}

/// An ordered list of sections describing one paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct GeneratedDocument {
  /// Top-level sections in display order
  pub sections: Vec<Section>,
}

impl GeneratedDocument {
  /// Wraps a list of sections.
  pub fn new(sections: Vec<Section>) -> Self { Self { sections } }

  /// The placeholder written when no generation backend produced a usable document.
  ///
  /// Its content is derived only from the bibliographic record, so the same paper always yields
  /// the same stub.
  pub fn stub(record: &BibliographicRecord, id: &CanonicalId) -> Self {
    let (title, category) = (&record.title, &record.category);
    let overview = format!("Concise analysis of \"{title}\" (arXiv:{id}) in {category}.");
    let impact = format!("Implications for {category} research and practice.");
    Self::new(vec![
      Section::new("overview", "Overview", overview),
      Section::new("methodology", "Methodology and Approach", "Problem setup, assumptions, experiments."),
      Section::new("results", "Results and Analysis", "Key results and comparisons to prior work."),
      Section::new("theoretical", "Theoretical Foundations", "Core formalism and reasoning."),
      Section::new("impact", "Impact and Significance", impact),
      Section::new("related", "Related Work and Context", "Positioning in the literature and notable refs."),
    ])
  }

  /// Looks up a top-level section by id.
  pub fn section(&self, id: &str) -> Option<&Section> { self.sections.iter().find(|s| s.id == id) }

  /// Whether the document has no sections.
  pub fn is_empty(&self) -> bool { self.sections.is_empty() }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn record() -> BibliographicRecord {
    BibliographicRecord {
      title:         "Attention Is All You Need".into(),
      abstract_text: "We propose the Transformer.".into(),
      authors:       vec!["Ashish Vaswani".into()],
      category:      "cs.CL".into(),
      published:     "2017-06-12T17:57:34Z".into(),
    }
  }

  #[test]
  fn test_stub_sections() {
    let stub = GeneratedDocument::stub(&record(), &CanonicalId::parse("1706.03762"));
    let ids: Vec<&str> = stub.sections.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["overview", "methodology", "results", "theoretical", "impact", "related"]);
    assert_eq!(
      stub.section("overview").and_then(|s| s.content.as_deref()),
      Some("Concise analysis of \"Attention Is All You Need\" (arXiv:1706.03762) in cs.CL.")
    );
    assert_eq!(
      stub.section("impact").and_then(|s| s.content.as_deref()),
      Some("Implications for cs.CL research and practice.")
    );
  }

  #[test]
  fn test_stub_is_deterministic() {
    let id = CanonicalId::parse("1706.03762");
    assert_eq!(GeneratedDocument::stub(&record(), &id), GeneratedDocument::stub(&record(), &id));
  }

  #[test]
  fn test_serializes_as_array() {
    let doc = GeneratedDocument::new(vec![Section::new("intro", "Intro", "Hello")
      .with_child(Section { id: "bg".into(), title: "Background".into(), content: None, children: vec![] })]);
    assert_eq!(
      serde_json::to_value(&doc).unwrap(),
      json!([{ "id": "intro", "title": "Intro", "content": "Hello", "children": [{ "id": "bg", "title": "Background" }] }])
    );
  }
}
