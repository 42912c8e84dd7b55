//! Ordered fallback across generation backends.
//!
//! The [`Synthesizer`] tries its backends one after another and keeps the first document that
//! parses. A backend that fails, for whatever reason, is recorded in
//! [`SynthesisOutcome::errors`] and never retried. When no backend succeeds the outcome carries
//! the stub document, so synthesis itself never fails.

use serde_json::json;

use super::*;
use crate::{
  identifier::CanonicalId,
  parse::parse_document,
  provider::{PromptContext, Provider, ProviderKind},
};

/// Name reported as the `provider` of a stub document.
pub const STUB_PROVIDER: &str = "stub";

/// Result of a synthesis run.
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
  /// The winning document, or the stub
  pub document: GeneratedDocument,
  /// Name of the backend that wrote `document`, `None` for the stub
  pub provider: Option<String>,
  /// Failure message of every backend tried before the winner
  pub errors:   BTreeMap<String, String>,
}

impl SynthesisOutcome {
  /// The backend name as reported to callers: the winner or [`STUB_PROVIDER`].
  pub fn provider_label(&self) -> &str { self.provider.as_deref().unwrap_or(STUB_PROVIDER) }
}

/// A candidate backend, or the name of one that was requested but is not configured.
enum Candidate {
  Ready(Arc<dyn Provider>),
  Missing(String),
}

/// Drives an ordered list of generation backends.
#[derive(Clone, Default)]
pub struct Synthesizer {
  providers: Vec<Arc<dyn Provider>>,
}

impl Synthesizer {
  /// Creates a synthesizer over `providers`, tried in the given order unless a request names one.
  pub fn new(providers: Vec<Arc<dyn Provider>>) -> Self { Self { providers } }

  /// Names of the configured backends, in order.
  pub fn provider_names(&self) -> Vec<&str> { self.providers.iter().map(|p| p.name()).collect() }

  /// The order in which backends are tried.
  ///
  /// An explicit backend goes first, followed by the remaining configured ones. An explicit
  /// backend without configuration stays in the list as a failing candidate.
  fn candidates(&self, explicit: Option<ProviderKind>) -> Vec<Candidate> {
    let Some(explicit) = explicit else {
      return self.providers.iter().cloned().map(Candidate::Ready).collect();
    };

    let name = explicit.as_str();
    let first = match self.providers.iter().find(|p| p.name() == name) {
      Some(provider) => Candidate::Ready(provider.clone()),
      None => Candidate::Missing(name.to_string()),
    };
    std::iter::once(first)
      .chain(self.providers.iter().filter(|p| p.name() != name).cloned().map(Candidate::Ready))
      .collect()
  }

  /// Produces a document for the paper described by `prompt`.
  ///
  /// `models` maps backend names to model overrides; backends without an entry use their
  /// default model.
  pub async fn synthesize(
    &self,
    prompt: &PromptContext<'_>,
    explicit: Option<ProviderKind>,
    models: &BTreeMap<String, String>,
    deadline: &Deadline,
    trace: &mut TraceLog,
  ) -> SynthesisOutcome {
    let candidates = self.candidates(explicit);
    let order: Vec<&str> = candidates
      .iter()
      .map(|c| match c {
        Candidate::Ready(provider) => provider.name(),
        Candidate::Missing(name) => name.as_str(),
      })
      .collect();
    trace.note_with("provider order", json!({ "providersToTry": order }));

    let mut errors = BTreeMap::new();
    for candidate in &candidates {
      let provider = match candidate {
        Candidate::Ready(provider) => provider,
        Candidate::Missing(name) => {
          let message = format!("{name} is not configured");
          trace.note_with("provider error", json!({ "provider": name, "error": message }));
          errors.insert(name.clone(), message);
          continue;
        },
      };

      let name = provider.name();
      let model = models.get(name).map(String::as_str).unwrap_or_else(|| provider.default_model());
      match self.attempt(provider.as_ref(), model, prompt, deadline).await {
        Ok(document) => {
          info!("Document for {} written by {name} ({model})", prompt.id);
          trace.note_with("provider chosen", json!({ "pick": name, "model": model }));
          return SynthesisOutcome { document, provider: Some(name.to_string()), errors };
        },
        Err(e) => {
          let message = e.to_string();
          warn!("Provider {name} failed: {message}");
          trace.note_with("provider error", json!({ "provider": name, "error": message }));
          errors.insert(name.to_string(), message);
        },
      }
    }

    info!("No provider produced a document for {}, using the stub", prompt.id);
    trace.note("using stub document");
    SynthesisOutcome {
      document: GeneratedDocument::stub(prompt.record, prompt.id),
      provider: None,
      errors,
    }
  }

  async fn attempt(
    &self,
    provider: &dyn Provider,
    model: &str,
    prompt: &PromptContext<'_>,
    deadline: &Deadline,
  ) -> Result<GeneratedDocument> {
    provider.validate(model)?;
    let label = format!("{} generation", provider.name());
    let text = deadline.bound(&label, provider.generate(model, prompt)).await?;
    Ok(parse_document(&text)?)
  }
}

/// Scripted backends for unit tests.
#[cfg(test)]
pub(crate) mod fake {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
  };

  use super::*;

  /// A backend answering with a scripted reply and counting its calls.
  pub struct FakeProvider {
    pub name:  &'static str,
    pub reply: std::result::Result<String, String>,
    pub calls: AtomicUsize,
    pub seen:  Mutex<Vec<String>>,
  }

  impl FakeProvider {
    pub fn ok(name: &'static str, text: &str) -> Arc<Self> {
      Arc::new(Self { name, reply: Ok(text.to_string()), calls: AtomicUsize::new(0), seen: Mutex::default() })
    }

    pub fn failing(name: &'static str, message: &str) -> Arc<Self> {
      Arc::new(Self {
        name,
        reply: Err(message.to_string()),
        calls: AtomicUsize::new(0),
        seen: Mutex::default(),
      })
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
  }

  #[async_trait]
  impl Provider for FakeProvider {
    fn name(&self) -> &str { self.name }

    fn default_model(&self) -> &str { "fake-model" }

    async fn generate(&self, model: &str, _prompt: &PromptContext<'_>) -> Result<String> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if let Ok(mut seen) = self.seen.lock() {
        seen.push(model.to_string());
      }
      self.reply.clone().map_err(PaperwikiError::ProviderInvocation)
    }
  }
}
