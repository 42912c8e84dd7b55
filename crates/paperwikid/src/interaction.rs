//! Terminal output and prompts.

use console::style;
use dialoguer::Confirm;
use paperwiki::{document::Section, indexer::IndexResponse, record::PersistedRecord};

use super::*;

pub static INFO_PREFIX: &str = "ℹ ";
pub static SUCCESS_PREFIX: &str = "✓ ";
pub static WARNING_PREFIX: &str = "! ";
pub static PROMPT_PREFIX: &str = "❯ ";
pub static CONTINUE_PREFIX: &str = "│  ";
pub static TREE_BRANCH: &str = "├─";
pub static TREE_LEAF: &str = "└─";

/// Something to show the user.
#[derive(Debug)]
pub enum ResponseContent<'a> {
  /// The outcome of an indexing request
  Indexed(&'a IndexResponse),
  /// One stored record
  Record(&'a PersistedRecord),
  /// A listing of stored records
  Records(&'a [PersistedRecord]),
  Success(&'a str),
  Info(&'a str),
  Warning(&'a str),
}

/// How commands talk to the user.
pub trait UserInteraction {
  /// Asks a yes/no question.
  fn confirm(&self, message: &str) -> Result<bool>;
  /// Shows `content`.
  fn reply(&self, content: ResponseContent) -> Result<()>;
}

impl UserInteraction for Cli {
  fn confirm(&self, message: &str) -> Result<bool> {
    if self.accept_defaults {
      return Ok(true);
    }
    Ok(
      Confirm::new()
        .with_prompt(format!("{}{message}", style(PROMPT_PREFIX).cyan()))
        .default(false)
        .interact()?,
    )
  }

  fn reply(&self, content: ResponseContent) -> Result<()> {
    match content {
      ResponseContent::Indexed(response) => {
        if response.already_indexed {
          println!("{}{} is already indexed", style(INFO_PREFIX).blue(), response.data.arxiv_id);
        } else {
          println!(
            "{}Indexed {} with {}",
            style(SUCCESS_PREFIX).green(),
            style(&response.data.arxiv_id).yellow(),
            style(response.provider.as_deref().unwrap_or("stub")).cyan()
          );
        }
        for (provider, error) in &response.provider_errors {
          println!("{}{provider} failed: {}", style(WARNING_PREFIX).yellow(), style(error).dim());
        }
        print_record(&response.data);
      },
      ResponseContent::Record(record) => print_record(record),
      ResponseContent::Records(records) => {
        for record in records {
          println!(
            "{} {} {}",
            style(&record.arxiv_id).yellow(),
            style(&record.title).white().bold(),
            style(format!("[{}]", record.status)).dim()
          );
        }
      },
      ResponseContent::Success(message) => println!("{}{message}", style(SUCCESS_PREFIX).green()),
      ResponseContent::Info(message) => println!("{}{message}", style(INFO_PREFIX).blue()),
      ResponseContent::Warning(message) => println!("{}{message}", style(WARNING_PREFIX).yellow()),
    }
    Ok(())
  }
}

fn print_record(record: &PersistedRecord) {
  println!("\n{}", style(&record.title).green().bold());
  println!("   {} {}", style("arXiv:").green().bold(), record.arxiv_id);
  if !record.authors.is_empty() {
    println!("   {} {}", style("Authors:").green().bold(), record.authors.join(", "));
  }
  println!("   {} {}", style("Category:").green().bold(), record.category);
  println!("   {} {}", style("Published:").green().bold(), record.published);
  println!("   {} {}", style("PDF:").green().bold(), style(&record.pdf_url).blue().underlined());
  if let Some(last_indexed) = record.last_indexed {
    println!("   {} {}", style("Indexed:").green().bold(), last_indexed);
  }
  if let Some(document) = &record.wiki_content {
    println!("   {}", style("Sections:").green().bold());
    print_sections(&document.sections, "   ");
  }
}

fn print_sections(sections: &[Section], indent: &str) {
  for (i, section) in sections.iter().enumerate() {
    let last = i + 1 == sections.len();
    let branch = if last { TREE_LEAF } else { TREE_BRANCH };
    println!("{indent}{} {} {}", style(branch).dim(), section.title, style(&section.id).dim());
    let child_indent = format!("{indent}{}", if last { "   " } else { CONTINUE_PREFIX });
    print_sections(&section.children, &child_indent);
  }
}
