//! Reading quiz source text out of a page.

use thiserror::Error;
use tracing::{debug, info};

use crate::models::TextSource;

pub const DEFAULT_MAX_CHARS: usize = 10_000;

/// Stand-in text used when the selection is empty.
pub const NO_SELECTION_TEXT: &str = "No text highlighted.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Failed to extract text from the page.")]
    NoText,
}

/// What the host page exposes: its visible text and the current selection.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub body_text: String,
    pub selection: Option<String>,
}

impl PageContext {
    pub fn new(body_text: impl Into<String>) -> Self {
        Self {
            body_text: body_text.into(),
            selection: None,
        }
    }

    pub fn with_selection(mut self, selection: impl Into<String>) -> Self {
        self.selection = Some(selection.into());
        self
    }

    /// Raw text for `source`, trimmed. An empty selection reads as
    /// [`NO_SELECTION_TEXT`].
    pub fn read(&self, source: TextSource) -> Option<String> {
        let text = match source {
            TextSource::FullPage => self.body_text.trim(),
            TextSource::Selection => {
                let selected = self.selection.as_deref().unwrap_or("").trim();
                if selected.is_empty() {
                    NO_SELECTION_TEXT
                } else {
                    selected
                }
            }
        };
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

/// Text ready to be sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub truncated: bool,
}

/// Read `source` from the page and cap it at `max_chars` characters.
pub fn extract_text(
    page: &PageContext,
    source: TextSource,
    max_chars: usize,
) -> Result<ExtractedText, ExtractError> {
    let raw = page.read(source).ok_or(ExtractError::NoText)?;
    let (text, truncated) = truncate_chars(&raw, max_chars);

    if truncated {
        info!(max_chars, "text truncated");
    }
    debug!(source = source.label(), chars = text.chars().count(), "extracted page text");

    Ok(ExtractedText {
        text: text.to_string(),
        truncated,
    })
}

/// Cut `text` to at most `max_chars` characters without splitting a char.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => (&text[..byte_index], true),
        None => (text, false),
    }
}
