//! Documents flowing through the pipeline.

use crate::offset::TokenOffsets;
use crate::{RelationSpan, Span};
use serde::{Deserialize, Serialize};

/// A tokenized text plus everything the pipeline attaches to it.
///
/// Offsets everywhere are character offsets into `text`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Raw text.
    pub text: String,
    /// Reference tokenization.
    pub tokens: TokenOffsets,
    /// Untyped candidate spans from a mentions extractor.
    #[serde(default)]
    pub mentions: Vec<Span>,
    /// Raw linker predictions, possibly overlapping.
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Non-overlapping, token-aligned entities.
    #[serde(default)]
    pub entities: Vec<Span>,
    /// Relations between entities.
    #[serde(default)]
    pub relations: Vec<RelationSpan>,
}

impl Document {
    /// Tokenize `text` on whitespace.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let tokens = TokenOffsets::from_whitespace(&text);
        Self {
            text,
            tokens,
            ..Self::default()
        }
    }

    /// Rebuild a document from pre-split tokens joined by `join_by`.
    #[must_use]
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S], join_by: &str) -> Self {
        let text = tokens
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(join_by);
        Self {
            text,
            tokens: TokenOffsets::from_tokens(tokens, join_by),
            ..Self::default()
        }
    }

    /// Text covered by character offsets `[start, end)`.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.text
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect()
    }

    /// Text covered by `span`.
    #[must_use]
    pub fn span_text(&self, span: &Span) -> String {
        self.slice(span.start, span.end)
    }

    /// Token texts, in order.
    #[must_use]
    pub fn token_texts(&self) -> Vec<String> {
        self.tokens
            .iter()
            .map(|(start, end)| self.slice(start, end))
            .collect()
    }

    /// Length of the text in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
