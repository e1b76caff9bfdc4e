//! Capitalization-based mention detection.
//!
//! Exploits the cheapest structural signal there is: runs of capitalized
//! tokens are candidate mentions. Sentence-initial function words are
//! skipped. Mentions carry no label and no score.

use super::MentionsExtractor;
use crate::document::Document;
use crate::{Result, Span};

// Capitalized only because they open a sentence.
const COMMON_SENTENCE_STARTERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "it", "he", "she", "we", "they", "i",
    "in", "on", "at", "to", "for", "but", "and", "or", "if", "when", "there",
];

const TRAILING_PUNCT: &[char] = &['.', ',', ';', ':', '!', '?', ')', '"', '\''];

/// Mentions = maximal runs of capitalized tokens.
#[derive(Debug, Clone, Default)]
pub struct CapitalizedMentionsExtractor;

impl CapitalizedMentionsExtractor {
    /// Create the extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn is_capitalized(token: &str) -> bool {
        token
            .chars()
            .find(|c| c.is_alphabetic())
            .is_some_and(char::is_uppercase)
    }

    fn ends_sentence(token: &str) -> bool {
        token.ends_with(['.', '!', '?'])
    }

    fn mentions(doc: &Document) -> Vec<Span> {
        let texts = doc.token_texts();
        let mut mentions = Vec::new();
        let mut run: Option<(usize, usize)> = None;
        let mut sentence_start = true;

        for (idx, text) in texts.iter().enumerate() {
            let starter = sentence_start
                && COMMON_SENTENCE_STARTERS.contains(&text.to_lowercase().trim_matches(TRAILING_PUNCT));
            let inside = Self::is_capitalized(text) && !starter;

            match (inside, run) {
                (true, None) => run = Some((idx, idx)),
                (true, Some((first, _))) => run = Some((first, idx)),
                (false, Some(r)) => {
                    mentions.extend(Self::to_span(doc, &texts, r));
                    run = None;
                }
                (false, None) => {}
            }

            // punctuation closes a run even when the next token is capitalized
            if Self::ends_sentence(text) || text.ends_with(',') {
                if let Some(r) = run.take() {
                    mentions.extend(Self::to_span(doc, &texts, r));
                }
            }
            sentence_start = Self::ends_sentence(text);
        }
        if let Some(r) = run {
            mentions.extend(Self::to_span(doc, &texts, r));
        }
        mentions
    }

    fn to_span(doc: &Document, texts: &[String], (first, last): (usize, usize)) -> Option<Span> {
        let (start, _) = doc.tokens.get(first)?;
        let (_, end) = doc.tokens.get(last)?;
        let trailing = texts[last].chars().rev().take_while(|c| TRAILING_PUNCT.contains(c)).count();
        let end = end.saturating_sub(trailing);
        (end > start).then(|| Span::new(start, end))
    }
}

impl MentionsExtractor for CapitalizedMentionsExtractor {
    fn name(&self) -> &str {
        "capitalized"
    }

    fn predict(&self, docs: &[Document]) -> Result<Vec<Vec<Span>>> {
        Ok(docs.iter().map(Self::mentions).collect())
    }
}
