//! Token offsets and token-index spans.
//!
//! # Two Coordinate Systems
//!
//! Backends report character offsets into the original text. Ground truth
//! and BIO tags live on tokens. Everything in this crate meets in the
//! middle through a per-token table of half-open character intervals:
//!
//! ```text
//! tokens:    ["New", "York", "is", "beautiful"]   join_by = " "
//!
//! chars:     N e w _ Y o r k _ i s _ b e a u t i f u l
//!            0 1 2 3 4 5 6 7 8 9 ...
//!
//! offsets:   (0,3)  (4,8)  (9,11)  (12,21)
//!             tok0   tok1   tok2    tok3
//! ```
//!
//! Offsets are derived by cumulative length: token `i` starts at the sum of
//! every earlier token's length plus one separator per earlier token.
//! Lengths are counted in characters so derived offsets agree with the
//! character offsets backends emit.
//!
//! This module provides:
//! - [`TokenOffsets`]: the per-token interval table
//! - [`TokenSpan`]: a labelled run of tokens (the host framework's span)
//! - [`ReferenceSpanExt`]: conversion between [`Span`] and [`TokenSpan`]

use crate::align::AlignmentMode;
use crate::{Error, Result, Span};
use serde::{Deserialize, Serialize};

/// Character interval `(start, end)` of every token, in token order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenOffsets {
    offsets: Vec<(usize, usize)>,
}

impl TokenOffsets {
    /// Wrap explicit offsets.
    #[must_use]
    pub fn new(offsets: Vec<(usize, usize)>) -> Self {
        Self { offsets }
    }

    /// Derive offsets from token texts joined by `join_by`.
    ///
    /// ```rust
    /// use zeroner::offset::TokenOffsets;
    ///
    /// let offsets = TokenOffsets::from_tokens(&["--", "--", "--"], " ");
    /// assert_eq!(offsets.as_slice(), &[(0, 2), (3, 5), (6, 8)]);
    /// ```
    #[must_use]
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S], join_by: &str) -> Self {
        let sep = join_by.chars().count();
        let mut cursor = 0;
        let offsets = tokens
            .iter()
            .map(|token| {
                let start = cursor;
                let end = start + token.as_ref().chars().count();
                cursor = end + sep;
                (start, end)
            })
            .collect();
        Self { offsets }
    }

    /// Whitespace tokenization of `text`, in character offsets.
    #[must_use]
    pub fn from_whitespace(text: &str) -> Self {
        let mut offsets = Vec::new();
        let mut start = None;
        for (idx, ch) in text.chars().enumerate() {
            match (ch.is_whitespace(), start) {
                (true, Some(s)) => {
                    offsets.push((s, idx));
                    start = None;
                }
                (false, None) => start = Some(idx),
                _ => {}
            }
        }
        if let Some(s) = start {
            offsets.push((s, text.chars().count()));
        }
        Self { offsets }
    }

    /// Pick the offset source for `tokens`.
    ///
    /// Non-empty explicit offsets win; otherwise offsets are derived from
    /// `tokens` and `join_by`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] when neither source is available, or when the
    /// explicit offsets do not have one entry per token.
    pub fn resolve<S: AsRef<str>>(
        tokens: &[S],
        offsets: Option<&[(usize, usize)]>,
        join_by: Option<&str>,
    ) -> Result<Self> {
        match (offsets, join_by) {
            (Some(explicit), _) if !explicit.is_empty() => {
                if explicit.len() != tokens.len() {
                    return Err(Error::invalid_input(format!(
                        "got {} token offsets for {} tokens",
                        explicit.len(),
                        tokens.len()
                    )));
                }
                Ok(Self::new(explicit.to_vec()))
            }
            (_, Some(sep)) => Ok(Self::from_tokens(tokens, sep)),
            (Some(_), None) if tokens.is_empty() => Ok(Self::default()),
            _ => Err(Error::invalid_input(
                "either token offsets or join_by must be provided to compute spans",
            )),
        }
    }

    /// Character interval of token `idx`.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<(usize, usize)> {
        self.offsets.get(idx).copied()
    }

    /// Borrow the table.
    #[must_use]
    pub fn as_slice(&self) -> &[(usize, usize)] {
        &self.offsets
    }

    /// Iterate over token intervals.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.offsets.iter().copied()
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// True when there are no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Character span covering tokens `[start, end)`.
    #[must_use]
    pub fn tokens_to_char_span(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        if start >= end || end > self.offsets.len() {
            return None;
        }
        Some((self.offsets[start].0, self.offsets[end - 1].1))
    }
}

impl From<Vec<(usize, usize)>> for TokenOffsets {
    fn from(offsets: Vec<(usize, usize)>) -> Self {
        Self::new(offsets)
    }
}

/// A labelled run of tokens `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpan {
    /// First token index (inclusive).
    pub start: usize,
    /// Last token index (exclusive).
    pub end: usize,
    /// Span label.
    pub label: Option<String>,
    /// Knowledge-base identifier.
    pub kb_id: Option<String>,
}

impl TokenSpan {
    /// Number of tokens in this span.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Character-level span, using the first token's start and the last
    /// token's end.
    #[must_use]
    pub fn to_span(&self, offsets: &TokenOffsets, score: Option<f64>) -> Option<Span> {
        let (start, end) = offsets.tokens_to_char_span(self.start, self.end)?;
        Some(Span {
            start,
            end,
            label: self.label.clone(),
            score,
            kb_id: self.kb_id.clone(),
        })
    }
}

/// Conversion between character spans and the host tokenization.
pub trait ReferenceSpanExt {
    /// Snap to tokens with the expand policy.
    fn to_token_span(&self, offsets: &TokenOffsets) -> Option<TokenSpan> {
        self.to_token_span_with(offsets, AlignmentMode::Expand)
    }

    /// Snap to the contiguous run of tokens matching `mode`.
    ///
    /// Returns `None` when no token matches.
    fn to_token_span_with(&self, offsets: &TokenOffsets, mode: AlignmentMode) -> Option<TokenSpan>;
}

impl ReferenceSpanExt for Span {
    fn to_token_span_with(&self, offsets: &TokenOffsets, mode: AlignmentMode) -> Option<TokenSpan> {
        let mut matched = offsets
            .iter()
            .enumerate()
            .filter(|&(_, token)| mode.matches(token, self))
            .map(|(idx, _)| idx);
        let first = matched.next()?;
        let last = matched.last().unwrap_or(first);
        Some(TokenSpan {
            start: first,
            end: last + 1,
            label: self.label.clone(),
            kb_id: self.kb_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_york() -> TokenOffsets {
        TokenOffsets::from_tokens(&["New", "York", "is", "beautiful"], " ")
    }

    #[test]
    fn test_from_tokens() {
        assert_eq!(new_york().as_slice(), &[(0, 3), (4, 8), (9, 11), (12, 21)]);
    }

    #[test]
    fn test_from_tokens_counts_chars() {
        let offsets = TokenOffsets::from_tokens(&["café", "€50"], " ");
        assert_eq!(offsets.as_slice(), &[(0, 4), (5, 8)]);
    }

    #[test]
    fn test_from_tokens_empty_separator() {
        let offsets = TokenOffsets::from_tokens(&["ab", "c"], "");
        assert_eq!(offsets.as_slice(), &[(0, 2), (2, 3)]);
    }

    #[test]
    fn test_from_whitespace() {
        let offsets = TokenOffsets::from_whitespace("  New York\tis ");
        assert_eq!(offsets.as_slice(), &[(2, 5), (6, 10), (11, 13)]);
        assert!(TokenOffsets::from_whitespace("").is_empty());
    }

    #[test]
    fn test_resolve_requires_a_source() {
        let err = TokenOffsets::resolve(&["a"], None, None).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_resolve_prefers_explicit_offsets() {
        let explicit = [(10, 11)];
        let offsets = TokenOffsets::resolve(&["a"], Some(&explicit), Some(" ")).unwrap();
        assert_eq!(offsets.as_slice(), &[(10, 11)]);
    }

    #[test]
    fn test_resolve_empty_offsets_fall_back_to_join() {
        let offsets = TokenOffsets::resolve(&["a", "b"], Some(&[]), Some("-")).unwrap();
        assert_eq!(offsets.as_slice(), &[(0, 1), (2, 3)]);
    }

    #[test]
    fn test_resolve_length_mismatch() {
        assert!(TokenOffsets::resolve(&["a", "b"], Some(&[(0, 1)]), None).is_err());
    }

    #[test]
    fn test_to_token_span_expands() {
        // "New Yo" snaps out to "New York"
        let span = Span::new(0, 6).with_label("FAC");
        let ts = span.to_token_span(&new_york()).unwrap();
        assert_eq!((ts.start, ts.end), (0, 2));
        assert_eq!(ts.label.as_deref(), Some("FAC"));

        let back = ts.to_span(&new_york(), Some(1.0)).unwrap();
        assert_eq!(back, Span::scored(0, 8, "FAC", 1.0));
    }

    #[test]
    fn test_to_token_span_contract() {
        let span = Span::new(0, 6).with_label("FAC");
        let ts = span
            .to_token_span_with(&new_york(), AlignmentMode::Contract)
            .unwrap();
        assert_eq!((ts.start, ts.end), (0, 1));
    }

    #[test]
    fn test_to_token_span_no_match() {
        // Falls entirely in the separator between "York" and "is".
        assert!(Span::new(8, 9).to_token_span(&new_york()).is_none());
        assert!(Span::new(30, 40).to_token_span(&new_york()).is_none());
    }
}
