//! Alignment of character spans onto a reference tokenization.
//!
//! For every token the engine lists the indices of the spans that "match"
//! it under an [`AlignmentMode`]:
//!
//! ```text
//! tokens:   [--]  [--]  [--]          offsets (0,2) (3,5) (6,8)
//! spans:    A = [0,4)   B = [0,2)   C = [3,8)   D = [6,8)
//!
//! expand:   tok0 -> [A, B]   tok1 -> [A, C]   tok2 -> [C, D]
//! contract: tok0 -> [B]      tok1 -> [C]      tok2 -> [C, D]
//! ```
//!
//! | Mode | A token matches a span when |
//! |------|-----------------------------|
//! | `Expand` | the intervals share a character, the span starts or ends inside the token, or the token lies within the span |
//! | `Contract` | the token lies within the span |
//!
//! A token matched under `Contract` is always matched under `Expand`.
//! Within one token a span index appears at most once, in span order.

use crate::offset::TokenOffsets;
use crate::{Error, Result, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Policy for mapping character spans onto tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentMode {
    /// Every token the span at least partially covers.
    #[default]
    Expand,
    /// Only tokens entirely inside the span.
    Contract,
}

impl AlignmentMode {
    /// Does `token` match `span` under this mode?
    #[must_use]
    pub fn matches(self, token: (usize, usize), span: &Span) -> bool {
        let (t_start, t_end) = token;
        let covered = t_start >= span.start && t_end <= span.end;
        match self {
            AlignmentMode::Contract => covered,
            AlignmentMode::Expand => {
                covered
                    || (t_start < span.end && span.start < t_end)
                    // zero-width spans: starting inside the token, or ending at its end
                    || (t_start <= span.start && span.start < t_end)
                    || (t_start < span.end && span.end <= t_end)
            }
        }
    }
}

impl fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentMode::Expand => write!(f, "expand"),
            AlignmentMode::Contract => write!(f, "contract"),
        }
    }
}

impl FromStr for AlignmentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "expand" => Ok(AlignmentMode::Expand),
            "contract" => Ok(AlignmentMode::Contract),
            other => Err(Error::invalid_input(format!(
                "unknown alignment mode '{other}' (expected 'expand' or 'contract')"
            ))),
        }
    }
}

/// Token-to-span assignment plus the offsets it was computed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alignment {
    /// One entry per token: indices into the input span list.
    pub alignments: Vec<Vec<usize>>,
    /// Offsets used for the alignment (explicit or derived).
    pub tokens_offsets: TokenOffsets,
}

impl Alignment {
    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alignments.len()
    }

    /// True when there are no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alignments.is_empty()
    }

    /// Span indices aligned to token `idx`.
    #[must_use]
    pub fn candidates(&self, idx: usize) -> &[usize] {
        self.alignments.get(idx).map_or(&[], Vec::as_slice)
    }
}

/// Align `spans` against pre-computed token offsets.
#[must_use]
pub fn align_to_offsets(spans: &[Span], offsets: &TokenOffsets, mode: AlignmentMode) -> Vec<Vec<usize>> {
    offsets
        .iter()
        .map(|token| {
            spans
                .iter()
                .enumerate()
                .filter(|(_, span)| mode.matches(token, span))
                .map(|(idx, _)| idx)
                .collect()
        })
        .collect()
}

/// Align `spans` to `tokens`.
///
/// Offsets come from `tokens_offsets` when it is non-empty, otherwise they
/// are derived from the token texts joined by `join_by`.
///
/// # Errors
///
/// [`Error::InvalidInput`] when neither offsets nor `join_by` are supplied,
/// or when the offsets do not have one entry per token.
///
/// # Example
///
/// ```rust
/// use zeroner::align::{align_spans, AlignmentMode};
/// use zeroner::Span;
///
/// let tokens = ["I", "am", "going"];
/// let spans = [Span::new(2, 4).with_label("SBJ"), Span::new(5, 6).with_label("LOC")];
/// let alignment = align_spans(&spans, &tokens, None, Some(" "), AlignmentMode::Expand).unwrap();
/// assert_eq!(alignment.alignments, vec![vec![], vec![0], vec![1]]);
/// ```
pub fn align_spans<S: AsRef<str>>(
    spans: &[Span],
    tokens: &[S],
    tokens_offsets: Option<&[(usize, usize)]>,
    join_by: Option<&str>,
    mode: AlignmentMode,
) -> Result<Alignment> {
    let offsets = TokenOffsets::resolve(tokens, tokens_offsets, join_by)?;
    let alignments = align_to_offsets(spans, &offsets, mode);
    log::trace!(
        "aligned {} spans onto {} tokens ({mode})",
        spans.len(),
        offsets.len()
    );
    Ok(Alignment {
        alignments,
        tokens_offsets: offsets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DASHES: [&str; 3] = ["--", "--", "--"];

    fn dash_spans() -> Vec<Span> {
        vec![
            Span::scored(0, 4, "A", 0.7),
            Span::scored(0, 2, "B", 0.5),
            Span::scored(3, 8, "C", 0.9),
            Span::scored(6, 8, "D", 0.4),
        ]
    }

    #[test]
    fn test_expand_overlapping_spans() {
        let offsets = [(0, 2), (3, 5), (6, 8)];
        let a = align_spans(&dash_spans(), &DASHES, Some(&offsets), None, AlignmentMode::Expand)
            .unwrap();
        assert_eq!(a.alignments, vec![vec![0, 1], vec![0, 2], vec![2, 3]]);
    }

    #[test]
    fn test_contract_overlapping_spans() {
        let mut spans = dash_spans();
        spans[0] = Span::scored(0, 3, "A", 0.7);
        let a = align_spans(&spans, &DASHES, None, Some(" "), AlignmentMode::Contract).unwrap();
        assert_eq!(a.alignments, vec![vec![0, 1], vec![2], vec![2, 3]]);
    }

    #[test]
    fn test_expand_derived_offsets() {
        let tokens = ["I", "am", "going", "home"];
        let spans = [Span::new(0, 1).with_label("SBJ"), Span::new(11, 15).with_label("LOC")];
        let a = align_spans(&spans, &tokens, None, Some(" "), AlignmentMode::Expand).unwrap();
        assert_eq!(a.alignments, vec![vec![0], vec![], vec![], vec![1]]);
        assert_eq!(a.tokens_offsets.as_slice(), &[(0, 1), (2, 4), (5, 10), (11, 15)]);
    }

    #[test]
    fn test_contract_drops_partial_tokens() {
        let tokens = ["I", "am", "going", "home"];
        let spans = [Span::new(1, 3).with_label("SBJ"), Span::new(11, 15).with_label("LOC")];
        let a = align_spans(&spans, &tokens, None, Some(" "), AlignmentMode::Contract).unwrap();
        assert_eq!(a.alignments, vec![vec![], vec![], vec![], vec![1]]);
    }

    #[test]
    fn test_narrow_span_inside_token() {
        let tokens = ["beautiful"];
        let spans = [Span::new(2, 4), Span::new(3, 3)];
        let a = align_spans(&spans, &tokens, None, Some(" "), AlignmentMode::Expand).unwrap();
        assert_eq!(a.alignments, vec![vec![0, 1]]);
        let c = align_spans(&spans, &tokens, None, Some(" "), AlignmentMode::Contract).unwrap();
        assert_eq!(c.alignments, vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_zero_width_span_at_token_edges() {
        let tokens = ["New", "York"];
        let spans = [Span::new(3, 3), Span::new(4, 4)];
        let a = align_spans(&spans, &tokens, None, Some(" "), AlignmentMode::Expand).unwrap();
        assert_eq!(a.alignments, vec![vec![0], vec![1]]);
        let c = align_spans(&spans, &tokens, None, Some(" "), AlignmentMode::Contract).unwrap();
        assert_eq!(c.alignments, vec![Vec::<usize>::new(), Vec::new()]);
    }

    #[test]
    fn test_adjacent_span_does_not_align() {
        // [0,4) ends exactly where "York" starts
        let tokens = ["New", "York"];
        let spans = [Span::new(0, 4)];
        let a = align_spans(&spans, &tokens, None, Some(" "), AlignmentMode::Expand).unwrap();
        assert_eq!(a.alignments, vec![vec![0], vec![]]);
    }

    #[test]
    fn test_missing_offsets_and_join_fails() {
        let err = align_spans(&dash_spans(), &DASHES, None, None, AlignmentMode::Expand).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_no_tokens() {
        let tokens: [&str; 0] = [];
        let a = align_spans(&dash_spans(), &tokens, None, Some(" "), AlignmentMode::Expand).unwrap();
        assert!(a.is_empty());
        assert_eq!(a.candidates(0), &[] as &[usize]);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Expand".parse::<AlignmentMode>().unwrap(), AlignmentMode::Expand);
        assert_eq!("contract".parse::<AlignmentMode>().unwrap(), AlignmentMode::Contract);
        assert!("strict".parse::<AlignmentMode>().is_err());
        assert_eq!(AlignmentMode::Contract.to_string(), "contract");
    }
}
