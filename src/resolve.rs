//! Overlap resolution: aligned candidates to non-overlapping spans and BIO tags.
//!
//! Tokens are visited left to right. Each token keeps at most one candidate,
//! the best one it was aligned to, and adjacent tokens whose winners share a
//! label are coalesced into a single span:
//!
//! ```text
//! tokens:      New       York      is     beautiful
//! candidates:  [FAC 1.0] [FAC 1.0, LOC 0.7]  []   []
//! winner:      FAC       FAC       -      -
//! bio:         B-FAC     I-FAC     O      O
//! spans:       [0, 8) FAC
//! ```
//!
//! Decisions are online: once a token is tagged it is never revisited, even
//! if a later token prefers a different label.

use crate::align::{align_spans, Alignment, AlignmentMode};
use crate::offset::TokenOffsets;
use crate::{Result, Span};
use serde::{Deserialize, Serialize};

/// Tag for tokens outside any span.
pub const OUTSIDE: &str = "O";

/// Class used for spans that carry no label.
pub const MENTION: &str = "MENTION";

/// Output of [`filter_overlapping_spans`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// One IOB2 tag per token.
    pub bio: Vec<String>,
    /// Pairwise non-overlapping, token-aligned spans in text order.
    pub filtered_spans: Vec<Span>,
    /// Alignment the resolution was computed from.
    pub alignments: Vec<Vec<usize>>,
    /// Token offsets the resolution was computed against.
    pub tokens_offsets: TokenOffsets,
}

/// Pick the winning span among `candidates`.
///
/// When every candidate has a comparable score the highest one wins, the
/// earliest on ties. Otherwise the first candidate wins.
#[must_use]
pub fn best_candidate<'a, I>(candidates: I) -> Option<&'a Span>
where
    I: IntoIterator<Item = &'a Span>,
{
    let mut iter = candidates.into_iter();
    let first = iter.next()?;
    let comparable = |span: &Span| span.score.filter(|s| !s.is_nan());

    let Some(mut best_score) = comparable(first) else {
        return Some(first);
    };
    let mut best = first;
    for span in iter {
        match comparable(span) {
            Some(score) if score > best_score => {
                best = span;
                best_score = score;
            }
            Some(_) => {}
            None => return Some(first),
        }
    }
    Some(best)
}

/// Resolve an existing alignment of `spans`.
#[must_use]
pub fn resolve_alignment(spans: &[Span], alignment: Alignment) -> Resolution {
    let Alignment {
        alignments,
        tokens_offsets,
    } = alignment;

    let mut slots: Vec<Option<Span>> = vec![None; alignments.len()];
    let mut bio = vec![OUTSIDE.to_string(); alignments.len()];

    for (idx, aligned) in alignments.iter().enumerate() {
        let Some(best) = best_candidate(aligned.iter().filter_map(|&i| spans.get(i))) else {
            continue;
        };
        let Some((t_start, t_end)) = tokens_offsets.get(idx) else {
            continue;
        };

        let continued = idx
            .checked_sub(1)
            .and_then(|prev| slots[prev].as_ref().map(|span| (prev, span)))
            .filter(|(_, span)| span.label == best.label)
            .map(|(prev, span)| (prev, span.with_bounds(span.start, t_end)));

        match continued {
            Some((prev, merged)) => {
                bio[idx] = format!("I-{}", merged.label_or(MENTION));
                slots[prev] = None;
                slots[idx] = Some(merged);
            }
            None => {
                let span = Span {
                    start: t_start,
                    end: t_end,
                    label: best.label.clone(),
                    score: best.score,
                    kb_id: best.kb_id.clone(),
                };
                bio[idx] = format!("B-{}", span.label_or(MENTION));
                slots[idx] = Some(span);
            }
        }
    }

    Resolution {
        bio,
        filtered_spans: slots.into_iter().flatten().collect(),
        alignments,
        tokens_offsets,
    }
}

/// Align `spans` to `tokens` and keep one non-overlapping span sequence.
///
/// # Errors
///
/// Fails under the same preconditions as [`align_spans`].
///
/// # Example
///
/// ```rust
/// use zeroner::align::AlignmentMode;
/// use zeroner::resolve::filter_overlapping_spans;
/// use zeroner::Span;
///
/// let tokens = ["New", "York", "is", "beautiful"];
/// let spans = [Span::scored(0, 8, "FAC", 1.0), Span::scored(4, 8, "LOC", 0.7)];
/// let r = filter_overlapping_spans(&spans, &tokens, None, Some(" "), AlignmentMode::Expand).unwrap();
/// assert_eq!(r.bio, ["B-FAC", "I-FAC", "O", "O"]);
/// assert_eq!(r.filtered_spans, [Span::scored(0, 8, "FAC", 1.0)]);
/// ```
pub fn filter_overlapping_spans<S: AsRef<str>>(
    spans: &[Span],
    tokens: &[S],
    tokens_offsets: Option<&[(usize, usize)]>,
    join_by: Option<&str>,
    mode: AlignmentMode,
) -> Result<Resolution> {
    let alignment = align_spans(spans, tokens, tokens_offsets, join_by, mode)?;
    let resolution = resolve_alignment(spans, alignment);
    log::debug!(
        "resolved {} candidate spans into {} over {} tokens",
        spans.len(),
        resolution.filtered_spans.len(),
        resolution.bio.len()
    );
    Ok(resolution)
}
