//! IOB2 tag utilities.
//!
//! Tags are `O`, `B-<type>` or `I-<type>`. A non-`O` tag without a prefix
//! (e.g. a bare `MENTION`) is read as a continuation of its type, so a run
//! of identical bare tags forms one chunk.

use crate::offset::TokenOffsets;
use crate::resolve::{MENTION, OUTSIDE};
use crate::{Error, Result, Span};

/// A parsed tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag<'a> {
    /// Outside any chunk.
    Outside,
    /// First token of a chunk.
    Begin(&'a str),
    /// Continuation of a chunk.
    Inside(&'a str),
}

impl<'a> Tag<'a> {
    /// Parse a tag string. `B_`/`I_` separators are accepted too.
    #[must_use]
    pub fn parse(tag: &'a str) -> Self {
        if tag == OUTSIDE || tag.is_empty() {
            return Tag::Outside;
        }
        let bytes = tag.as_bytes();
        if bytes.len() > 2 && (bytes[1] == b'-' || bytes[1] == b'_') {
            match bytes[0].to_ascii_uppercase() {
                b'B' => return Tag::Begin(&tag[2..]),
                b'I' => return Tag::Inside(&tag[2..]),
                _ => {}
            }
        }
        Tag::Inside(tag)
    }

    /// Chunk type, `None` for `O`.
    #[must_use]
    pub fn label(self) -> Option<&'a str> {
        match self {
            Tag::Outside => None,
            Tag::Begin(label) | Tag::Inside(label) => Some(label),
        }
    }
}

/// Tag with its `B-`/`I-` prefix removed (`O` stays `O`).
#[must_use]
pub fn strip_prefix(tag: &str) -> &str {
    Tag::parse(tag).label().unwrap_or(OUTSIDE)
}

/// Replace the chunk type with `MENTION`, keeping the prefix.
///
/// ```rust
/// use zeroner::eval::bio::relabel_as_mention;
///
/// assert_eq!(relabel_as_mention("B-PER"), "B-MENTION");
/// assert_eq!(relabel_as_mention("I-LOC"), "I-MENTION");
/// assert_eq!(relabel_as_mention("GPE"), "MENTION");
/// assert_eq!(relabel_as_mention("O"), "O");
/// ```
#[must_use]
pub fn relabel_as_mention(tag: &str) -> String {
    if tag == OUTSIDE {
        return tag.to_string();
    }
    match tag.get(..2) {
        Some(prefix @ ("B-" | "I-")) => format!("{prefix}{MENTION}"),
        _ => MENTION.to_string(),
    }
}

/// A typed run of tokens, `[start, end)` in token indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Chunk {
    /// Chunk type.
    pub label: String,
    /// First token.
    pub start: usize,
    /// One past the last token.
    pub end: usize,
}

/// Extract chunks from a tag sequence.
///
/// `B-` always opens a chunk; `I-` continues the open chunk of the same
/// type and otherwise opens a new one; `O` closes.
#[must_use]
pub fn chunks<S: AsRef<str>>(tags: &[S]) -> Vec<Chunk> {
    let mut out = Vec::new();
    let mut open: Option<Chunk> = None;

    for (idx, tag) in tags.iter().enumerate() {
        let tag = Tag::parse(tag.as_ref());
        let continues = match (&open, tag) {
            (Some(chunk), Tag::Inside(label)) => chunk.label == label,
            _ => false,
        };
        if continues {
            if let Some(chunk) = open.as_mut() {
                chunk.end = idx + 1;
            }
            continue;
        }
        out.extend(open.take());
        open = tag.label().map(|label| Chunk {
            label: label.to_string(),
            start: idx,
            end: idx + 1,
        });
    }
    out.extend(open);
    out
}

/// Convert tags back to character spans using token offsets.
///
/// # Errors
///
/// [`Error::InvalidInput`] when `tags` and `offsets` differ in length.
pub fn bio_to_spans<S: AsRef<str>>(tags: &[S], offsets: &TokenOffsets) -> Result<Vec<Span>> {
    if tags.len() != offsets.len() {
        return Err(Error::invalid_input(format!(
            "tag count ({}) != token count ({})",
            tags.len(),
            offsets.len()
        )));
    }
    Ok(chunks(tags)
        .into_iter()
        .filter_map(|chunk| {
            let (start, _) = offsets.get(chunk.start)?;
            let (_, end) = offsets.get(chunk.end - 1)?;
            Some(Span::new(start, end).with_label(chunk.label))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Tag::parse("O"), Tag::Outside);
        assert_eq!(Tag::parse("B-PER"), Tag::Begin("PER"));
        assert_eq!(Tag::parse("i_LOC"), Tag::Inside("LOC"));
        assert_eq!(Tag::parse("MENTION"), Tag::Inside("MENTION"));
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("B-FAC"), "FAC");
        assert_eq!(strip_prefix("I-FAC"), "FAC");
        assert_eq!(strip_prefix("O"), "O");
    }

    #[test]
    fn test_chunks() {
        let tags = ["B-PER", "I-PER", "O", "B-ORG", "B-ORG", "I-LOC", "I-LOC"];
        let got = chunks(&tags);
        let bounds: Vec<_> = got.iter().map(|c| (c.label.as_str(), c.start, c.end)).collect();
        assert_eq!(bounds, [("PER", 0, 2), ("ORG", 3, 4), ("ORG", 4, 5), ("LOC", 5, 7)]);
    }

    #[test]
    fn test_stray_inside_opens_chunk() {
        let got = chunks(&["O", "I-FAC", "I-FAC"]);
        assert_eq!(got, [Chunk { label: "FAC".into(), start: 1, end: 3 }]);
    }

    #[test]
    fn test_bio_to_spans() {
        let offsets = TokenOffsets::from_whitespace("New York is beautiful");
        let spans = bio_to_spans(&["B-FAC", "I-FAC", "O", "O"], &offsets).unwrap();
        assert_eq!(spans, [Span::new(0, 8).with_label("FAC")]);
        assert!(bio_to_spans(&["O"], &offsets).is_err());
    }
}
