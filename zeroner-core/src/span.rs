//! The atomic annotation unit: a scored, labelled character interval.
//!
//! ```text
//! text:   N e w   Y o r k   i s
//! index:  0 1 2 3 4 5 6 7 8 9 10
//!         [-------------)          Span { start: 0, end: 8, label: "FAC" }
//! ```
//!
//! Offsets are half-open and counted in characters (Unicode scalar values),
//! not bytes. `start <= end` is a caller contract; nothing is validated on
//! construction.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A half-open character interval with an optional label, score and KB id.
///
/// Two spans are equal when their `(label, start, end, score)` tuples are
/// equal. The knowledge-base id is carried along but ignored by `Eq` and
/// `Hash`.
///
/// Deserialization accepts `start_char`/`end_char` for the offsets and
/// `entity` for the label; when both spellings are present the plain key
/// wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SpanRecord")]
pub struct Span {
    /// Start character offset (inclusive).
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
    /// Category the span belongs to (e.g. `PER`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Prediction confidence in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Knowledge-base identifier (e.g. a Wikipedia page id).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kb_id: Option<String>,
}

/// Wire shape of a [`Span`], with every accepted key spelling.
#[derive(Deserialize)]
struct SpanRecord {
    start: Option<usize>,
    start_char: Option<usize>,
    end: Option<usize>,
    end_char: Option<usize>,
    label: Option<String>,
    entity: Option<String>,
    score: Option<f64>,
    kb_id: Option<String>,
}

impl TryFrom<SpanRecord> for Span {
    type Error = Error;

    fn try_from(record: SpanRecord) -> Result<Self> {
        let start = record
            .start
            .or(record.start_char)
            .ok_or_else(|| Error::missing_field("one of [start, start_char] must be defined"))?;
        let end = record
            .end
            .or(record.end_char)
            .ok_or_else(|| Error::missing_field("one of [end, end_char] must be defined"))?;
        Ok(Self {
            start,
            end,
            label: record.label.or(record.entity),
            score: record.score,
            kb_id: record.kb_id,
        })
    }
}

impl Span {
    /// Create an unlabelled, unscored span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            label: None,
            score: None,
            kb_id: None,
        }
    }

    /// Shorthand for a labelled span with a score.
    #[must_use]
    pub fn scored(start: usize, end: usize, label: impl Into<String>, score: f64) -> Self {
        Self::new(start, end).with_label(label).with_score(score)
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the score.
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Set the knowledge-base id.
    #[must_use]
    pub fn with_kb_id(mut self, kb_id: impl Into<String>) -> Self {
        self.kb_id = Some(kb_id.into());
        self
    }

    /// Same label, score and KB id over different bounds.
    #[must_use]
    pub fn with_bounds(&self, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            ..self.clone()
        }
    }

    /// Build a span from a loosely-typed record.
    ///
    /// `start`/`end` fall back to `start_char`/`end_char` when the plain key
    /// is absent. A non-empty `label` is required; `score` and `kb_id` are
    /// optional (numeric KB ids are stringified).
    ///
    /// # Errors
    ///
    /// [`Error::MissingField`] when start, end or label cannot be resolved,
    /// [`Error::Parse`] when a field has the wrong JSON type.
    ///
    /// # Example
    ///
    /// ```rust
    /// use zeroner_core::Span;
    /// use serde_json::json;
    ///
    /// let span = Span::from_dict(&json!({"start_char": 0, "end_char": 8, "label": "FAC"})).unwrap();
    /// assert_eq!((span.start, span.end), (0, 8));
    /// assert!(Span::from_dict(&json!({"end": 8, "label": "FAC"})).is_err());
    /// ```
    pub fn from_dict(record: &Value) -> Result<Self> {
        let map = record
            .as_object()
            .ok_or_else(|| Error::parse("span record must be a JSON object"))?;

        let offset = |key: &str, fallback: &str| -> Result<Option<usize>> {
            let value = if map.contains_key(key) {
                map.get(key)
            } else {
                map.get(fallback)
            };
            match value {
                None | Some(Value::Null) => Ok(None),
                Some(v) => v
                    .as_u64()
                    .map(|n| Some(n as usize))
                    .ok_or_else(|| Error::parse(format!("'{key}' must be a non-negative integer"))),
            }
        };

        let start = offset("start", "start_char")?
            .ok_or_else(|| Error::missing_field("one of [start, start_char] must be defined"))?;
        let end = offset("end", "end_char")?
            .ok_or_else(|| Error::missing_field("one of [end, end_char] must be defined"))?;

        let label = match map.get("label") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::String(_)) | Some(Value::Null) | None => {
                return Err(Error::missing_field("label must be defined"))
            }
            Some(_) => return Err(Error::parse("'label' must be a string")),
        };

        let score = match map.get("score") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                v.as_f64()
                    .ok_or_else(|| Error::parse("'score' must be a number"))?,
            ),
        };

        let kb_id = match map.get("kb_id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        Ok(Self {
            start,
            end,
            label: Some(label),
            score,
            kb_id,
        })
    }

    /// Number of characters covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True for zero-width spans.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// `(start, end)` as a tuple, the key used for interval grouping.
    #[must_use]
    pub const fn bounds(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// True if the intervals share at least one character.
    #[must_use]
    pub const fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True if `other` lies within `self` (bounds may coincide).
    #[must_use]
    pub const fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True if `other` lies within `self` and the bounds are not identical.
    #[must_use]
    pub const fn strictly_contains(&self, other: &Span) -> bool {
        self.contains(other) && (self.start != other.start || self.end != other.end)
    }

    /// The label, or `default` for unlabelled spans.
    #[must_use]
    pub fn label_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(default)
    }
}

impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
            && self.end == other.end
            && self.label == other.label
            && self.score.map(f64::to_bits) == other.score.map(f64::to_bits)
    }
}

impl Eq for Span {}

impl Hash for Span {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
        self.start.hash(state);
        self.end.hash(state);
        self.score.map(f64::to_bits).hash(state);
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)?;
        if let Some(label) = &self.label {
            write!(f, " {label}")?;
        }
        if let Some(score) = self.score {
            write!(f, " ({score:.3})")?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn interval() -> impl Strategy<Value = Span> {
        (0usize..50, 1usize..20).prop_map(|(start, len)| Span::new(start, start + len))
    }

    fn hash_of(span: &Span) -> u64 {
        let mut hasher = DefaultHasher::new();
        span.hash(&mut hasher);
        hasher.finish()
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(a in interval(), b in interval()) {
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        #[test]
        fn strict_containment_is_antisymmetric(a in interval(), b in interval()) {
            prop_assert!(!(a.strictly_contains(&b) && b.strictly_contains(&a)));
            if a.strictly_contains(&b) {
                prop_assert!(a.contains(&b) && a.overlaps(&b));
            }
        }

        #[test]
        fn equal_spans_hash_equal(a in interval(), score in 0.0..1.0f64) {
            let x = a.clone().with_label("PER").with_score(score);
            let y = a.with_label("PER").with_score(score);
            prop_assert_eq!(&x, &y);
            prop_assert_eq!(hash_of(&x), hash_of(&y));
        }
    }
}
