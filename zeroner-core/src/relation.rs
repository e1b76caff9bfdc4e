//! Relations between spans.

use crate::Span;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A relation type: a name plus a description for zero-shot classifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    /// Relation label (e.g. `located in`).
    pub name: String,
    /// Natural language description.
    #[serde(default)]
    pub description: String,
}

impl Relation {
    /// Create a relation type.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A directed, labelled edge from a subject span (`start`) to an object span (`end`).
///
/// Equality and hashing use `(relation.name, start, end, score)`; the
/// relation description and `kb_id` are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationSpan {
    /// Subject.
    pub start: Span,
    /// Object.
    pub end: Span,
    /// Relation type.
    pub relation: Relation,
    /// Confidence in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Knowledge-base identifier of the relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kb_id: Option<String>,
}

impl RelationSpan {
    /// Create an unscored relation between two spans.
    #[must_use]
    pub fn new(start: Span, end: Span, relation: Relation) -> Self {
        Self {
            start,
            end,
            relation,
            score: None,
            kb_id: None,
        }
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
}

impl PartialEq for RelationSpan {
    fn eq(&self, other: &Self) -> bool {
        self.relation.name == other.relation.name
            && self.start == other.start
            && self.end == other.end
            && self.score.map(f64::to_bits) == other.score.map(f64::to_bits)
    }
}

impl Eq for RelationSpan {}

impl Hash for RelationSpan {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relation.name.hash(state);
        self.start.hash(state);
        self.end.hash(state);
        self.score.map(f64::to_bits).hash(state);
    }
}
