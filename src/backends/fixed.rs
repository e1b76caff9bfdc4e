//! A linker that replays pre-computed predictions.
//!
//! Useful for ensembling and evaluating prediction files produced elsewhere,
//! and as a deterministic stand-in for a model in tests.

use super::Linker;
use crate::document::Document;
use crate::{Entity, Error, Result, Span};

/// Replays one span list per document, in document order.
#[derive(Debug, Clone, Default)]
pub struct FixedLinker {
    name: String,
    predictions: Vec<Vec<Span>>,
    entities: Vec<Entity>,
    end2end: bool,
}

impl FixedLinker {
    /// Replay `predictions`.
    #[must_use]
    pub fn new(name: impl Into<String>, predictions: Vec<Vec<Span>>) -> Self {
        Self {
            name: name.into(),
            predictions,
            entities: Vec::new(),
            end2end: true,
        }
    }

    /// Whether the linker claims to detect mentions itself (default `true`).
    #[must_use]
    pub fn with_end2end(mut self, end2end: bool) -> Self {
        self.end2end = end2end;
        self
    }
}

impl Linker for FixedLinker {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_kg(&mut self, entities: &[Entity]) {
        self.entities = entities.to_vec();
    }

    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn predict(&self, docs: &[Document]) -> Result<Vec<Vec<Span>>> {
        if docs.len() > self.predictions.len() {
            return Err(Error::inference(format!(
                "{} holds predictions for {} documents, asked for {}",
                self.name,
                self.predictions.len(),
                docs.len()
            )));
        }
        Ok(self.predictions[..docs.len()].to_vec())
    }

    fn is_end2end(&self) -> bool {
        self.end2end
    }
}
