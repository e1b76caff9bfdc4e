//! Prediction backends: the seams where models plug in.
//!
//! Backends only ever hand back [`Span`]s and [`RelationSpan`]s per
//! document. Everything downstream (resolution, ensembling, evaluation) is
//! model-agnostic.
//!
//! | Trait | Produces | Stored in |
//! |-------|----------|-----------|
//! | [`MentionsExtractor`] | untyped candidate spans | `Document::mentions` |
//! | [`Linker`] | typed spans (raw, then resolved) | `Document::spans`, `Document::entities` |
//! | [`RelationsExtractor`] | relations between entities | `Document::relations` |
//! | [`KnowledgeExtractor`] | `(subject, relation, object)` triples | all of the above |
//!
//! Built-in backends are deliberately simple (string matching and
//! capitalization heuristics) and exist for dry runs, tests and as
//! ensemble members next to real models.

pub mod ensemble;
pub mod fixed;
pub mod heuristic;
pub mod joint;
pub mod trigger;
pub mod vocabulary;

pub use ensemble::LinkerEnsemble;
pub use fixed::FixedLinker;
pub use heuristic::CapitalizedMentionsExtractor;
pub use joint::JointKnowledgeExtractor;
pub use trigger::TriggerRelationsExtractor;
pub use vocabulary::VocabularyLinker;

use crate::align::AlignmentMode;
use crate::document::Document;
use crate::resolve::filter_overlapping_spans;
use crate::{Entity, Error, Relation, RelationSpan, Result, Span};
use std::collections::HashSet;

/// A `(subject, relation, object)` prediction.
pub type Triple = (Span, RelationSpan, Span);

fn check_batch<T>(name: &str, docs: usize, preds: &[T]) -> Result<()> {
    if preds.len() == docs {
        Ok(())
    } else {
        Err(Error::inference(format!(
            "{name} returned {} predictions for {docs} documents",
            preds.len()
        )))
    }
}

/// Resolve raw spans against a document's own tokenization.
///
/// # Errors
///
/// Propagates alignment failures.
pub fn resolve_entities(doc: &Document, spans: &[Span]) -> Result<Vec<Span>> {
    let tokens = doc.token_texts();
    let resolution = filter_overlapping_spans(
        spans,
        &tokens,
        Some(doc.tokens.as_slice()),
        None,
        AlignmentMode::Expand,
    )?;
    Ok(resolution.filtered_spans)
}

/// Proposes untyped candidate spans.
pub trait MentionsExtractor: Send + Sync {
    /// Identifier used in logs and the component registry.
    fn name(&self) -> &str;

    /// Entity types some extractors condition on.
    fn set_kg(&mut self, _entities: &[Entity]) {}

    /// One span list per document.
    fn predict(&self, docs: &[Document]) -> Result<Vec<Vec<Span>>>;

    /// Predict and store results in `Document::mentions`.
    fn extract_mentions(&self, docs: &mut [Document]) -> Result<()> {
        let preds = self.predict(docs)?;
        check_batch(self.name(), docs.len(), &preds)?;
        for (doc, mentions) in docs.iter_mut().zip(preds) {
            doc.mentions = mentions;
        }
        Ok(())
    }
}

/// Assigns open-set entity types to spans.
pub trait Linker: Send + Sync {
    /// Identifier used in logs and the component registry.
    fn name(&self) -> &str;

    /// Set the entity types the linker may emit.
    fn set_kg(&mut self, entities: &[Entity]);

    /// Entity types currently in use.
    fn entities(&self) -> &[Entity];

    /// Raw predictions, one span list per document.
    fn predict(&self, docs: &[Document]) -> Result<Vec<Vec<Span>>>;

    /// Does mention detection itself (no separate mentions extractor).
    fn is_end2end(&self) -> bool {
        false
    }

    /// Predict, then store raw spans and resolved entities on each document.
    fn link(&self, docs: &mut [Document]) -> Result<()> {
        let preds = self.predict(docs)?;
        check_batch(self.name(), docs.len(), &preds)?;
        for (doc, spans) in docs.iter_mut().zip(preds) {
            doc.entities = resolve_entities(doc, &spans)?;
            doc.spans = spans;
        }
        Ok(())
    }
}

/// Extracts relations between the entities already on a document.
pub trait RelationsExtractor: Send + Sync {
    /// Identifier used in logs and the component registry.
    fn name(&self) -> &str;

    /// Set the relation types the extractor may emit.
    fn set_relations(&mut self, relations: &[Relation]);

    /// Relation types currently in use.
    fn relations(&self) -> &[Relation];

    /// One relation list per document.
    fn predict(&self, docs: &[Document]) -> Result<Vec<Vec<RelationSpan>>>;

    /// Predict and store results in `Document::relations`.
    fn extract_relations(&self, docs: &mut [Document]) -> Result<()> {
        let preds = self.predict(docs)?;
        check_batch(self.name(), docs.len(), &preds)?;
        for (doc, relations) in docs.iter_mut().zip(preds) {
            doc.relations = relations;
        }
        Ok(())
    }
}

/// Joint entity and relation extraction.
pub trait KnowledgeExtractor: Send + Sync {
    /// Identifier used in logs and the component registry.
    fn name(&self) -> &str;

    /// Triples per document.
    fn predict(&self, docs: &[Document]) -> Result<Vec<Vec<Triple>>>;

    /// Split triples into distinct entities and distinct relations.
    ///
    /// First-seen order is kept; duplicates are detected structurally.
    fn parse_triples(&self, triples: &[Triple]) -> (Vec<Span>, Vec<RelationSpan>) {
        let mut seen_spans = HashSet::new();
        let mut seen_relations = HashSet::new();
        let mut entities = Vec::new();
        let mut relations = Vec::new();
        for (subject, relation, object) in triples {
            for span in [subject, object] {
                if seen_spans.insert(span) {
                    entities.push(span.clone());
                }
            }
            if seen_relations.insert(relation) {
                relations.push(relation.clone());
            }
        }
        (entities, relations)
    }

    /// Predict and store relations, raw spans and resolved entities.
    fn extract_knowledge(&self, docs: &mut [Document]) -> Result<()> {
        let preds = self.predict(docs)?;
        check_batch(self.name(), docs.len(), &preds)?;
        for (doc, triples) in docs.iter_mut().zip(preds) {
            let (spans, relations) = self.parse_triples(&triples);
            doc.entities = resolve_entities(doc, &spans)?;
            doc.spans = spans;
            doc.relations = relations;
        }
        Ok(())
    }
}
