//! Trigger-phrase relation extraction.
//!
//! For every ordered pair of entities `(head, tail)` with `head` before
//! `tail`, the text between them is searched for each relation's name. A
//! hit yields a relation scored by proximity: the closer the pair, the
//! higher the score.

use super::RelationsExtractor;
use crate::document::Document;
use crate::{Relation, RelationSpan, Result};

/// Relation extractor keyed on relation names appearing between entities.
#[derive(Debug, Clone, Default)]
pub struct TriggerRelationsExtractor {
    relations: Vec<Relation>,
    threshold: f64,
}

impl TriggerRelationsExtractor {
    /// Extractor with no score threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop relations scoring below `threshold`.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    fn extract(&self, doc: &Document) -> Vec<RelationSpan> {
        let entities = if doc.entities.is_empty() {
            &doc.spans
        } else {
            &doc.entities
        };
        let text_len = doc.char_len().max(1) as f64;
        let mut out = Vec::new();

        for head in entities {
            for tail in entities.iter().filter(|t| head.end <= t.start) {
                let between = doc.slice(head.end, tail.start).to_lowercase();
                let proximity = 1.0 - (tail.start - head.end) as f64 / text_len;
                for relation in &self.relations {
                    let trigger = relation.name.to_lowercase();
                    if trigger.is_empty() || !between.contains(&trigger) {
                        continue;
                    }
                    if proximity >= self.threshold {
                        out.push(
                            RelationSpan::new(head.clone(), tail.clone(), relation.clone())
                                .with_score(proximity),
                        );
                    }
                }
            }
        }
        out
    }
}

impl RelationsExtractor for TriggerRelationsExtractor {
    fn name(&self) -> &str {
        "trigger"
    }

    fn set_relations(&mut self, relations: &[Relation]) {
        self.relations = relations.to_vec();
    }

    fn relations(&self) -> &[Relation] {
        &self.relations
    }

    fn predict(&self, docs: &[Document]) -> Result<Vec<Vec<RelationSpan>>> {
        Ok(docs.iter().map(|doc| self.extract(doc)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;

    fn doc() -> Document {
        let mut doc = Document::from_text("Paris is located in France");
        doc.entities = vec![Span::scored(0, 5, "city", 0.9), Span::scored(20, 26, "country", 0.9)];
        doc
    }

    #[test]
    fn test_trigger_between_entities() {
        let mut extractor = TriggerRelationsExtractor::new();
        extractor.set_relations(&[Relation::new("located in", ""), Relation::new("capital of", "")]);
        let rels = extractor.predict(&[doc()]).unwrap().remove(0);

        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].relation.name, "located in");
        assert_eq!(rels[0].start.bounds(), (0, 5));
        assert_eq!(rels[0].end.bounds(), (20, 26));
        let expected = 1.0 - 15.0 / 26.0;
        assert!((rels[0].score.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_threshold() {
        let mut extractor = TriggerRelationsExtractor::new().with_threshold(0.9);
        extractor.set_relations(&[Relation::new("located in", "")]);
        assert!(extractor.predict(&[doc()]).unwrap()[0].is_empty());
    }

    #[test]
    fn test_extract_relations_stores_on_document() {
        let mut extractor = TriggerRelationsExtractor::new();
        extractor.set_relations(&[Relation::new("located in", "")]);
        let mut docs = vec![doc()];
        extractor.extract_relations(&mut docs).unwrap();
        assert_eq!(docs[0].relations.len(), 1);
    }
}
