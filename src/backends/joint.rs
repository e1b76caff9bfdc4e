//! Knowledge extraction composed from a linker and a relations extractor.

use super::{KnowledgeExtractor, Linker, RelationsExtractor, Triple};
use crate::document::Document;
use crate::{Entity, Relation, Result};

/// Runs a linker, then a relations extractor over the linked entities, and
/// reports every relation as a `(subject, relation, object)` triple.
pub struct JointKnowledgeExtractor {
    linker: Box<dyn Linker>,
    relations_extractor: Box<dyn RelationsExtractor>,
}

impl JointKnowledgeExtractor {
    /// Compose `linker` and `relations_extractor`.
    #[must_use]
    pub fn new(linker: Box<dyn Linker>, relations_extractor: Box<dyn RelationsExtractor>) -> Self {
        Self {
            linker,
            relations_extractor,
        }
    }

    /// Entity types handed to the linker.
    pub fn set_kg(&mut self, entities: &[Entity]) {
        self.linker.set_kg(entities);
    }

    /// Relation types handed to the relations extractor.
    pub fn set_relations(&mut self, relations: &[Relation]) {
        self.relations_extractor.set_relations(relations);
    }
}

impl KnowledgeExtractor for JointKnowledgeExtractor {
    fn name(&self) -> &str {
        "joint"
    }

    fn predict(&self, docs: &[Document]) -> Result<Vec<Vec<Triple>>> {
        let mut linked = docs.to_vec();
        self.linker.link(&mut linked)?;
        let relations = self.relations_extractor.predict(&linked)?;
        Ok(relations
            .into_iter()
            .map(|doc_relations| {
                doc_relations
                    .into_iter()
                    .map(|r| (r.start.clone(), r.clone(), r.end.clone()))
                    .collect()
            })
            .collect())
    }
}
