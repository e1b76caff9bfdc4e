//! String-keyed factories for pipeline components.
//!
//! Configuration files name components by ID (`linker = "vocabulary"`); the
//! registry turns those IDs into fresh instances. IDs are case-insensitive.
//! Registering an existing ID replaces the previous factory.
//!
//! Lookups are permissive: an unknown ID yields `None` (with a warning) so a
//! pipeline can still run with the components that do resolve.

use crate::backends::{
    CapitalizedMentionsExtractor, Linker, LinkerEnsemble, MentionsExtractor, RelationsExtractor,
    TriggerRelationsExtractor, VocabularyLinker,
};
use crate::{Entity, Relation};
use std::collections::HashMap;

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Factory maps for every component kind.
#[derive(Default)]
pub struct ComponentRegistry {
    linkers: HashMap<String, Factory<Box<dyn Linker>>>,
    mentions_extractors: HashMap<String, Factory<Box<dyn MentionsExtractor>>>,
    relations_extractors: HashMap<String, Factory<Box<dyn RelationsExtractor>>>,
    entity_sets: HashMap<String, Vec<Entity>>,
    relation_sets: HashMap<String, Vec<Relation>>,
}

fn key(id: &str) -> String {
    id.trim().to_lowercase()
}

fn sorted_ids<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut ids: Vec<&str> = map.keys().map(String::as_str).collect();
    ids.sort_unstable();
    ids
}

impl ComponentRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in backends.
    ///
    /// | ID | Component |
    /// |----|-----------|
    /// | `vocabulary` | end-to-end [`VocabularyLinker`] |
    /// | `vocabulary-mentions` | [`VocabularyLinker::for_mentions`] |
    /// | `ensemble` | [`LinkerEnsemble`] over one vocabulary linker |
    /// | `capitalized` | [`CapitalizedMentionsExtractor`] |
    /// | `trigger` | [`TriggerRelationsExtractor`] |
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_linker("vocabulary", || Box::new(VocabularyLinker::new()));
        registry.register_linker("vocabulary-mentions", || {
            Box::new(VocabularyLinker::for_mentions())
        });
        registry.register_linker("ensemble", || Box::new(LinkerEnsemble::default()));
        registry.register_mentions_extractor("capitalized", || {
            Box::new(CapitalizedMentionsExtractor::new())
        });
        registry.register_relations_extractor("trigger", || {
            Box::new(TriggerRelationsExtractor::new())
        });
        registry
    }

    /// Register a linker factory.
    pub fn register_linker<F>(&mut self, id: &str, factory: F)
    where
        F: Fn() -> Box<dyn Linker> + Send + Sync + 'static,
    {
        self.linkers.insert(key(id), Box::new(factory));
    }

    /// Register a mentions extractor factory.
    pub fn register_mentions_extractor<F>(&mut self, id: &str, factory: F)
    where
        F: Fn() -> Box<dyn MentionsExtractor> + Send + Sync + 'static,
    {
        self.mentions_extractors.insert(key(id), Box::new(factory));
    }

    /// Register a relations extractor factory.
    pub fn register_relations_extractor<F>(&mut self, id: &str, factory: F)
    where
        F: Fn() -> Box<dyn RelationsExtractor> + Send + Sync + 'static,
    {
        self.relations_extractors.insert(key(id), Box::new(factory));
    }

    /// Register a named set of entity types.
    pub fn register_entities(&mut self, id: &str, entities: Vec<Entity>) {
        self.entity_sets.insert(key(id), entities);
    }

    /// Register a named set of relation types.
    pub fn register_relations(&mut self, id: &str, relations: Vec<Relation>) {
        self.relation_sets.insert(key(id), relations);
    }

    /// Fresh linker for `id`.
    #[must_use]
    pub fn get_linker(&self, id: &str) -> Option<Box<dyn Linker>> {
        let linker = self.linkers.get(&key(id)).map(|make| make());
        if linker.is_none() {
            log::warn!("Missing linker: {id}");
        }
        linker
    }

    /// Fresh mentions extractor for `id`.
    #[must_use]
    pub fn get_mentions_extractor(&self, id: &str) -> Option<Box<dyn MentionsExtractor>> {
        let extractor = self.mentions_extractors.get(&key(id)).map(|make| make());
        if extractor.is_none() {
            log::warn!("Missing mentions extractor: {id}");
        }
        extractor
    }

    /// Fresh relations extractor for `id`.
    #[must_use]
    pub fn get_relations_extractor(&self, id: &str) -> Option<Box<dyn RelationsExtractor>> {
        let extractor = self.relations_extractors.get(&key(id)).map(|make| make());
        if extractor.is_none() {
            log::warn!("Missing relations extractor: {id}");
        }
        extractor
    }

    /// Entity set registered under `id`.
    #[must_use]
    pub fn get_entities(&self, id: &str) -> Option<Vec<Entity>> {
        let entities = self.entity_sets.get(&key(id)).cloned();
        if entities.is_none() {
            log::warn!("Missing entities: {id}");
        }
        entities
    }

    /// Relation set registered under `id`.
    #[must_use]
    pub fn get_relations(&self, id: &str) -> Option<Vec<Relation>> {
        let relations = self.relation_sets.get(&key(id)).cloned();
        if relations.is_none() {
            log::warn!("Missing relations: {id}");
        }
        relations
    }

    /// Registered linker IDs, sorted.
    #[must_use]
    pub fn linker_ids(&self) -> Vec<&str> {
        sorted_ids(&self.linkers)
    }

    /// Registered mentions extractor IDs, sorted.
    #[must_use]
    pub fn mentions_extractor_ids(&self) -> Vec<&str> {
        sorted_ids(&self.mentions_extractors)
    }

    /// Registered relations extractor IDs, sorted.
    #[must_use]
    pub fn relations_extractor_ids(&self) -> Vec<&str> {
        sorted_ids(&self.relations_extractors)
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("linkers", &self.linker_ids())
            .field("mentions_extractors", &self.mentions_extractor_ids())
            .field("relations_extractors", &self.relations_extractor_ids())
            .field("entity_sets", &sorted_ids(&self.entity_sets))
            .field("relation_sets", &sorted_ids(&self.relation_sets))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::FixedLinker;

    #[test]
    fn test_builtins() {
        let registry = ComponentRegistry::with_builtins();
        assert_eq!(registry.linker_ids(), ["ensemble", "vocabulary", "vocabulary-mentions"]);
        assert_eq!(registry.get_linker("Vocabulary").unwrap().name(), "vocabulary");
        assert!(registry.get_mentions_extractor("capitalized").is_some());
        assert!(registry.get_relations_extractor("trigger").is_some());
    }

    #[test]
    fn test_missing_ids_are_none() {
        let registry = ComponentRegistry::with_builtins();
        assert!(registry.get_linker("smxm").is_none());
        assert!(registry.get_entities("ontonotes").is_none());
        assert!(registry.get_relations("fewrel").is_none());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ComponentRegistry::with_builtins();
        registry.register_linker("vocabulary", || Box::new(FixedLinker::new("fixed", vec![])));
        assert_eq!(registry.get_linker("vocabulary").unwrap().name(), "fixed");
    }

    #[test]
    fn test_entity_and_relation_sets() {
        let mut registry = ComponentRegistry::new();
        registry.register_entities("Fruits", vec![Entity::new("fruits", "edible plant parts")]);
        registry.register_relations("geo", vec![Relation::new("located in", "")]);
        assert_eq!(registry.get_entities("fruits").unwrap().len(), 1);
        assert_eq!(registry.get_relations("GEO").unwrap()[0].name, "located in");
    }

    #[test]
    fn test_each_lookup_builds_a_fresh_instance() {
        let registry = ComponentRegistry::with_builtins();
        let mut a = registry.get_linker("vocabulary").unwrap();
        a.set_kg(&[Entity::new("city", "")]);
        let b = registry.get_linker("vocabulary").unwrap();
        assert_eq!(a.entities().len(), 1);
        assert!(b.entities().is_empty());
    }
}
