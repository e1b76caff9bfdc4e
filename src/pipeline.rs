//! End-to-end processing: mentions, then linking, then relations.
//!
//! ```text
//! Document ─► MentionsExtractor ─► Linker ─► RelationsExtractor ─► Document
//!             (doc.mentions)       (doc.spans, doc.entities)  (doc.relations)
//! ```
//!
//! An end-to-end linker finds its own mentions, so a mentions extractor
//! paired with one is dropped (with a warning). A [`KnowledgeExtractor`],
//! when present, replaces both the linker and the relations extractor.

use crate::backends::{KnowledgeExtractor, Linker, LinkerEnsemble, MentionsExtractor, RelationsExtractor};
use crate::config::{Config, Definitions};
use crate::document::Document;
use crate::registry::ComponentRegistry;
use crate::{Entity, Relation, Result};

/// Component ID that builds a [`LinkerEnsemble`] from `[ensemble]`.
pub const ENSEMBLE_LINKER: &str = "ensemble";

/// Configured chain of backends.
#[derive(Default)]
pub struct Pipeline {
    entities: Vec<Entity>,
    relations: Vec<Relation>,
    mentions_extractor: Option<Box<dyn MentionsExtractor>>,
    linker: Option<Box<dyn Linker>>,
    relations_extractor: Option<Box<dyn RelationsExtractor>>,
    knowledge_extractor: Option<Box<dyn KnowledgeExtractor>>,
}

impl Pipeline {
    /// Pipeline with no components.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entity types (builder form of [`Pipeline::set_entities`]).
    #[must_use]
    pub fn with_entities(mut self, entities: Vec<Entity>) -> Self {
        self.set_entities(entities);
        self
    }

    /// Set the relation types (builder form of [`Pipeline::set_relations`]).
    #[must_use]
    pub fn with_relations(mut self, relations: Vec<Relation>) -> Self {
        self.set_relations(relations);
        self
    }

    /// Add a mentions extractor. Ignored if the linker is end-to-end.
    #[must_use]
    pub fn with_mentions_extractor(mut self, mut extractor: Box<dyn MentionsExtractor>) -> Self {
        if self.linker.as_ref().is_some_and(|l| l.is_end2end()) {
            log::warn!("Using linker end2end. Disabling mentions_extractor");
            return self;
        }
        extractor.set_kg(&self.entities);
        self.mentions_extractor = Some(extractor);
        self
    }

    /// Add a linker. An end-to-end linker disables the mentions extractor.
    #[must_use]
    pub fn with_linker(mut self, mut linker: Box<dyn Linker>) -> Self {
        if linker.is_end2end() && self.mentions_extractor.take().is_some() {
            log::warn!("Using linker end2end. Disabling mentions_extractor");
        }
        linker.set_kg(&self.entities);
        self.linker = Some(linker);
        self
    }

    /// Add a relations extractor.
    #[must_use]
    pub fn with_relations_extractor(mut self, mut extractor: Box<dyn RelationsExtractor>) -> Self {
        extractor.set_relations(&self.relations);
        self.relations_extractor = Some(extractor);
        self
    }

    /// Add a joint entity and relation extractor.
    #[must_use]
    pub fn with_knowledge_extractor(mut self, extractor: Box<dyn KnowledgeExtractor>) -> Self {
        self.knowledge_extractor = Some(extractor);
        self
    }

    /// Replace the entity types and push them to every component.
    pub fn set_entities(&mut self, entities: Vec<Entity>) {
        if let Some(extractor) = self.mentions_extractor.as_mut() {
            extractor.set_kg(&entities);
        }
        if let Some(linker) = self.linker.as_mut() {
            linker.set_kg(&entities);
        }
        self.entities = entities;
    }

    /// Replace the relation types and push them to the relations extractor.
    pub fn set_relations(&mut self, relations: Vec<Relation>) {
        if let Some(extractor) = self.relations_extractor.as_mut() {
            extractor.set_relations(&relations);
        }
        self.relations = relations;
    }

    /// Entity types in use.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Relation types in use.
    #[must_use]
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// The mentions extractor, if any.
    #[must_use]
    pub fn mentions_extractor(&self) -> Option<&dyn MentionsExtractor> {
        self.mentions_extractor.as_deref()
    }

    /// The linker, if any.
    #[must_use]
    pub fn linker(&self) -> Option<&dyn Linker> {
        self.linker.as_deref()
    }

    /// The relations extractor, if any.
    #[must_use]
    pub fn relations_extractor(&self) -> Option<&dyn RelationsExtractor> {
        self.relations_extractor.as_deref()
    }

    /// Run every configured stage over `docs`, in order.
    ///
    /// # Errors
    ///
    /// The first backend failure; earlier stages' results stay on the
    /// documents.
    pub fn process(&self, docs: &mut [Document]) -> Result<()> {
        if let Some(extractor) = &self.mentions_extractor {
            log::debug!("{}: extracting mentions from {} docs", extractor.name(), docs.len());
            extractor.extract_mentions(docs)?;
        }
        if let Some(extractor) = &self.knowledge_extractor {
            log::debug!("{}: extracting knowledge from {} docs", extractor.name(), docs.len());
            return extractor.extract_knowledge(docs);
        }
        if let Some(linker) = &self.linker {
            log::debug!("{}: linking {} docs", linker.name(), docs.len());
            linker.link(docs)?;
        }
        if let Some(extractor) = &self.relations_extractor {
            log::debug!("{}: extracting relations from {} docs", extractor.name(), docs.len());
            extractor.extract_relations(docs)?;
        }
        Ok(())
    }

    /// Assemble a pipeline from configuration.
    ///
    /// IDs that the registry does not know are skipped with a warning, so
    /// the result may have fewer components than configured.
    #[must_use]
    pub fn from_config(config: &Config, registry: &ComponentRegistry) -> Self {
        let section = &config.pipeline;
        let entities = section
            .entities
            .as_ref()
            .and_then(|defs| match defs {
                Definitions::Registered(id) => registry.get_entities(id),
                inline => inline.inline_entities(),
            })
            .unwrap_or_default();
        let relations = section
            .relations
            .as_ref()
            .and_then(|defs| match defs {
                Definitions::Registered(id) => registry.get_relations(id),
                inline => inline.inline_relations(),
            })
            .unwrap_or_default();

        let mut pipeline = Pipeline::new().with_entities(entities).with_relations(relations);
        if let Some(extractor) = section
            .mentions_extractor
            .as_deref()
            .and_then(|id| registry.get_mentions_extractor(id))
        {
            pipeline = pipeline.with_mentions_extractor(extractor);
        }
        if let Some(linker) = section.linker.as_deref().and_then(|id| build_linker(id, config, registry)) {
            pipeline = pipeline.with_linker(linker);
        }
        if let Some(extractor) = section
            .relations_extractor
            .as_deref()
            .and_then(|id| registry.get_relations_extractor(id))
        {
            pipeline = pipeline.with_relations_extractor(extractor);
        }
        pipeline
    }
}

fn build_linker(id: &str, config: &Config, registry: &ComponentRegistry) -> Option<Box<dyn Linker>> {
    let section = &config.ensemble;
    if !id.eq_ignore_ascii_case(ENSEMBLE_LINKER) || section.linkers.is_empty() {
        return registry.get_linker(id);
    }
    let members: Vec<Box<dyn Linker>> = section
        .linkers
        .iter()
        .filter_map(|member| registry.get_linker(member))
        .collect();
    if members.is_empty() {
        log::warn!("Missing linker: no ensemble member could be built");
        return None;
    }
    let groups: Vec<Vec<Entity>> = section
        .variant_groups
        .iter()
        .filter_map(|group| registry.get_entities(group))
        .collect();
    Some(Box::new(
        LinkerEnsemble::new(members)
            .with_variant_groups(groups)
            .with_strategy(section.strategy)
            .with_threshold(section.threshold),
    ))
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("entities", &self.entities.len())
            .field("relations", &self.relations.len())
            .field("mentions_extractor", &self.mentions_extractor.as_ref().map(|c| c.name()))
            .field("linker", &self.linker.as_ref().map(|c| c.name()))
            .field("relations_extractor", &self.relations_extractor.as_ref().map(|c| c.name()))
            .field("knowledge_extractor", &self.knowledge_extractor.as_ref().map(|c| c.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{
        CapitalizedMentionsExtractor, JointKnowledgeExtractor, TriggerRelationsExtractor, VocabularyLinker,
    };
    use crate::ensemble::VotingStrategy;

    fn geo() -> Vec<Entity> {
        vec![
            Entity::new("city", "").with_vocabulary(["Paris"]),
            Entity::new("country", "").with_vocabulary(["France"]),
        ]
    }

    #[test]
    fn test_end2end_linker_disables_mentions_extractor() {
        let pipeline = Pipeline::new()
            .with_mentions_extractor(Box::new(CapitalizedMentionsExtractor::new()))
            .with_linker(Box::new(VocabularyLinker::new()));
        assert!(pipeline.mentions_extractor().is_none());

        let pipeline = Pipeline::new()
            .with_linker(Box::new(VocabularyLinker::new()))
            .with_mentions_extractor(Box::new(CapitalizedMentionsExtractor::new()));
        assert!(pipeline.mentions_extractor().is_none());
    }

    #[test]
    fn test_process_mentions_then_link() {
        let pipeline = Pipeline::new()
            .with_entities(geo())
            .with_mentions_extractor(Box::new(CapitalizedMentionsExtractor::new()))
            .with_linker(Box::new(VocabularyLinker::for_mentions()));
        let mut docs = vec![Document::from_text("We flew to Paris yesterday")];
        pipeline.process(&mut docs).unwrap();

        assert_eq!(docs[0].mentions, [crate::Span::new(11, 16)]);
        assert_eq!(docs[0].entities.len(), 1);
        assert_eq!(docs[0].entities[0].label.as_deref(), Some("city"));
    }

    #[test]
    fn test_process_relations() {
        let pipeline = Pipeline::new()
            .with_entities(geo())
            .with_relations(vec![Relation::new("located in", "")])
            .with_linker(Box::new(VocabularyLinker::new()))
            .with_relations_extractor(Box::new(TriggerRelationsExtractor::new()));
        let mut docs = vec![Document::from_text("Paris is located in France")];
        pipeline.process(&mut docs).unwrap();
        assert_eq!(docs[0].relations.len(), 1);
        assert_eq!(docs[0].relations[0].relation.name, "located in");
    }

    #[test]
    fn test_knowledge_extractor_replaces_linking() {
        let mut linker = VocabularyLinker::new();
        linker.set_kg(&geo());
        let mut relations = TriggerRelationsExtractor::new();
        relations.set_relations(&[Relation::new("located in", "")]);
        let pipeline = Pipeline::new().with_knowledge_extractor(Box::new(JointKnowledgeExtractor::new(
            Box::new(linker),
            Box::new(relations),
        )));
        let mut docs = vec![Document::from_text("Paris is located in France")];
        pipeline.process(&mut docs).unwrap();
        assert_eq!(docs[0].entities.len(), 2);
        assert_eq!(docs[0].relations.len(), 1);
    }

    #[test]
    fn test_set_entities_reaches_linker() {
        let mut pipeline = Pipeline::new().with_linker(Box::new(VocabularyLinker::new()));
        pipeline.set_entities(geo());
        assert_eq!(pipeline.linker().unwrap().entities().len(), 2);
    }

    #[test]
    fn test_from_config_skips_missing_ids() {
        let config = Config::from_toml_str(
            r#"
            [pipeline]
            mentions_extractor = "spacy"
            linker = "vocabulary"
            relations_extractor = "zsrc"
            entities = "unknown"
            "#,
        )
        .unwrap();
        let pipeline = Pipeline::from_config(&config, &ComponentRegistry::with_builtins());
        assert!(pipeline.mentions_extractor().is_none());
        assert_eq!(pipeline.linker().unwrap().name(), "vocabulary");
        assert!(pipeline.relations_extractor().is_none());
        assert!(pipeline.entities().is_empty());
    }

    #[test]
    fn test_from_config_inline_entities() {
        let config = Config::from_toml_str(
            r#"
            [pipeline]
            linker = "vocabulary"

            [pipeline.entities]
            Paris = "capital of France"
            "#,
        )
        .unwrap();
        let pipeline = Pipeline::from_config(&config, &ComponentRegistry::with_builtins());
        let mut docs = vec![Document::from_text("I love Paris")];
        pipeline.process(&mut docs).unwrap();
        assert_eq!(docs[0].entities[0].label.as_deref(), Some("Paris"));
    }

    #[test]
    fn test_from_config_builds_ensemble() {
        let mut registry = ComponentRegistry::with_builtins();
        registry.register_entities("short", geo());
        registry.register_entities("long", geo());
        let config = Config::from_toml_str(
            r#"
            [pipeline]
            linker = "ensemble"
            entities = "short"

            [ensemble]
            linkers = ["vocabulary", "vocabulary"]
            strategy = "count"
            variant_groups = ["short", "long"]
            "#,
        )
        .unwrap();
        assert_eq!(config.ensemble.strategy, VotingStrategy::Count);

        let pipeline = Pipeline::from_config(&config, &registry);
        assert_eq!(pipeline.linker().unwrap().name(), "ensemble");
        let mut docs = vec![Document::from_text("Paris and France")];
        pipeline.process(&mut docs).unwrap();
        assert_eq!(docs[0].entities.len(), 2);
        assert!(docs[0].entities.iter().all(|s| s.score == Some(1.0)));
    }
}
