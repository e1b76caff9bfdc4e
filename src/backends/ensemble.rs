//! Linker ensemble: several linkers, optionally several entity-description
//! variants, one voted span set per document.

use super::{Linker, VocabularyLinker};
use crate::document::Document;
use crate::ensemble::{Ensembler, VotingStrategy};
use crate::sync::{lock, Mutex};
use crate::{Entity, Result, Span};

/// Runs every linker against every entity-variant group and votes.
///
/// With `L` linkers and `G` variant groups there are `L * G` voters. Without
/// variant groups each linker votes once with the entities set via
/// [`Linker::set_kg`].
pub struct LinkerEnsemble {
    linkers: Mutex<Vec<Box<dyn Linker>>>,
    variant_groups: Option<Vec<Vec<Entity>>>,
    entities: Vec<Entity>,
    ensembler: Ensembler,
}

impl LinkerEnsemble {
    /// Ensemble over `linkers`.
    #[must_use]
    pub fn new(linkers: Vec<Box<dyn Linker>>) -> Self {
        let ensembler = Ensembler::new(linkers.len());
        Self {
            linkers: Mutex::new(linkers),
            variant_groups: None,
            entities: Vec::new(),
            ensembler,
        }
    }

    /// Run every linker once per group of entity descriptions.
    ///
    /// Groups usually describe the same entity names differently.
    #[must_use]
    pub fn with_variant_groups(mut self, groups: Vec<Vec<Entity>>) -> Self {
        self.ensembler = self.ensembler.with_variant_groups(groups.len());
        self.variant_groups = (!groups.is_empty()).then_some(groups);
        self
    }

    /// Set the voting strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: VotingStrategy) -> Self {
        self.ensembler = self.ensembler.with_strategy(strategy);
        self
    }

    /// Set the acceptance threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.ensembler = self.ensembler.with_threshold(threshold);
        self
    }

    /// Voting configuration.
    #[must_use]
    pub fn ensembler(&self) -> &Ensembler {
        &self.ensembler
    }

    /// Number of member linkers.
    #[must_use]
    pub fn num_linkers(&self) -> usize {
        lock(&self.linkers).len()
    }

    fn collect_votes(&self, docs: &[Document]) -> Result<Vec<Vec<Vec<Span>>>> {
        let mut linkers = lock(&self.linkers);
        let mut per_voter = Vec::with_capacity(self.ensembler.number_pipelines());
        match &self.variant_groups {
            Some(groups) => {
                let voted: Result<()> = groups.iter().enumerate().try_for_each(|(idx, group)| {
                    log::debug!("variant group {idx}: {} entities", group.len());
                    for linker in linkers.iter_mut() {
                        linker.set_kg(group);
                        per_voter.push(linker.predict(docs)?);
                    }
                    Ok(())
                });
                // Members go back to the base entities even when a vote failed.
                for linker in linkers.iter_mut() {
                    linker.set_kg(&self.entities);
                }
                voted?;
            }
            None => {
                for linker in linkers.iter() {
                    per_voter.push(linker.predict(docs)?);
                }
            }
        }
        Ok(per_voter)
    }
}

impl Default for LinkerEnsemble {
    fn default() -> Self {
        Self::new(vec![Box::new(VocabularyLinker::new())])
    }
}

impl std::fmt::Debug for LinkerEnsemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = lock(&self.linkers)
            .iter()
            .map(|l| l.name().to_string())
            .collect();
        f.debug_struct("LinkerEnsemble")
            .field("linkers", &names)
            .field("variant_groups", &self.variant_groups.as_ref().map(Vec::len))
            .field("ensembler", &self.ensembler)
            .finish()
    }
}

impl Linker for LinkerEnsemble {
    fn name(&self) -> &str {
        "ensemble"
    }

    fn set_kg(&mut self, entities: &[Entity]) {
        self.entities = entities.to_vec();
        for linker in lock(&self.linkers).iter_mut() {
            linker.set_kg(entities);
        }
    }

    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn predict(&self, docs: &[Document]) -> Result<Vec<Vec<Span>>> {
        let per_voter = self.collect_votes(docs)?;
        self.ensembler.prediction_ensemble(&per_voter)
    }

    fn is_end2end(&self) -> bool {
        let linkers = lock(&self.linkers);
        !linkers.is_empty() && linkers.iter().all(|l| l.is_end2end())
    }
}
