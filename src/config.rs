//! TOML configuration.
//!
//! Every field has a default, so an empty file is a valid configuration.
//!
//! ```toml
//! [pipeline]
//! mentions_extractor = "capitalized"
//! linker = "ensemble"
//! relations_extractor = "trigger"
//! entities = "fruits"                  # a registered set ...
//!
//! [pipeline.relations]                  # ... or inline name = description
//! "located in" = "spatial containment"
//!
//! [alignment]
//! mode = "expand"
//!
//! [ensemble]
//! linkers = ["vocabulary"]
//! strategy = "max"
//! threshold = 0.5
//! variant_groups = ["fruits-short", "fruits-long"]
//!
//! [evaluation]
//! join_by = " "
//! match_mode = "entity"
//! ```

use crate::align::AlignmentMode;
use crate::ensemble::{VotingStrategy, DEFAULT_THRESHOLD};
use crate::eval::MatchMode;
use crate::{Entity, Error, Relation, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Entity or relation types: a registry ID or an inline `name = description` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Definitions {
    /// ID of a set in the [`ComponentRegistry`](crate::registry::ComponentRegistry).
    Registered(String),
    /// Names mapped to descriptions.
    Inline(BTreeMap<String, String>),
}

impl Definitions {
    /// Inline definitions as entity types.
    #[must_use]
    pub fn inline_entities(&self) -> Option<Vec<Entity>> {
        match self {
            Definitions::Registered(_) => None,
            Definitions::Inline(map) => Some(map.iter().map(|(n, d)| Entity::new(n, d)).collect()),
        }
    }

    /// Inline definitions as relation types.
    #[must_use]
    pub fn inline_relations(&self) -> Option<Vec<Relation>> {
        match self {
            Definitions::Registered(_) => None,
            Definitions::Inline(map) => Some(map.iter().map(|(n, d)| Relation::new(n, d)).collect()),
        }
    }
}

/// `[pipeline]`: component IDs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Mentions extractor ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentions_extractor: Option<String>,
    /// Linker ID. `"ensemble"` is assembled from `[ensemble]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linker: Option<String>,
    /// Relations extractor ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relations_extractor: Option<String>,
    /// Entity types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Definitions>,
    /// Relation types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relations: Option<Definitions>,
}

/// `[alignment]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Alignment policy.
    pub mode: AlignmentMode,
}

/// `[ensemble]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Member linker IDs.
    pub linkers: Vec<String>,
    /// Voting strategy.
    pub strategy: VotingStrategy,
    /// Acceptance threshold; aggregated scores must exceed it.
    pub threshold: f64,
    /// Registered entity-set IDs, one per description variant.
    pub variant_groups: Vec<String>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            linkers: Vec::new(),
            strategy: VotingStrategy::default(),
            threshold: DEFAULT_THRESHOLD,
            variant_groups: Vec::new(),
        }
    }
}

/// `[evaluation]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Separator used to rebuild text from words.
    pub join_by: String,
    /// Unit of comparison.
    pub match_mode: MatchMode,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            join_by: " ".to_string(),
            match_mode: MatchMode::default(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pipeline components.
    pub pipeline: PipelineConfig,
    /// Alignment settings.
    pub alignment: AlignmentConfig,
    /// Ensemble settings.
    pub ensemble: EnsembleConfig,
    /// Evaluation settings.
    pub evaluation: EvaluationConfig,
}

impl Config {
    /// Parse and validate TOML.
    ///
    /// # Errors
    ///
    /// [`Error::Toml`] on malformed input, [`Error::Config`] on invalid values.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file.
    ///
    /// # Errors
    ///
    /// I/O failures plus everything [`Config::from_toml_str`] rejects.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        log::debug!("loaded config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Serialize to pretty TOML.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(format!("failed to serialize config: {e}")))
    }

    /// Write to a TOML file.
    ///
    /// # Errors
    ///
    /// Serialization or I/O failure.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.ensemble.threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(Error::config(format!(
                "ensemble.threshold must be in [0, 1], got {threshold}"
            )));
        }
        if self.ensemble.linkers.iter().any(|id| id.trim().is_empty()) {
            return Err(Error::config("ensemble.linkers contains an empty ID"));
        }
        Ok(())
    }
}
