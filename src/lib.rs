//! # zeroner
//!
//! Zero-shot NER post-processing for Rust.
//!
//! Backends (sequence taggers, description-conditioned classifiers,
//! ensembles) emit raw character spans that may overlap, cut through
//! tokens, or disagree with each other. This crate turns them into
//! something a downstream consumer or a metric can use:
//!
//! - **Alignment** ([`align`]): which reference tokens each span touches
//! - **Resolution** ([`resolve`]): one non-overlapping, token-aligned span
//!   sequence plus IOB2 tags
//! - **Ensembling** ([`ensemble`]): vote across several predictors
//! - **Evaluation** ([`eval`]): precision / recall / F1 against gold tags
//!
//! Prediction itself sits behind the traits in [`backends`]; a
//! [`Pipeline`](pipeline::Pipeline) chains them and can be assembled from a
//! TOML [`Config`](config::Config) through a
//! [`ComponentRegistry`](registry::ComponentRegistry).
//!
//! ## Quick Start
//!
//! ```rust
//! use zeroner::prelude::*;
//!
//! let tokens = ["New", "York", "is", "beautiful"];
//! let spans = [
//!     Span::scored(0, 8, "FAC", 1.0),
//!     Span::scored(4, 8, "LOC", 0.7),
//! ];
//!
//! let resolution = filter_overlapping_spans(&spans, &tokens, None, Some(" "), AlignmentMode::Expand)?;
//! assert_eq!(resolution.bio, ["B-FAC", "I-FAC", "O", "O"]);
//! # Ok::<(), zeroner::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Effect |
//! |---------|--------|
//! | `eval-parallel` | evaluate and ensemble documents in parallel with rayon |
//! | `fast-lock` | `parking_lot` mutexes inside [`LinkerEnsemble`](backends::LinkerEnsemble) |
//!
//! ## Logging
//!
//! The library logs through the [`log`] facade: `debug!` for per-document
//! decisions, `warn!` when configuration is silently degraded (missing
//! registry IDs, a mentions extractor disabled by an end-to-end linker).

#![warn(missing_docs)]

pub mod align;
pub mod backends;
pub mod config;
pub mod document;
pub mod ensemble;
mod error;
pub mod eval;
pub mod offset;
pub mod pipeline;
pub mod registry;
pub mod resolve;
mod sync;

pub use zeroner_core::{Entity, Relation, RelationSpan, Span};

pub use error::{Error, Result};

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    //!
    //! ```rust
    //! use zeroner::prelude::*;
    //!
    //! let ensembler = Ensembler::new(2).with_strategy(VotingStrategy::Count);
    //! let voter_a = vec![vec![Span::scored(0, 6, "fruits", 0.9)]];
    //! let voter_b = vec![vec![Span::scored(0, 6, "fruits", 0.4)]];
    //! let merged = ensembler.prediction_ensemble(&[voter_a, voter_b]).unwrap();
    //! assert_eq!(merged[0][0].score, Some(1.0));
    //! ```
    pub use crate::align::{align_spans, Alignment, AlignmentMode};
    pub use crate::backends::{KnowledgeExtractor, Linker, MentionsExtractor, RelationsExtractor};
    pub use crate::document::Document;
    pub use crate::ensemble::{Ensembler, VotingStrategy};
    pub use crate::error::{Error, Result};
    pub use crate::eval::{MatchMode, TokenClassificationEvaluator};
    pub use crate::offset::{ReferenceSpanExt, TokenOffsets, TokenSpan};
    pub use crate::pipeline::Pipeline;
    pub use crate::resolve::{filter_overlapping_spans, Resolution};
    pub use crate::{Entity, Relation, RelationSpan, Span};
}
