//! Evaluation: span predictions against IOB2-tagged references.
//!
//! - [`bio`]: tag parsing, chunking, relabelling
//! - [`seqeval`]: precision / recall / F1 / accuracy over tag sequences
//! - [`evaluator`]: span predictions to tags, plus the mention and relation variants
//! - [`report`]: run a [`Pipeline`](crate::pipeline::Pipeline) over labelled datasets
//!
//! # Example
//!
//! ```rust
//! use zeroner::eval::{MatchMode, TokenClassificationEvaluator};
//! use zeroner::Span;
//!
//! let sentences = vec![vec!["New", "York", "is", "beautiful"]];
//! let predictions = vec![vec![Span::scored(4, 8, "FAC", 0.9)]];
//! let references = vec![vec!["B-FAC", "I-FAC", "O", "O"]];
//!
//! let scores = TokenClassificationEvaluator::new()
//!     .with_match_mode(MatchMode::Token)
//!     .compute(&predictions, &sentences, &references, " ")
//!     .unwrap();
//! assert_eq!(scores.overall_recall_micro, 0.5);
//! ```

pub mod bio;
pub mod evaluator;
pub mod report;
pub mod seqeval;

pub use evaluator::{
    MentionsEvaluator, PredictionsPayload, RelationEvaluator, RelationScores,
    TokenClassificationEvaluator,
};
pub use report::{evaluate, ComponentScores, EvaluationReport, LabelledDataset};
pub use seqeval::{MatchMode, SequenceScores, TypeScores};
