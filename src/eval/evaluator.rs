//! Adapters from model output to sequence-labeling metrics.
//!
//! Predictions arrive as character spans; references arrive as IOB2 tags
//! over pre-split words. The token evaluator rebuilds each sentence's
//! offsets from its words, runs alignment and overlap resolution, and
//! scores the resulting tags.

use super::bio::relabel_as_mention;
use super::seqeval::{self, MatchMode, SequenceScores};
use crate::align::AlignmentMode;
use crate::resolve::filter_overlapping_spans;
use crate::{Error, Result, Span};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Metric input: one tag sequence per sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionsPayload {
    /// IOB2 tags.
    pub predictions: Vec<Vec<String>>,
}

/// Scores span predictions against tagged sentences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenClassificationEvaluator {
    alignment_mode: AlignmentMode,
    match_mode: MatchMode,
}

impl TokenClassificationEvaluator {
    /// Expand alignment, entity-level matching.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how predicted spans snap to words.
    #[must_use]
    pub fn with_alignment_mode(mut self, mode: AlignmentMode) -> Self {
        self.alignment_mode = mode;
        self
    }

    /// Set the unit of comparison.
    #[must_use]
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Alignment mode in use.
    #[must_use]
    pub fn alignment_mode(&self) -> AlignmentMode {
        self.alignment_mode
    }

    /// Match mode in use.
    #[must_use]
    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// Turn per-sentence span predictions into IOB2 tags.
    ///
    /// Sentence `i`'s offsets are derived from `sentences[i]` joined by
    /// `join_by`; prediction offsets must refer to that joined text.
    ///
    /// # Errors
    ///
    /// [`Error::Evaluation`] when predictions and sentences differ in count.
    pub fn predictions_processor<S: AsRef<str> + Sync>(
        &self,
        predictions: &[Vec<Span>],
        sentences: &[Vec<S>],
        join_by: &str,
    ) -> Result<PredictionsPayload> {
        if predictions.len() != sentences.len() {
            return Err(Error::evaluation(format!(
                "{} prediction lists for {} sentences",
                predictions.len(),
                sentences.len()
            )));
        }
        let tag = |(spans, words): (&Vec<Span>, &Vec<S>)| -> Result<Vec<String>> {
            let resolution = filter_overlapping_spans(spans, words, None, Some(join_by), self.alignment_mode)?;
            Ok(resolution.bio)
        };

        #[cfg(feature = "eval-parallel")]
        let predictions = {
            use rayon::prelude::*;
            predictions
                .par_iter()
                .zip(sentences.par_iter())
                .map(tag)
                .collect::<Result<Vec<_>>>()?
        };
        #[cfg(not(feature = "eval-parallel"))]
        let predictions = predictions
            .iter()
            .zip(sentences)
            .map(tag)
            .collect::<Result<Vec<_>>>()?;

        Ok(PredictionsPayload { predictions })
    }

    /// Tag the predictions and score them against `references`.
    ///
    /// # Errors
    ///
    /// Fails when any of the three inputs disagree in length.
    pub fn compute<S, R>(
        &self,
        predictions: &[Vec<Span>],
        sentences: &[Vec<S>],
        references: &[Vec<R>],
        join_by: &str,
    ) -> Result<SequenceScores>
    where
        S: AsRef<str> + Sync,
        R: AsRef<str>,
    {
        let payload = self.predictions_processor(predictions, sentences, join_by)?;
        let scores = seqeval::compute(&payload.predictions, references, self.match_mode)?;
        log::debug!(
            "scored {} sentences ({}): f1 micro {:.4}",
            references.len(),
            self.match_mode,
            scores.overall_f1_micro
        );
        Ok(scores)
    }
}

/// Scores untyped mention predictions.
///
/// Reference types are collapsed to `MENTION`, so only boundaries count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MentionsEvaluator {
    inner: TokenClassificationEvaluator,
}

impl MentionsEvaluator {
    /// Wrap a token evaluator.
    #[must_use]
    pub fn new(inner: TokenClassificationEvaluator) -> Self {
        Self { inner }
    }

    /// References with every type replaced by `MENTION`.
    #[must_use]
    pub fn prepare_references<R: AsRef<str>>(references: &[Vec<R>]) -> Vec<Vec<String>> {
        references
            .iter()
            .map(|sentence| {
                sentence
                    .iter()
                    .map(|tag| relabel_as_mention(tag.as_ref()))
                    .collect()
            })
            .collect()
    }

    /// Score mention predictions.
    ///
    /// # Errors
    ///
    /// Same conditions as [`TokenClassificationEvaluator::compute`].
    pub fn compute<S, R>(
        &self,
        predictions: &[Vec<Span>],
        sentences: &[Vec<S>],
        references: &[Vec<R>],
        join_by: &str,
    ) -> Result<SequenceScores>
    where
        S: AsRef<str> + Sync,
        R: AsRef<str>,
    {
        let references = Self::prepare_references(references);
        self.inner.compute(predictions, sentences, &references, join_by)
    }
}

/// Output of [`RelationEvaluator::compute`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RelationScores {
    /// Micro-averaged precision.
    pub overall_precision_micro: f64,
    /// Micro-averaged recall.
    pub overall_recall_micro: f64,
    /// Micro-averaged F1.
    pub overall_f1_micro: f64,
    /// Macro-averaged precision.
    pub overall_precision_macro: f64,
    /// Macro-averaged recall.
    pub overall_recall_macro: f64,
    /// Macro-averaged F1.
    pub overall_f1_macro: f64,
    /// Number of exact label matches (a count, not a fraction).
    pub overall_accuracy: usize,
}

/// Compares predicted relation labels directly with reference labels.
///
/// Relation endpoints are assumed correct; only the label is scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelationEvaluator;

impl RelationEvaluator {
    /// Score one predicted label per reference label.
    ///
    /// # Errors
    ///
    /// [`Error::Evaluation`] when the two lists differ in length.
    ///
    /// # Example
    ///
    /// ```rust
    /// use zeroner::eval::RelationEvaluator;
    ///
    /// let scores = RelationEvaluator
    ///     .compute(&["born in", "works for", "born in"], &["born in", "born in", "born in"])
    ///     .unwrap();
    /// assert_eq!(scores.overall_accuracy, 2);
    /// ```
    pub fn compute<P: AsRef<str>, R: AsRef<str>>(&self, predictions: &[P], references: &[R]) -> Result<RelationScores> {
        if predictions.len() != references.len() {
            return Err(Error::evaluation(format!(
                "{} predicted relations for {} references",
                predictions.len(),
                references.len()
            )));
        }
        let pairs: Vec<(&str, &str)> = predictions
            .iter()
            .zip(references)
            .map(|(p, r)| (p.as_ref(), r.as_ref()))
            .collect();
        let correct = pairs.iter().filter(|(p, r)| p == r).count();

        // Single-label classification: micro P, R and F1 all reduce to accuracy.
        let micro = if pairs.is_empty() {
            0.0
        } else {
            correct as f64 / pairs.len() as f64
        };

        let labels: BTreeSet<&str> = pairs.iter().flat_map(|(p, r)| [*p, *r]).collect();
        let (mut p_sum, mut r_sum, mut f_sum) = (0.0, 0.0, 0.0);
        for label in &labels {
            let hits = pairs.iter().filter(|(p, r)| p == label && r == label).count();
            let predicted = pairs.iter().filter(|(p, _)| p == label).count();
            let gold = pairs.iter().filter(|(_, r)| r == label).count();
            let precision = if predicted == 0 { 0.0 } else { hits as f64 / predicted as f64 };
            let recall = if gold == 0 { 0.0 } else { hits as f64 / gold as f64 };
            p_sum += precision;
            r_sum += recall;
            if precision + recall > 0.0 {
                f_sum += 2.0 * precision * recall / (precision + recall);
            }
        }
        let n = labels.len().max(1) as f64;

        Ok(RelationScores {
            overall_precision_micro: micro,
            overall_recall_micro: micro,
            overall_f1_micro: micro,
            overall_precision_macro: p_sum / n,
            overall_recall_macro: r_sum / n,
            overall_f1_macro: f_sum / n,
            overall_accuracy: correct,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_york() -> Vec<Vec<&'static str>> {
        vec![vec!["New", "York", "is", "beautiful"]]
    }

    #[test]
    fn test_predictions_processor() {
        let evaluator = TokenClassificationEvaluator::new();
        let preds = vec![vec![Span::scored(0, 8, "FAC", 1.0), Span::scored(4, 8, "LOC", 0.7)]];
        let payload = evaluator.predictions_processor(&preds, &new_york(), " ").unwrap();
        assert_eq!(payload.predictions, [["B-FAC", "I-FAC", "O", "O"]]);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"predictions": [["B-FAC", "I-FAC", "O", "O"]]})
        );
    }

    #[test]
    fn test_contract_alignment_drops_partial_word() {
        let evaluator = TokenClassificationEvaluator::new().with_alignment_mode(AlignmentMode::Contract);
        let preds = vec![vec![Span::scored(0, 6, "FAC", 1.0)]];
        let payload = evaluator.predictions_processor(&preds, &new_york(), " ").unwrap();
        assert_eq!(payload.predictions, [["B-FAC", "O", "O", "O"]]);
    }

    #[test]
    fn test_compute_token_mode_partial_credit() {
        let evaluator = TokenClassificationEvaluator::new().with_match_mode(MatchMode::Token);
        let preds = vec![vec![Span::scored(4, 8, "FAC", 1.0)]];
        let refs = vec![vec!["B-FAC", "I-FAC", "O", "O"]];
        let s = evaluator.compute(&preds, &new_york(), &refs, " ").unwrap();
        assert_eq!(s.overall_precision_micro, 1.0);
        assert_eq!(s.overall_recall_micro, 0.5);
        assert_eq!(s.overall_accuracy, 0.75);
    }

    #[test]
    fn test_sentence_count_mismatch() {
        let err = TokenClassificationEvaluator::new()
            .predictions_processor(&[vec![]], &Vec::<Vec<&str>>::new(), " ")
            .unwrap_err();
        assert!(matches!(err, Error::Evaluation(_)));
    }

    #[test]
    fn test_mentions_evaluator() {
        let refs = vec![vec!["B-PER", "I-PER", "O", "GPE"]];
        assert_eq!(
            MentionsEvaluator::prepare_references(&refs),
            [["B-MENTION", "I-MENTION", "O", "MENTION"]]
        );

        let preds = vec![vec![Span::new(0, 8)]];
        let refs = vec![vec!["B-FAC", "I-FAC", "O", "O"]];
        let s = MentionsEvaluator::default()
            .compute(&preds, &new_york(), &refs, " ")
            .unwrap();
        assert_eq!(s.overall_f1_micro, 1.0);
        assert!(s.per_type.contains_key("MENTION"));
    }

    #[test]
    fn test_relation_evaluator() {
        let preds = ["born in", "works for", "born in", "lives in"];
        let refs = ["born in", "born in", "born in", "lives in"];
        let s = RelationEvaluator.compute(&preds, &refs).unwrap();
        assert_eq!(s.overall_accuracy, 3);
        assert!((s.overall_f1_micro - 0.75).abs() < 1e-9);
        // born in: p=1 r=2/3; works for: p=0 r=0; lives in: p=1 r=1
        assert!((s.overall_precision_macro - 2.0 / 3.0).abs() < 1e-9);
        assert!((s.overall_recall_macro - (2.0 / 3.0 + 1.0) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_relation_evaluator_length_mismatch() {
        assert!(RelationEvaluator.compute(&["a"], &["a", "b"]).is_err());
        let empty: [&str; 0] = [];
        assert_eq!(RelationEvaluator.compute(&empty, &empty).unwrap().overall_accuracy, 0);
    }
}
