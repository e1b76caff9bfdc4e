//! Sequence-labeling metrics over IOB2 tag sequences.
//!
//! Two ways to decide what counts as a hit:
//!
//! | Mode | Unit | Hit when |
//! |------|------|----------|
//! | [`MatchMode::Entity`] | chunk | type, first and last token all equal a reference chunk |
//! | [`MatchMode::Token`] | token | the prefix-stripped label equals the reference's |
//!
//! Token mode gives partial credit: predicting only `York` for a gold
//! `New York` earns one true positive out of two gold tokens.
//!
//! Micro scores pool counts over all types; macro scores average the
//! per-type scores over every type seen in references or predictions.
//! Any ratio with a zero denominator is 0.

use super::bio::{chunks, strip_prefix};
use crate::resolve::OUTSIDE;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Unit of comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Whole chunks must match exactly.
    #[default]
    Entity,
    /// Tokens are compared one by one.
    Token,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Entity => write!(f, "entity"),
            MatchMode::Token => write!(f, "token"),
        }
    }
}

impl FromStr for MatchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "entity" | "strict" => Ok(MatchMode::Entity),
            "token" => Ok(MatchMode::Token),
            other => Err(Error::invalid_input(format!(
                "unknown match mode '{other}' (expected 'entity' or 'token')"
            ))),
        }
    }
}

/// Scores for one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeScores {
    /// Precision.
    pub precision: f64,
    /// Recall.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Number of reference units of this type.
    pub support: usize,
}

/// Output of [`compute`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SequenceScores {
    /// Per-type scores, keyed by type name.
    #[serde(flatten)]
    pub per_type: BTreeMap<String, TypeScores>,
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
    /// Fraction of tokens whose tag matches the reference.
    pub overall_accuracy: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    hits: usize,
    predicted: usize,
    gold: usize,
}

impl Tally {
    fn add(&mut self, other: Tally) {
        self.hits += other.hits;
        self.predicted += other.predicted;
        self.gold += other.gold;
    }

    fn scores(self) -> TypeScores {
        let precision = ratio(self.hits, self.predicted);
        let recall = ratio(self.hits, self.gold);
        TypeScores {
            precision,
            recall,
            f1: f1(precision, recall),
            support: self.gold,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn check_lengths<P: AsRef<str>, R: AsRef<str>>(predictions: &[Vec<P>], references: &[Vec<R>]) -> Result<()> {
    if predictions.len() != references.len() {
        return Err(Error::evaluation(format!(
            "{} prediction sequences for {} references",
            predictions.len(),
            references.len()
        )));
    }
    for (idx, (pred, gold)) in predictions.iter().zip(references).enumerate() {
        if pred.len() != gold.len() {
            return Err(Error::evaluation(format!(
                "sequence {idx}: {} predicted tags for {} reference tags",
                pred.len(),
                gold.len()
            )));
        }
    }
    Ok(())
}

fn tally_entities<P: AsRef<str>, R: AsRef<str>>(
    predictions: &[Vec<P>],
    references: &[Vec<R>],
) -> BTreeMap<String, Tally> {
    let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();
    for (pred, gold) in predictions.iter().zip(references) {
        let gold_chunks = chunks(gold);
        let gold_set: HashSet<_> = gold_chunks.iter().collect();
        for chunk in &gold_chunks {
            tallies.entry(chunk.label.clone()).or_default().gold += 1;
        }
        for chunk in chunks(pred) {
            let hit = gold_set.contains(&chunk);
            let tally = tallies.entry(chunk.label).or_default();
            tally.predicted += 1;
            tally.hits += usize::from(hit);
        }
    }
    tallies
}

fn tally_tokens<P: AsRef<str>, R: AsRef<str>>(
    predictions: &[Vec<P>],
    references: &[Vec<R>],
) -> BTreeMap<String, Tally> {
    let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();
    for (pred, gold) in predictions.iter().zip(references) {
        for (p, g) in pred.iter().zip(gold) {
            let (p, g) = (strip_prefix(p.as_ref()), strip_prefix(g.as_ref()));
            if g != OUTSIDE {
                tallies.entry(g.to_string()).or_default().gold += 1;
            }
            if p != OUTSIDE {
                let tally = tallies.entry(p.to_string()).or_default();
                tally.predicted += 1;
                tally.hits += usize::from(p == g);
            }
        }
    }
    tallies
}

fn accuracy<P: AsRef<str>, R: AsRef<str>>(
    predictions: &[Vec<P>],
    references: &[Vec<R>],
    mode: MatchMode,
) -> f64 {
    let mut total = 0;
    let mut correct = 0;
    for (pred, gold) in predictions.iter().zip(references) {
        for (p, g) in pred.iter().zip(gold) {
            total += 1;
            let same = match mode {
                MatchMode::Entity => p.as_ref() == g.as_ref(),
                MatchMode::Token => strip_prefix(p.as_ref()) == strip_prefix(g.as_ref()),
            };
            correct += usize::from(same);
        }
    }
    ratio(correct, total)
}

/// Score predicted tag sequences against references.
///
/// # Errors
///
/// [`Error::Evaluation`] when the number of sequences, or the length of any
/// pair of sequences, differs.
///
/// # Example
///
/// ```rust
/// use zeroner::eval::seqeval::{compute, MatchMode};
///
/// let predictions = vec![vec!["O", "B-FAC", "O", "O"]];
/// let references = vec![vec!["B-FAC", "I-FAC", "O", "O"]];
///
/// let scores = compute(&predictions, &references, MatchMode::Token).unwrap();
/// assert_eq!(scores.overall_precision_micro, 1.0);
/// assert_eq!(scores.overall_recall_micro, 0.5);
/// assert_eq!(scores.overall_accuracy, 0.75);
/// ```
pub fn compute<P, R>(predictions: &[Vec<P>], references: &[Vec<R>], mode: MatchMode) -> Result<SequenceScores>
where
    P: AsRef<str>,
    R: AsRef<str>,
{
    check_lengths(predictions, references)?;
    let tallies = match mode {
        MatchMode::Entity => tally_entities(predictions, references),
        MatchMode::Token => tally_tokens(predictions, references),
    };

    let mut pooled = Tally::default();
    for tally in tallies.values() {
        pooled.add(*tally);
    }
    let micro = pooled.scores();

    let per_type: BTreeMap<String, TypeScores> = tallies
        .into_iter()
        .map(|(label, tally)| (label, tally.scores()))
        .collect();
    let n_types = per_type.len();
    let mean = |field: fn(&TypeScores) -> f64| {
        if n_types == 0 {
            0.0
        } else {
            per_type.values().map(field).sum::<f64>() / n_types as f64
        }
    };
    let (p_macro, r_macro, f_macro) = (mean(|s| s.precision), mean(|s| s.recall), mean(|s| s.f1));

    Ok(SequenceScores {
        overall_precision_micro: micro.precision,
        overall_recall_micro: micro.recall,
        overall_f1_micro: micro.f1,
        overall_precision_macro: p_macro,
        overall_recall_macro: r_macro,
        overall_f1_macro: f_macro,
        overall_accuracy: accuracy(predictions, references, mode),
        per_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_partial_match_token_mode() {
        let pred = vec![vec!["O", "B-FAC", "O", "O"]];
        let gold = vec![vec!["B-FAC", "I-FAC", "O", "O"]];
        let s = compute(&pred, &gold, MatchMode::Token).unwrap();
        assert!(approx(s.overall_precision_micro, 1.0));
        assert!(approx(s.overall_recall_micro, 0.5));
        assert!(approx(s.overall_f1_micro, 2.0 / 3.0));
        assert!(approx(s.overall_accuracy, 0.75));
        assert_eq!(s.per_type["FAC"].support, 2);
    }

    #[test]
    fn test_partial_match_entity_mode_is_a_miss() {
        let pred = vec![vec!["O", "B-FAC", "O", "O"]];
        let gold = vec![vec!["B-FAC", "I-FAC", "O", "O"]];
        let s = compute(&pred, &gold, MatchMode::Entity).unwrap();
        assert!(approx(s.overall_precision_micro, 0.0));
        assert!(approx(s.overall_recall_micro, 0.0));
        assert!(approx(s.overall_f1_micro, 0.0));
        assert!(approx(s.overall_accuracy, 0.5));
    }

    #[test]
    fn test_exact_match() {
        let tags = vec![vec!["B-FAC", "I-FAC", "O", "O"]];
        let s = compute(&tags, &tags, MatchMode::Entity).unwrap();
        assert!(approx(s.overall_f1_micro, 1.0));
        assert!(approx(s.overall_f1_macro, 1.0));
        assert!(approx(s.overall_accuracy, 1.0));
    }

    #[test]
    fn test_macro_averages_over_predicted_types_too() {
        let pred = vec![vec!["B-PER", "B-ORG"]];
        let gold = vec![vec!["B-PER", "O"]];
        let s = compute(&pred, &gold, MatchMode::Entity).unwrap();
        assert!(approx(s.overall_precision_micro, 0.5));
        assert!(approx(s.overall_recall_micro, 1.0));
        // PER: p=1 r=1; ORG: p=0 r=0
        assert!(approx(s.overall_precision_macro, 0.5));
        assert!(approx(s.overall_recall_macro, 0.5));
        assert_eq!(s.per_type["ORG"].support, 0);
    }

    #[test]
    fn test_all_outside_is_zero_not_nan() {
        let tags = vec![vec!["O", "O"]];
        let s = compute(&tags, &tags, MatchMode::Entity).unwrap();
        assert_eq!(s.overall_f1_micro, 0.0);
        assert_eq!(s.overall_f1_macro, 0.0);
        assert!(approx(s.overall_accuracy, 1.0));
        assert!(s.per_type.is_empty());
    }

    #[test]
    fn test_length_mismatch() {
        let err = compute(&[vec!["O"]], &[vec!["O", "O"]], MatchMode::Token).unwrap_err();
        assert!(matches!(err, Error::Evaluation(_)));
        assert!(compute(&[vec!["O"]], &Vec::<Vec<&str>>::new(), MatchMode::Token).is_err());
    }

    #[test]
    fn test_serialized_keys() {
        let tags = vec![vec!["B-FAC", "O"]];
        let s = compute(&tags, &tags, MatchMode::Entity).unwrap();
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("overall_f1_micro").is_some());
        assert_eq!(json["FAC"]["support"], 1);
    }

    #[test]
    fn test_match_mode_parsing() {
        assert_eq!("TOKEN".parse::<MatchMode>().unwrap(), MatchMode::Token);
        assert_eq!("strict".parse::<MatchMode>().unwrap(), MatchMode::Entity);
        assert!("fuzzy".parse::<MatchMode>().is_err());
    }
}
