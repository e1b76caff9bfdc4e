//! Ensemble voting over span predictions from several voters.
//!
//! A *voter* is one linker run against one set of entity descriptions.
//! Each voter predicts spans for the same documents; the ensemble merges
//! them into one agreed span set per document.
//!
//! # Pipeline
//!
//! ```text
//!   voter 0 spans ─┐
//!   voter 1 spans ─┼─► union by (start, end) ─► sub-span scoring ─► vote ─► threshold ─► inclusive
//!   voter N spans ─┘
//! ```
//!
//! 1. **Union**: group every predicted span by its exact interval.
//! 2. **Sub-span scoring**: a voter that predicted a wider span around an
//!    interval, but nothing at the interval itself, casts one vote there
//!    with its wider span's label and score.
//! 3. **Vote**: per interval, accumulate a score per label and keep the best.
//!    - [`VotingStrategy::Max`]: each vote adds `score / N`
//!    - [`VotingStrategy::Count`]: each vote adds `1 / N`
//! 4. **Threshold**: drop intervals whose winning score is `<= threshold`.
//! 5. **Inclusive**: drop intervals strictly inside another survivor.
//!
//! `N` is the number of voters: linkers times entity-variant groups.
//!
//! # Example
//!
//! ```rust
//! use zeroner::ensemble::{Ensembler, VotingStrategy};
//! use zeroner::Span;
//!
//! let voter_a = vec![vec![Span::scored(0, 6, "fruits", 0.9)]];
//! let voter_b = vec![vec![Span::scored(0, 6, "fruits", 0.8)]];
//!
//! let ensembler = Ensembler::new(2).with_strategy(VotingStrategy::Max);
//! let merged = ensembler.prediction_ensemble(&[voter_a, voter_b]).unwrap();
//! assert_eq!(merged[0].len(), 1);
//! assert!((merged[0][0].score.unwrap() - 0.85).abs() < 1e-9);
//! ```

use crate::resolve::best_candidate;
use crate::{Error, Result, Span};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default acceptance threshold for aggregated scores.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Votes grouped by exact `(start, end)` interval.
pub type CandidateMap = BTreeMap<(usize, usize), Vec<Span>>;

/// How votes at one interval are weighed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotingStrategy {
    /// Confidence-weighted: each vote contributes `score / N`.
    #[default]
    Max,
    /// Majority: each vote contributes `1 / N`.
    Count,
}

impl fmt::Display for VotingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VotingStrategy::Max => write!(f, "max"),
            VotingStrategy::Count => write!(f, "count"),
        }
    }
}

impl FromStr for VotingStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "max" => Ok(VotingStrategy::Max),
            "count" => Ok(VotingStrategy::Count),
            other => Err(Error::invalid_input(format!(
                "unknown voting strategy '{other}' (expected 'max' or 'count')"
            ))),
        }
    }
}

/// Accumulated score per label, in first-seen label order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelVotes {
    votes: Vec<(Option<String>, f64)>,
}

impl LabelVotes {
    /// Add `weight` to `label`.
    pub fn add(&mut self, label: Option<&str>, weight: f64) {
        match self.votes.iter_mut().find(|(l, _)| l.as_deref() == label) {
            Some((_, score)) => *score += weight,
            None => self.votes.push((label.map(str::to_string), weight)),
        }
    }

    /// Accumulated `(label, score)` pairs.
    #[must_use]
    pub fn as_slice(&self) -> &[(Option<String>, f64)] {
        &self.votes
    }

    /// Sum over all labels.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.votes.iter().map(|(_, s)| s).sum()
    }
}

impl FromIterator<(Option<String>, f64)> for LabelVotes {
    fn from_iter<I: IntoIterator<Item = (Option<String>, f64)>>(iter: I) -> Self {
        let mut votes = LabelVotes::default();
        for (label, weight) in iter {
            votes.add(label.as_deref(), weight);
        }
        votes
    }
}

/// Merges span predictions from several voters.
#[derive(Debug, Clone)]
pub struct Ensembler {
    num_voters: usize,
    num_variant_groups: Option<usize>,
    strategy: VotingStrategy,
    threshold: f64,
}

impl Ensembler {
    /// Ensemble over `num_voters` independent voters.
    #[must_use]
    pub fn new(num_voters: usize) -> Self {
        Self {
            num_voters,
            num_variant_groups: None,
            strategy: VotingStrategy::default(),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Every voter was run once per entity-description variant group.
    ///
    /// A count of zero is treated as "no variant groups".
    #[must_use]
    pub fn with_variant_groups(mut self, groups: usize) -> Self {
        self.num_variant_groups = (groups > 0).then_some(groups);
        self
    }

    /// Set the voting strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: VotingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the acceptance threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Voting strategy in use.
    #[must_use]
    pub fn strategy(&self) -> VotingStrategy {
        self.strategy
    }

    /// Acceptance threshold in use.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Normalizer `N`: voters times variant groups, at least one.
    #[must_use]
    pub fn number_pipelines(&self) -> usize {
        (self.num_voters * self.num_variant_groups.unwrap_or(1)).max(1)
    }

    /// Vote on every interval, then apply the threshold and inclusion filters.
    #[must_use]
    pub fn ensemble(&self, candidates: &CandidateMap) -> Vec<Span> {
        let voted: Vec<Span> = candidates
            .values()
            .filter_map(|votes| match self.strategy {
                VotingStrategy::Max => self.ensemble_max(votes),
                VotingStrategy::Count => self.ensemble_count(votes),
            })
            .filter(|span| span.score.is_some_and(|s| s > self.threshold))
            .collect();
        Self::inclusive(voted)
    }

    /// Confidence-weighted vote over the spans proposed for one interval.
    ///
    /// Votes without a score count as fully confident. The result carries
    /// the first vote's bounds.
    #[must_use]
    pub fn ensemble_max(&self, votes: &[Span]) -> Option<Span> {
        let n = self.number_pipelines() as f64;
        self.aggregate(votes, |span| span.score.unwrap_or(1.0) / n)
    }

    /// Count vote over the spans proposed for one interval.
    #[must_use]
    pub fn ensemble_count(&self, votes: &[Span]) -> Option<Span> {
        let n = self.number_pipelines() as f64;
        self.aggregate(votes, |_| 1.0 / n)
    }

    fn aggregate(&self, votes: &[Span], weight: impl Fn(&Span) -> f64) -> Option<Span> {
        let first = votes.first()?;
        let tally: LabelVotes = votes
            .iter()
            .map(|span| (span.label.clone(), weight(span)))
            .collect();
        let (label, score) = Self::select_best(&tally)?;
        Some(Span {
            start: first.start,
            end: first.end,
            label,
            score: Some(score),
            kb_id: None,
        })
    }

    /// Label with the highest accumulated score.
    ///
    /// A later label replaces the running best only with a strictly higher
    /// score, so ties keep the earliest-seen label.
    #[must_use]
    pub fn select_best(votes: &LabelVotes) -> Option<(Option<String>, f64)> {
        let mut best: Option<&(Option<String>, f64)> = None;
        for vote in votes.as_slice() {
            if best.map_or(true, |(_, max)| *max < vote.1) {
                best = Some(vote);
            }
        }
        best.cloned()
    }

    /// Drop every span strictly contained in another span of the list.
    ///
    /// Spans with identical bounds do not remove each other.
    #[must_use]
    pub fn inclusive(spans: Vec<Span>) -> Vec<Span> {
        let redundant: Vec<bool> = spans
            .iter()
            .map(|inner| spans.iter().any(|outer| outer.strictly_contains(inner)))
            .collect();
        spans
            .into_iter()
            .zip(redundant)
            .filter_map(|(span, drop)| (!drop).then_some(span))
            .collect()
    }

    /// Merge one document's predictions from every voter.
    #[must_use]
    pub fn ensemble_document(&self, voter_spans: &[&[Span]]) -> Vec<Span> {
        let mut candidates = union_spans(voter_spans);
        sub_span_scoring(&mut candidates, voter_spans);
        let merged = self.ensemble(&candidates);
        log::debug!(
            "ensembled {} intervals from {} voters into {} spans",
            candidates.len(),
            voter_spans.len(),
            merged.len()
        );
        merged
    }

    /// Merge per-voter, per-document predictions.
    ///
    /// `per_voter[v][d]` holds voter `v`'s spans for document `d`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] when voters disagree on the number of documents.
    pub fn prediction_ensemble(&self, per_voter: &[Vec<Vec<Span>>]) -> Result<Vec<Vec<Span>>> {
        let Some(num_docs) = per_voter.first().map(Vec::len) else {
            return Ok(Vec::new());
        };
        if let Some(bad) = per_voter.iter().position(|docs| docs.len() != num_docs) {
            return Err(Error::invalid_input(format!(
                "voter {bad} predicted {} documents, expected {num_docs}",
                per_voter[bad].len()
            )));
        }
        if per_voter.len() != self.number_pipelines() {
            log::warn!(
                "ensembling {} voter outputs but normalizing by {}",
                per_voter.len(),
                self.number_pipelines()
            );
        }

        let merge_doc = |doc_idx: usize| {
            let voter_spans: Vec<&[Span]> = per_voter
                .iter()
                .map(|docs| docs[doc_idx].as_slice())
                .collect();
            self.ensemble_document(&voter_spans)
        };

        #[cfg(feature = "eval-parallel")]
        let merged = {
            use rayon::prelude::*;
            (0..num_docs).into_par_iter().map(merge_doc).collect()
        };
        #[cfg(not(feature = "eval-parallel"))]
        let merged = (0..num_docs).map(merge_doc).collect();

        Ok(merged)
    }
}

impl Default for Ensembler {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Group every voter's spans by exact interval, in voter order.
#[must_use]
pub fn union_spans(voter_spans: &[&[Span]]) -> CandidateMap {
    let mut candidates = CandidateMap::new();
    for span in voter_spans.iter().flat_map(|spans| spans.iter()) {
        candidates
            .entry(span.bounds())
            .or_default()
            .push(span.clone());
    }
    candidates
}

/// Let wider predictions vote on the narrower intervals they contain.
///
/// For every interval `k` and every voter with no span exactly at `k`, the
/// voter's best span strictly containing `k` (if any) casts one synthetic
/// vote at `k` with its own label, score and KB id.
pub fn sub_span_scoring(candidates: &mut CandidateMap, voter_spans: &[&[Span]]) {
    for (&(start, end), votes) in candidates.iter_mut() {
        let key = Span::new(start, end);
        for spans in voter_spans {
            if spans.iter().any(|s| s.bounds() == (start, end)) {
                continue;
            }
            let wider = spans.iter().filter(|p| p.strictly_contains(&key));
            if let Some(p) = best_candidate(wider) {
                votes.push(p.with_bounds(start, end));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    fn candidates(spans: &[Span]) -> CandidateMap {
        union_spans(&[spans])
    }

    fn fruit_votes() -> Vec<Span> {
        vec![
            Span::scored(0, 6, "fruits", 0.9),
            Span::scored(0, 6, "NEG", 0.1),
            Span::scored(7, 9, "fruits", 0.2),
            Span::scored(7, 9, "NEG", 0.8),
            Span::scored(10, 17, "fruits", 0.8),
            Span::scored(10, 17, "NEG", 0.2),
            Span::scored(40, 41, "fruits", 0.4),
            Span::scored(40, 41, "NEG", 0.6),
        ]
    }

    #[test]
    fn test_ensemble_max() {
        let ensembler = Ensembler::new(2);
        let map = candidates(&fruit_votes());
        let voted: Vec<Span> = map.values().filter_map(|v| ensembler.ensemble_max(v)).collect();

        assert_eq!(voted.len(), 4);
        assert_eq!(voted[0].label.as_deref(), Some("fruits"));
        assert!(approx(voted[0].score, 0.45));
        assert_eq!(voted[1].label.as_deref(), Some("NEG"));
        assert!(approx(voted[1].score, 0.4));
        assert_eq!(voted[2].label.as_deref(), Some("fruits"));
        assert!(approx(voted[2].score, 0.4));
        assert_eq!(voted[3].label.as_deref(), Some("NEG"));
        assert!(approx(voted[3].score, 0.3));
    }

    #[test]
    fn test_ensemble_count() {
        let ensembler = Ensembler::new(3).with_strategy(VotingStrategy::Count);
        let votes = [
            Span::scored(0, 6, "fruits", 0.9),
            Span::scored(0, 6, "fruits", 0.1),
            Span::scored(0, 6, "NEG", 0.99),
        ];
        let span = ensembler.ensemble_count(&votes).unwrap();
        assert_eq!(span.label.as_deref(), Some("fruits"));
        assert!(approx(span.score, 2.0 / 3.0));
    }

    #[test]
    fn test_ensemble_max_missing_score_counts_as_one() {
        let ensembler = Ensembler::new(2);
        let votes = [Span::new(0, 3).with_label("X"), Span::scored(0, 3, "X", 0.5)];
        assert!(approx(ensembler.ensemble_max(&votes).unwrap().score, 0.75));
    }

    #[test]
    fn test_empty_votes() {
        assert!(Ensembler::new(2).ensemble_max(&[]).is_none());
        assert!(Ensembler::select_best(&LabelVotes::default()).is_none());
    }

    #[test]
    fn test_select_best() {
        let votes: LabelVotes = [(Some("fruits".to_string()), 0.3), (Some("NEG".to_string()), 0.03)]
            .into_iter()
            .collect();
        let (label, score) = Ensembler::select_best(&votes).unwrap();
        assert_eq!(label.as_deref(), Some("fruits"));
        assert!((score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_select_best_tie_keeps_first_seen() {
        let votes: LabelVotes = [(Some("b".to_string()), 0.5), (Some("a".to_string()), 0.5)]
            .into_iter()
            .collect();
        assert_eq!(Ensembler::select_best(&votes).unwrap().0.as_deref(), Some("b"));
    }

    #[test]
    fn test_inclusive_keeps_wider_span() {
        let spans = vec![
            Span::scored(40, 41, "fruits", 0.4),
            Span::scored(40, 41, "NEG", 0.6),
            Span::scored(40, 42, "NEG", 0.6),
        ];
        assert_eq!(Ensembler::inclusive(spans), [Span::scored(40, 42, "NEG", 0.6)]);
    }

    #[test]
    fn test_inclusive_identical_bounds_survive() {
        let spans = vec![Span::scored(0, 4, "A", 0.6), Span::scored(0, 4, "B", 0.7)];
        assert_eq!(Ensembler::inclusive(spans.clone()), spans);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // 0.5 + 0.5 over two voters lands exactly on the default threshold.
        let ensembler = Ensembler::new(2);
        let map = candidates(&[Span::scored(0, 3, "X", 0.5), Span::scored(0, 3, "X", 0.5)]);
        assert!(ensembler.ensemble(&map).is_empty());
        assert_eq!(ensembler.clone().with_threshold(0.4).ensemble(&map).len(), 1);
    }

    #[test]
    fn test_number_pipelines() {
        assert_eq!(Ensembler::new(3).number_pipelines(), 3);
        assert_eq!(Ensembler::new(3).with_variant_groups(2).number_pipelines(), 6);
        assert_eq!(Ensembler::new(3).with_variant_groups(0).number_pipelines(), 3);
        assert_eq!(Ensembler::new(0).number_pipelines(), 1);
    }

    #[test]
    fn test_sub_span_scoring_wider_prediction_votes_inside() {
        let voter_a = [Span::scored(0, 8, "city", 0.9)];
        let voter_b = [Span::scored(4, 8, "city", 0.8)];
        let voters: [&[Span]; 2] = [&voter_a, &voter_b];

        let mut map = union_spans(&voters);
        sub_span_scoring(&mut map, &voters);

        // voter a votes at [4, 8); voter b has nothing wider than [0, 8)
        assert_eq!(map[&(4, 8)].len(), 2);
        assert_eq!(map[&(4, 8)][1], Span::scored(4, 8, "city", 0.9));
        assert_eq!(map[&(0, 8)].len(), 1);
    }

    #[test]
    fn test_sub_span_scoring_skips_voter_with_exact_vote() {
        let voter = [Span::scored(0, 8, "city", 0.9), Span::scored(4, 8, "city", 0.3)];
        let voters: [&[Span]; 1] = [&voter];
        let mut map = union_spans(&voters);
        sub_span_scoring(&mut map, &voters);
        assert_eq!(map[&(4, 8)], [Span::scored(4, 8, "city", 0.3)]);
    }

    #[test]
    fn test_sub_span_scoring_one_vote_per_voter() {
        let voter_a = [Span::scored(0, 10, "x", 0.4), Span::scored(0, 9, "y", 0.7)];
        let voter_b = [Span::scored(2, 5, "x", 0.9)];
        let voters: [&[Span]; 2] = [&voter_a, &voter_b];
        let mut map = union_spans(&voters);
        sub_span_scoring(&mut map, &voters);
        assert_eq!(map[&(2, 5)].len(), 2);
        assert_eq!(map[&(2, 5)][1], Span::scored(2, 5, "y", 0.7));
    }

    #[test]
    fn test_voter_with_label_distribution() {
        // Voter a splits its mass over two labels at one interval.
        let a = [Span::scored(0, 6, "fruits", 0.6), Span::scored(0, 6, "NEG", 0.4)];
        let b = [Span::scored(0, 6, "fruits", 0.9), Span::scored(0, 6, "NEG", 0.1)];
        let voters: [&[Span]; 2] = [&a, &b];
        let ensembler = Ensembler::new(2);

        let map = union_spans(&voters);
        let votes = &map[&(0, 6)];
        let tally: LabelVotes = votes.iter().map(|s| (s.label.clone(), s.score.unwrap_or(1.0) / 2.0)).collect();
        assert!(tally.total() <= 1.0 + 1e-9);

        let span = ensembler.ensemble_max(votes).unwrap();
        assert_eq!(span.label.as_deref(), Some("fruits"));
        assert!(approx(span.score, 0.75));
        assert_eq!(ensembler.ensemble_document(&voters), [span]);
    }

    #[test]
    fn test_prediction_ensemble_two_voters() {
        let voter_a = vec![
            vec![Span::scored(0, 8, "city", 0.9)],
            vec![Span::scored(0, 5, "fruits", 0.8)],
        ];
        let voter_b = vec![
            vec![Span::scored(0, 8, "city", 0.7), Span::scored(20, 25, "NEG", 0.9)],
            vec![],
        ];
        let merged = Ensembler::new(2).prediction_ensemble(&[voter_a, voter_b]).unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].len(), 1);
        assert_eq!(merged[0][0].bounds(), (0, 8));
        assert!(approx(merged[0][0].score, 0.8));
        // a single voter at 0.8 over two voters is not a majority
        assert!(merged[1].is_empty());
    }

    #[test]
    fn test_prediction_ensemble_document_count_mismatch() {
        let err = Ensembler::new(2)
            .prediction_ensemble(&[vec![vec![]], vec![]])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_prediction_ensemble_no_voters() {
        assert!(Ensembler::new(2).prediction_ensemble(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("MAX".parse::<VotingStrategy>().unwrap(), VotingStrategy::Max);
        assert_eq!("count".parse::<VotingStrategy>().unwrap(), VotingStrategy::Count);
        assert!("mean".parse::<VotingStrategy>().is_err());
    }
}
