//! Pipeline evaluation over labelled datasets.
//!
//! Each dataset supplies its own entity types, pre-split sentences and
//! gold IOB2 tags. The pipeline is run once per dataset; the linker's raw
//! spans and the mentions extractor's mentions are scored separately.

use super::evaluator::{MentionsEvaluator, TokenClassificationEvaluator};
use super::seqeval::SequenceScores;
use crate::document::Document;
use crate::pipeline::Pipeline;
use crate::{Entity, Error, Result, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A labelled evaluation split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelledDataset {
    /// Column header in the report, e.g. `"ontonotes test"`.
    pub name: String,
    /// Entity types the pipeline should link to.
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Pre-split sentences.
    pub sentences: Vec<Vec<String>>,
    /// Gold IOB2 tags, one per word.
    pub tags: Vec<Vec<String>>,
}

/// Scores for one dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    /// Dataset name.
    pub dataset: String,
    /// Linker scores, when the pipeline has a linker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linker: Option<SequenceScores>,
    /// Mentions extractor scores, when the pipeline has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentions_extractor: Option<SequenceScores>,
}

/// Scores for every dataset, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// One entry per dataset.
    pub columns: Vec<ComponentScores>,
}

fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

const METRICS: [(&str, fn(&SequenceScores) -> f64); 5] = [
    ("Precision", |s| s.overall_precision_macro),
    ("Recall", |s| s.overall_recall_macro),
    ("Accuracy", |s| s.overall_accuracy),
    ("F1-score micro", |s| s.overall_f1_micro),
    ("F1-score macro", |s| s.overall_f1_macro),
];

impl EvaluationReport {
    /// Table rows: a metric name followed by one formatted value per dataset.
    ///
    /// Rows are emitted for a component only if every dataset has scores
    /// for it.
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let components: [(&str, fn(&ComponentScores) -> Option<&SequenceScores>); 2] = [
            ("Linker", |c| c.linker.as_ref()),
            ("Mentions extractor", |c| c.mentions_extractor.as_ref()),
        ];
        for (component, pick) in components {
            let Some(scores) = self.columns.iter().map(pick).collect::<Option<Vec<_>>>() else {
                continue;
            };
            if scores.is_empty() {
                continue;
            }
            for (metric, value) in METRICS {
                let mut row = vec![format!("{component} {metric}")];
                row.extend(scores.iter().map(|s| percent(value(s))));
                rows.push(row);
            }
        }
        rows
    }

    /// Render as a Markdown table.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let header: Vec<&str> = std::iter::once("Metric")
            .chain(self.columns.iter().map(|c| c.dataset.as_str()))
            .collect();
        let mut out = format!("| {} |\n", header.join(" | "));
        out.push_str(&format!("|{}\n", "---|".repeat(header.len())));
        for row in self.rows() {
            out.push_str(&format!("| {} |\n", row.join(" | ")));
        }
        out
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_markdown())
    }
}

/// Run `pipeline` over every dataset and score its components.
///
/// # Errors
///
/// [`Error::Evaluation`] when a dataset's sentences and tags disagree in
/// count; otherwise propagates pipeline and metric failures.
pub fn evaluate(
    pipeline: &mut Pipeline,
    datasets: &[LabelledDataset],
    evaluator: TokenClassificationEvaluator,
    join_by: &str,
) -> Result<EvaluationReport> {
    let mentions_evaluator = MentionsEvaluator::new(evaluator);
    let mut columns = Vec::with_capacity(datasets.len());

    for dataset in datasets {
        if dataset.sentences.len() != dataset.tags.len() {
            return Err(Error::evaluation(format!(
                "dataset '{}': {} sentences but {} tag sequences",
                dataset.name,
                dataset.sentences.len(),
                dataset.tags.len()
            )));
        }
        pipeline.set_entities(dataset.entities.clone());

        let mut docs: Vec<Document> = dataset
            .sentences
            .iter()
            .map(|words| Document::from_tokens(words, join_by))
            .collect();
        pipeline.process(&mut docs)?;

        let linker = if pipeline.linker().is_some() {
            let spans: Vec<_> = docs.iter().map(|d| d.spans.clone()).collect();
            Some(evaluator.compute(&spans, &dataset.sentences, &dataset.tags, join_by)?)
        } else {
            None
        };
        let mentions_extractor = if pipeline.mentions_extractor().is_some() {
            // Mentions are scored untyped, whatever the extractor labelled them.
            let mentions: Vec<Vec<Span>> = docs
                .iter()
                .map(|d| d.mentions.iter().map(|m| Span::new(m.start, m.end)).collect())
                .collect();
            Some(mentions_evaluator.compute(&mentions, &dataset.sentences, &dataset.tags, join_by)?)
        } else {
            None
        };

        log::info!("evaluated {} sentences of '{}'", docs.len(), dataset.name);
        columns.push(ComponentScores {
            dataset: dataset.name.clone(),
            linker,
            mentions_extractor,
        });
    }
    Ok(EvaluationReport { columns })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{CapitalizedMentionsExtractor, VocabularyLinker};

    fn dataset() -> LabelledDataset {
        LabelledDataset {
            name: "toy test".into(),
            entities: vec![Entity::new("city", "").with_vocabulary(["New York", "Paris"])],
            sentences: vec![
                vec!["New".into(), "York".into(), "is".into(), "big".into()],
                vec!["I".into(), "love".into(), "Paris".into()],
            ],
            tags: vec![
                vec!["B-city".into(), "I-city".into(), "O".into(), "O".into()],
                vec!["O".into(), "O".into(), "B-city".into()],
            ],
        }
    }

    #[test]
    fn test_linker_report() {
        let mut pipeline = Pipeline::new().with_linker(Box::new(VocabularyLinker::new()));
        let report = evaluate(&mut pipeline, &[dataset()], TokenClassificationEvaluator::new(), " ").unwrap();
        let linker = report.columns[0].linker.as_ref().unwrap();
        assert_eq!(linker.overall_f1_micro, 1.0);
        assert!(report.columns[0].mentions_extractor.is_none());

        let rows = report.rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], ["Linker Precision", "100.00%"]);
        assert_eq!(rows[4][0], "Linker F1-score macro");
    }

    #[test]
    fn test_mentions_and_linker_report() {
        let mut pipeline = Pipeline::new()
            .with_mentions_extractor(Box::new(CapitalizedMentionsExtractor::new()))
            .with_linker(Box::new(VocabularyLinker::for_mentions()));
        let report = evaluate(&mut pipeline, &[dataset()], TokenClassificationEvaluator::new(), " ").unwrap();
        assert!(report.columns[0].mentions_extractor.is_some());
        assert_eq!(report.rows().len(), 10);

        let table = report.to_markdown();
        assert!(table.starts_with("| Metric | toy test |"));
        assert!(table.contains("| Mentions extractor Recall |"));
    }

    #[test]
    fn test_mismatched_dataset() {
        let mut ds = dataset();
        ds.tags.pop();
        let mut pipeline = Pipeline::new().with_linker(Box::new(VocabularyLinker::new()));
        let err = evaluate(&mut pipeline, &[ds], TokenClassificationEvaluator::new(), " ").unwrap_err();
        assert!(matches!(err, Error::Evaluation(_)));
    }
}
