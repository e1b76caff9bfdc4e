//! `eval` and `eval-relations`.

use super::Context;
use crate::output::{percent, read_json, write_json, write_text};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use zeroner::align::AlignmentMode;
use zeroner::eval::{
    MatchMode, MentionsEvaluator, RelationEvaluator, SequenceScores, TokenClassificationEvaluator,
};
use zeroner::Span;

/// Span predictions, sentences and gold tags
#[derive(Parser, Debug)]
pub struct EvalArgs {
    /// JSON file with `predictions`, `sentences` and `references` (stdin if omitted)
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Collapse reference types to MENTION (score a mentions extractor)
    #[arg(long)]
    pub mentions: bool,

    /// Unit of comparison: entity or token (default from config)
    #[arg(long, value_name = "MODE")]
    pub match_mode: Option<MatchMode>,

    /// Alignment mode: expand or contract (default from config)
    #[arg(long, short = 'm', value_name = "MODE")]
    pub mode: Option<AlignmentMode>,

    /// Separator the prediction offsets assume between words (default from config)
    #[arg(long, value_name = "SEP")]
    pub join_by: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EvalInput {
    predictions: Vec<Vec<Span>>,
    sentences: Vec<Vec<String>>,
    references: Vec<Vec<String>>,
}

pub fn run(args: EvalArgs, ctx: &Context) -> Result<(), String> {
    let input: EvalInput = read_json(args.input.as_deref())?;
    let section = &ctx.config.evaluation;
    let join_by = args.join_by.unwrap_or_else(|| section.join_by.clone());
    let evaluator = TokenClassificationEvaluator::new()
        .with_alignment_mode(args.mode.unwrap_or(ctx.config.alignment.mode))
        .with_match_mode(args.match_mode.unwrap_or(section.match_mode));

    let result = if args.mentions {
        MentionsEvaluator::new(evaluator).compute(
            &input.predictions,
            &input.sentences,
            &input.references,
            &join_by,
        )
    } else {
        evaluator.compute(&input.predictions, &input.sentences, &input.references, &join_by)
    };
    let scores = result.map_err(|e| e.to_string())?;

    if ctx.human() {
        write_text(&render(&scores))
    } else {
        write_json(&scores)
    }
}

fn render(scores: &SequenceScores) -> String {
    let mut out = String::new();
    let overall = [
        ("Precision micro", scores.overall_precision_micro),
        ("Recall micro", scores.overall_recall_micro),
        ("F1-score micro", scores.overall_f1_micro),
        ("Precision macro", scores.overall_precision_macro),
        ("Recall macro", scores.overall_recall_macro),
        ("F1-score macro", scores.overall_f1_macro),
        ("Accuracy", scores.overall_accuracy),
    ];
    for (name, value) in overall {
        out.push_str(&format!("{:<16} {:>8}\n", name, percent(value)));
    }
    if !scores.per_type.is_empty() {
        out.push_str(&format!(
            "\n{:<16} {:>8} {:>8} {:>8} {:>8}\n",
            "type", "P", "R", "F1", "support"
        ));
        for (label, s) in &scores.per_type {
            out.push_str(&format!(
                "{:<16} {:>8} {:>8} {:>8} {:>8}\n",
                label,
                percent(s.precision),
                percent(s.recall),
                percent(s.f1),
                s.support
            ));
        }
    }
    out
}

/// Predicted and gold relation labels
#[derive(Parser, Debug)]
pub struct EvalRelationsArgs {
    /// JSON file with `predictions` and `references` label lists (stdin if omitted)
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RelationsInput {
    predictions: Vec<String>,
    references: Vec<String>,
}

pub fn run_relations(args: EvalRelationsArgs, ctx: &Context) -> Result<(), String> {
    let input: RelationsInput = read_json(args.input.as_deref())?;
    let scores = RelationEvaluator
        .compute(&input.predictions, &input.references)
        .map_err(|e| e.to_string())?;

    if !ctx.human() {
        return write_json(&scores);
    }
    write_text(&format!(
        "Precision micro  {:>8}\nRecall micro     {:>8}\nF1-score micro   {:>8}\n\
         Precision macro  {:>8}\nRecall macro     {:>8}\nF1-score macro   {:>8}\n\
         Correct          {:>8}\n",
        percent(scores.overall_precision_micro),
        percent(scores.overall_recall_micro),
        percent(scores.overall_f1_micro),
        percent(scores.overall_precision_macro),
        percent(scores.overall_recall_macro),
        percent(scores.overall_f1_macro),
        scores.overall_accuracy,
    ))
}
