//! `eval-report`.

use super::Context;
use crate::output::{read_json, write_json, write_text};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use zeroner::align::AlignmentMode;
use zeroner::eval::{evaluate, LabelledDataset, MatchMode, TokenClassificationEvaluator};
use zeroner::pipeline::Pipeline;
use zeroner::registry::ComponentRegistry;

/// Labelled datasets to run a configured pipeline over
#[derive(Parser, Debug)]
pub struct EvalReportArgs {
    /// JSON file: `{"datasets": [{name, entities, sentences, tags}, ...]}` or a bare array (stdin if omitted)
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Unit of comparison: entity or token (default from config)
    #[arg(long, value_name = "MODE")]
    pub match_mode: Option<MatchMode>,

    /// Alignment mode: expand or contract (default from config)
    #[arg(long, short = 'm', value_name = "MODE")]
    pub mode: Option<AlignmentMode>,

    /// Separator used to rebuild each sentence's text (default from config)
    #[arg(long, value_name = "SEP")]
    pub join_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReportInput {
    Wrapped { datasets: Vec<LabelledDataset> },
    Bare(Vec<LabelledDataset>),
}

pub fn run(args: EvalReportArgs, ctx: &Context) -> Result<(), String> {
    let mut datasets = match read_json::<ReportInput>(args.input.as_deref())? {
        ReportInput::Wrapped { datasets } | ReportInput::Bare(datasets) => datasets,
    };
    let registry = ComponentRegistry::with_builtins();
    let mut pipeline = Pipeline::from_config(&ctx.config, &registry);
    if pipeline.linker().is_none() && pipeline.mentions_extractor().is_none() {
        return Err("Pipeline has no linker or mentions extractor; set [pipeline] in --config".to_string());
    }
    // Datasets without their own entity types use the configured ones.
    for dataset in datasets.iter_mut().filter(|d| d.entities.is_empty()) {
        dataset.entities = pipeline.entities().to_vec();
    }

    let section = &ctx.config.evaluation;
    let join_by = args.join_by.unwrap_or_else(|| section.join_by.clone());
    let evaluator = TokenClassificationEvaluator::new()
        .with_alignment_mode(args.mode.unwrap_or(ctx.config.alignment.mode))
        .with_match_mode(args.match_mode.unwrap_or(section.match_mode));

    let report = evaluate(&mut pipeline, &datasets, evaluator, &join_by).map_err(|e| e.to_string())?;
    if ctx.human() {
        write_text(&report.to_markdown())
    } else {
        write_json(&report)
    }
}
