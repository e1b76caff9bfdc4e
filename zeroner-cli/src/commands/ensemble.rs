//! `ensemble`.

use super::Context;
use crate::output::{read_json, write_json, write_text};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use zeroner::ensemble::{Ensembler, VotingStrategy};
use zeroner::Span;

/// Per-voter predictions to merge
#[derive(Parser, Debug)]
pub struct EnsembleArgs {
    /// JSON file: `{"voters": [[[span, ...] per document] per voter]}` (stdin if omitted)
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Voting strategy: max or count (default from config)
    #[arg(long, short = 's', value_name = "STRATEGY")]
    pub strategy: Option<VotingStrategy>,

    /// Aggregated scores must exceed this (default from config)
    #[arg(long, short = 't', value_name = "FLOAT")]
    pub threshold: Option<f64>,

    /// Voters are linkers x this many entity-description variants
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub variant_groups: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EnsembleInput {
    Wrapped { voters: Vec<Vec<Vec<Span>>> },
    Bare(Vec<Vec<Vec<Span>>>),
}

pub fn run(args: EnsembleArgs, ctx: &Context) -> Result<(), String> {
    let voters = match read_json::<EnsembleInput>(args.input.as_deref())? {
        EnsembleInput::Wrapped { voters } | EnsembleInput::Bare(voters) => voters,
    };
    let groups = args.variant_groups.max(1);
    if voters.len() % groups != 0 {
        return Err(format!(
            "{} voters cannot be split into {} variant groups",
            voters.len(),
            groups
        ));
    }
    let section = &ctx.config.ensemble;
    let threshold = args.threshold.unwrap_or(section.threshold);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(format!("threshold must be in [0, 1], got {}", threshold));
    }
    let ensembler = Ensembler::new(voters.len() / groups)
        .with_variant_groups(groups)
        .with_strategy(args.strategy.unwrap_or(section.strategy))
        .with_threshold(threshold);

    let merged = ensembler
        .prediction_ensemble(&voters)
        .map_err(|e| e.to_string())?;

    if !ctx.human() {
        return write_json(&merged);
    }
    let mut out = format!(
        "{} voters, strategy {}, threshold {}\n",
        voters.len(),
        ensembler.strategy(),
        ensembler.threshold()
    );
    for (idx, spans) in merged.iter().enumerate() {
        out.push_str(&format!("document {}:\n", idx));
        for span in spans {
            out.push_str(&format!("  {}\n", span));
        }
    }
    write_text(&out)
}
