//! `align` and `resolve`.

use super::Context;
use crate::output::{color, read_json, write_json, write_text};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use zeroner::align::{align_spans, AlignmentMode};
use zeroner::resolve::filter_overlapping_spans;
use zeroner::Span;

/// Tokens plus spans to align
#[derive(Parser, Debug)]
pub struct AlignArgs {
    /// JSON file with `tokens`, `spans` and optionally `offsets` / `join_by` (stdin if omitted)
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Alignment mode: expand or contract (default from config)
    #[arg(long, short = 'm', value_name = "MODE")]
    pub mode: Option<AlignmentMode>,

    /// Separator used to derive token offsets (overrides input and config)
    #[arg(long, value_name = "SEP")]
    pub join_by: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlignInput {
    tokens: Vec<String>,
    #[serde(default)]
    spans: Vec<Span>,
    #[serde(default)]
    offsets: Option<Vec<(usize, usize)>>,
    #[serde(default)]
    join_by: Option<String>,
}

struct Prepared {
    input: AlignInput,
    mode: AlignmentMode,
    join_by: String,
}

fn prepare(args: AlignArgs, ctx: &Context) -> Result<Prepared, String> {
    let input: AlignInput = read_json(args.input.as_deref())?;
    let join_by = args
        .join_by
        .or_else(|| input.join_by.clone())
        .unwrap_or_else(|| ctx.config.evaluation.join_by.clone());
    Ok(Prepared {
        mode: args.mode.unwrap_or(ctx.config.alignment.mode),
        join_by,
        input,
    })
}

pub fn run_align(args: AlignArgs, ctx: &Context) -> Result<(), String> {
    let Prepared { input, mode, join_by } = prepare(args, ctx)?;
    let alignment = align_spans(
        &input.spans,
        &input.tokens,
        input.offsets.as_deref(),
        Some(&join_by),
        mode,
    )
    .map_err(|e| e.to_string())?;

    if !ctx.human() {
        return write_json(&alignment);
    }
    let mut out = String::new();
    for (idx, token) in input.tokens.iter().enumerate() {
        let spans: Vec<String> = alignment
            .candidates(idx)
            .iter()
            .filter_map(|&i| input.spans.get(i))
            .map(ToString::to_string)
            .collect();
        out.push_str(&format!("{:<16} {}\n", token, spans.join(", ")));
    }
    write_text(&out)
}

pub fn run_resolve(args: AlignArgs, ctx: &Context) -> Result<(), String> {
    let Prepared { input, mode, join_by } = prepare(args, ctx)?;
    let resolution = filter_overlapping_spans(
        &input.spans,
        &input.tokens,
        input.offsets.as_deref(),
        Some(&join_by),
        mode,
    )
    .map_err(|e| e.to_string())?;

    if !ctx.human() {
        return write_json(&resolution);
    }
    let mut out = String::new();
    for (token, tag) in input.tokens.iter().zip(&resolution.bio) {
        let tag = if tag == "O" { tag.clone() } else { color("32", tag) };
        out.push_str(&format!("{:<16} {}\n", token, tag));
    }
    out.push_str(&format!("\n{} spans kept of {}\n", resolution.filtered_spans.len(), input.spans.len()));
    for span in &resolution.filtered_spans {
        out.push_str(&format!("  {}\n", span));
    }
    write_text(&out)
}
