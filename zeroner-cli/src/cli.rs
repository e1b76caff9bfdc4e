//! Argument parsing.

use crate::commands;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Span alignment, overlap resolution, ensembling and evaluation for zero-shot NER
#[derive(Parser, Debug)]
#[command(name = "zeroner")]
#[command(
    author,
    version,
    about = "Span alignment, overlap resolution, ensembling and evaluation for zero-shot NER",
    long_about = r#"
zeroner - post-processing for zero-shot NER predictions

Every command reads one JSON object from a file argument or stdin and
writes JSON (when piped) or a human-readable summary (on a terminal).

EXAMPLES:
  zeroner resolve spans.json
  echo '{"tokens": ["New", "York"], "spans": [{"start": 0, "end": 8, "label": "FAC"}]}' | zeroner resolve
  zeroner ensemble --strategy count voters.json
  zeroner eval --match-mode token predictions.json
  zeroner run --config zeroner.toml texts.json
  zeroner eval-report --config zeroner.toml datasets.json
"#
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML configuration file
    #[arg(long, short = 'c', global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (default: human on a terminal, json otherwise)
    #[arg(long, short = 'o', global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Align spans to tokens
    Align(commands::align::AlignArgs),

    /// Resolve overlapping spans into BIO tags and non-overlapping spans
    #[command(visible_alias = "r")]
    Resolve(commands::align::AlignArgs),

    /// Merge span predictions from several voters
    Ensemble(commands::ensemble::EnsembleArgs),

    /// Score span predictions against BIO references
    #[command(visible_alias = "e")]
    Eval(commands::eval::EvalArgs),

    /// Score predicted relation labels against references
    EvalRelations(commands::eval::EvalRelationsArgs),

    /// Run a configured pipeline over labelled datasets and tabulate scores
    EvalReport(commands::report::EvalReportArgs),

    /// Run a configured pipeline over raw texts
    Run(commands::run::RunArgs),

    /// List registered component IDs
    Components,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Human,
    /// Pretty-printed JSON
    Json,
}
