//! zeroner - post-processing for zero-shot NER predictions
//!
//! # Usage
//!
//! ```bash
//! # BIO tags and non-overlapping spans for one sentence
//! zeroner resolve spans.json
//!
//! # Merge predictions of several linkers
//! zeroner ensemble --strategy count voters.json
//!
//! # Token-level scores against gold tags
//! zeroner eval --match-mode token predictions.json
//!
//! # Run a configured pipeline
//! zeroner run --config zeroner.toml texts.json
//!
//! # Score that pipeline on labelled datasets
//! zeroner eval-report --config zeroner.toml datasets.json
//! ```

mod cli;
mod commands;
mod output;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, OutputFormat};
use commands::Context;
use is_terminal::IsTerminal;
use output::color;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use zeroner::config::Config;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Also routes the library's `log` records.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<Config, String> {
    match &cli.config {
        Some(path) => Config::load(path).map_err(|e| format!("{}: {}", path.display(), e)),
        None => Ok(Config::default()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", color("31", "error:"), e);
            return ExitCode::FAILURE;
        }
    };
    let format = cli.format.unwrap_or(if io::stdout().is_terminal() {
        OutputFormat::Human
    } else {
        OutputFormat::Json
    });
    let ctx = Context { config, format };

    let result = match cli.command {
        Commands::Align(args) => commands::align::run_align(args, &ctx),
        Commands::Resolve(args) => commands::align::run_resolve(args, &ctx),
        Commands::Ensemble(args) => commands::ensemble::run(args, &ctx),
        Commands::Eval(args) => commands::eval::run(args, &ctx),
        Commands::EvalRelations(args) => commands::eval::run_relations(args, &ctx),
        Commands::EvalReport(args) => commands::report::run(args, &ctx),
        Commands::Run(args) => commands::run::run(args, &ctx),
        Commands::Components => commands::components(&ctx),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "zeroner", &mut io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", color("31", "error:"), e);
            ExitCode::FAILURE
        }
    }
}
