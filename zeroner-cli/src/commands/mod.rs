//! Subcommand implementations.
//!
//! Each command returns `Result<(), String>`; `main` prints the error.

pub mod align;
pub mod ensemble;
pub mod eval;
pub mod report;
pub mod run;

use crate::cli::OutputFormat;
use crate::output::{color, write_text};
use zeroner::config::Config;
use zeroner::registry::ComponentRegistry;

/// State shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub format: OutputFormat,
}

impl Context {
    pub fn human(&self) -> bool {
        self.format == OutputFormat::Human
    }
}

/// List the IDs the built-in registry knows.
pub fn components(ctx: &Context) -> Result<(), String> {
    let registry = ComponentRegistry::with_builtins();
    let groups = [
        ("linkers", registry.linker_ids()),
        ("mentions_extractors", registry.mentions_extractor_ids()),
        ("relations_extractors", registry.relations_extractor_ids()),
    ];
    if !ctx.human() {
        let map: serde_json::Map<String, serde_json::Value> = groups
            .iter()
            .map(|(kind, ids)| ((*kind).to_string(), serde_json::json!(ids)))
            .collect();
        return crate::output::write_json(&map);
    }
    let mut out = String::new();
    for (kind, ids) in groups {
        out.push_str(&format!("{}\n", color("1", kind)));
        for id in ids {
            out.push_str(&format!("  {}\n", id));
        }
    }
    write_text(&out)
}
