//! `run`.

use super::Context;
use crate::output::{color, read_json, write_json, write_text};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use zeroner::document::Document;
use zeroner::pipeline::Pipeline;
use zeroner::registry::ComponentRegistry;

/// Raw texts to process
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// JSON file: an array of strings or `{"texts": [...]}` (stdin if omitted)
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RunInput {
    Wrapped { texts: Vec<String> },
    Bare(Vec<String>),
}

pub fn run(args: RunArgs, ctx: &Context) -> Result<(), String> {
    let texts = match read_json::<RunInput>(args.input.as_deref())? {
        RunInput::Wrapped { texts } | RunInput::Bare(texts) => texts,
    };
    let registry = ComponentRegistry::with_builtins();
    let pipeline = Pipeline::from_config(&ctx.config, &registry);
    if pipeline.linker().is_none() && pipeline.mentions_extractor().is_none() {
        return Err("Pipeline has no linker or mentions extractor; set [pipeline] in --config".to_string());
    }
    log::info!("running {:?} over {} texts", pipeline, texts.len());

    let mut docs: Vec<Document> = texts.into_iter().map(Document::from_text).collect();
    pipeline.process(&mut docs).map_err(|e| e.to_string())?;

    if !ctx.human() {
        return write_json(&docs);
    }
    let mut out = String::new();
    for doc in &docs {
        out.push_str(&format!("{}\n", color("1", &doc.text)));
        let spans = if doc.entities.is_empty() { &doc.mentions } else { &doc.entities };
        for span in spans {
            out.push_str(&format!("  {:<24} {}\n", doc.span_text(span), span));
        }
        for relation in &doc.relations {
            out.push_str(&format!(
                "  {} -[{}]-> {}\n",
                doc.span_text(&relation.start),
                relation.relation.name,
                doc.span_text(&relation.end)
            ));
        }
    }
    write_text(&out)
}
