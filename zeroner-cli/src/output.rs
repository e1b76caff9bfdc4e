//! Input and output helpers shared by commands.

use is_terminal::IsTerminal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// Wrap `text` in an ANSI color when stdout is a terminal.
pub fn color(code: &str, text: &str) -> String {
    if io::stdout().is_terminal() {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

/// Read the input document from `path`, or stdin when it is absent or `-`.
pub fn read_input(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(p) if p != Path::new("-") => {
            fs::read_to_string(p).map_err(|e| format!("Failed to read {}: {}", p.display(), e))
        }
        _ => {
            if io::stdin().is_terminal() {
                return Err("No input provided. Pass a JSON file or pipe JSON via stdin".to_string());
            }
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            Ok(buf)
        }
    }
}

/// Read and parse the input document.
pub fn read_json<T: DeserializeOwned>(path: Option<&Path>) -> Result<T, String> {
    let text = read_input(path)?;
    serde_json::from_str(&text).map_err(|e| format!("Invalid input JSON: {}", e))
}

/// Pretty-print `value` as JSON on stdout.
pub fn write_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize output: {}", e))?;
    write_text(&format!("{}\n", json))
}

/// Write `content` to stdout.
pub fn write_text(content: &str) -> Result<(), String> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(content.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| format!("Failed to write output: {}", e))
}

/// `0.8125` as `81.25%`.
pub fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}
