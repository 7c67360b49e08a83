use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;

use nosql_sanitize::{
    config::load_options_file, OptionResolver, PartialOptions, Sanitizer, SanitizeOptions,
};

/// Sanitize a JSON document the way the middleware sanitizes a request body.
#[derive(Parser)]
struct Cli {
    /// Options file (.json, .toml, .yaml, .yml). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input document. Reads stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Replacement for matched characters, overriding the options file
    #[arg(long)]
    replace_with: Option<String>,

    #[arg(long)]
    pretty: bool,
}

fn load_options(cli: &Cli) -> anyhow::Result<SanitizeOptions> {
    let base = match &cli.config {
        Some(path) => load_options_file(path)
            .with_context(|| format!("loading options from {}", path.display()))?,
        None => SanitizeOptions::default(),
    };

    match &cli.replace_with {
        Some(replacement) => Ok(OptionResolver::merge(
            &base,
            PartialOptions::new().with_replace_with(replacement.clone()),
        )?),
        None => Ok(base),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let options = load_options(&cli)?;

    let text = match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };

    let document: Value = serde_json::from_str(&text).context("input is not valid JSON")?;
    let sanitized = match options.custom_sanitizer() {
        Some(custom) => custom.apply(document, &options),
        None => Sanitizer::new(&options).sanitize(document)?,
    };

    let output = if cli.pretty {
        serde_json::to_string_pretty(&sanitized)?
    } else {
        serde_json::to_string(&sanitized)?
    };
    println!("{}", output);

    Ok(())
}
