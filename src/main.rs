//! vtl-engine - evaluate VTL syntax trees against JSON bindings

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use log::{debug, info};
use std::fs;
use std::path::PathBuf;
use vtl_engine::model::Bindings;
use vtl_engine::script::json::{bindings_from_json, bindings_to_json};
use vtl_engine::syntax::Program;
use vtl_engine::{ScriptConfig, ScriptEngine};

/// Evaluate a JSON-encoded VTL program and print the resulting bindings
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Program file (JSON-encoded syntax tree)
    #[arg(short, long)]
    program: PathBuf,

    /// Bindings file (JSON object of scalars and datasets)
    #[arg(short, long)]
    bindings: Option<PathBuf>,

    /// Engine configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            ScriptConfig::from_json(&text).context("Invalid config")?
        }
        None => ScriptConfig::default(),
    };
    debug!("config: {:?}", config);

    let bindings = match &args.bindings {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read bindings {}", path.display()))?;
            let json: serde_json::Value =
                serde_json::from_str(&text).context("Bindings file is not valid JSON")?;
            bindings_from_json(&json).context("Invalid bindings")?
        }
        None => Bindings::new(),
    };

    let text = fs::read_to_string(&args.program)
        .with_context(|| format!("Failed to read program {}", args.program.display()))?;
    let program: Program = serde_json::from_str(&text).context("Invalid program")?;
    info!(
        "evaluating {} statement(s) with {} binding(s)",
        program.statements.len(),
        bindings.len()
    );

    let engine = ScriptEngine::with_bindings(config, bindings);
    engine.eval(&program).context("Evaluation failed")?;

    let output = serde_json::to_string_pretty(&bindings_to_json(&engine.bindings()))
        .context("Failed to render bindings")?;
    println!("{}", output);
    Ok(())
}
