//! Methods command - compare calibration methods on labelled logits.

use std::path::PathBuf;

use aiscan_core::evaluation::{best_method, evaluate_methods, LabelledLogits};
use anyhow::{Context, Result};
use clap::Args;

use crate::output::JsonOutput;

/// Arguments for the methods command
#[derive(Args)]
pub struct MethodsArgs {
    /// JSON array of `{"logits": [l0, l1], "expected": bool}` samples
    pub file: PathBuf,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,
}

/// Run the methods command.
///
/// Prints one report per calibration method to stdout and names the most
/// accurate one on stderr.
pub fn run(args: &MethodsArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let samples: Vec<LabelledLogits> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse labelled logits in {}", args.file.display()))?;

    let reports = evaluate_methods(&samples);
    let output = JsonOutput::stdout();
    output.write_document(&reports, args.pretty)?;
    output.flush()?;

    if let Some(best) = best_method(&reports) {
        eprintln!(
            "Best method: {} ({}/{} correct, {:.1}%)",
            best.method, best.correct, best.total, best.accuracy
        );
    }
    Ok(())
}
