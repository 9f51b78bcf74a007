//! Status command - initialize the classifier session and report its state.

use std::path::PathBuf;

use aiscan_core::SessionStatus;
use anyhow::Result;
use clap::Args;

use super::scan::{build_pipeline, ScanArgs};
use super::ExitCode;
use crate::config::AppConfig;
use crate::output::JsonOutput;

/// Arguments for the status command
#[derive(Args)]
pub struct StatusArgs {
    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Classifier model file (overrides the models directory)
    #[arg(long, value_name = "FILE")]
    pub model: Option<PathBuf>,
}

/// Run the status command.
///
/// Prints the session state as JSON. Exits with [`ExitCode::Error`] when the
/// session could not be initialized.
pub fn run(args: &StatusArgs, config: &AppConfig) -> Result<ExitCode> {
    let scan = ScanArgs::with_config(
        ScanArgs {
            models_dir: args.models_dir.clone(),
            model: args.model.clone(),
            ..ScanArgs::default()
        },
        config,
    );
    let pipeline = build_pipeline(&scan)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    if let Err(e) = runtime.block_on(pipeline.warm_up()) {
        tracing::warn!("Classifier session unavailable: {e}");
    }

    let status = pipeline.session_status();
    let output = JsonOutput::stdout();
    output.write(&status)?;
    output.flush()?;

    Ok(match status {
        SessionStatus::Ready => ExitCode::Success,
        _ => ExitCode::Error,
    })
}
