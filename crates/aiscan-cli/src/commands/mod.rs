//! CLI command definitions and handlers.

pub mod methods;
pub mod models;
pub mod scan;
pub mod status;

use clap::{Parser, Subcommand};

/// aiscan - flag likely AI-generated images
#[derive(Parser)]
#[command(name = "aiscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared scan arguments (inputs, analysis and output flags).
    #[command(flatten)]
    pub scan: scan::ScanArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Analyze images for signs of AI generation
    Scan(scan::ScanArgs),
    /// Compare calibration methods on labelled logits
    Methods(methods::MethodsArgs),
    /// Initialize the classifier session and report its state
    Status(status::StatusArgs),
    /// Manage ML models
    Models(models::ModelsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Completed, nothing flagged.
    Success = 0,
    /// At least one image was flagged as AI-generated.
    AiDetected = 1,
    /// The command could not run.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
