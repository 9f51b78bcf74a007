//! aiscan CLI - flag images that are likely AI-generated.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::scan::{self, ScanArgs};
use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let exit_code = match cli.command {
        Some(Commands::Scan(args)) => run_scan(ScanArgs::with_config(args, &config)),
        Some(Commands::Methods(ref args)) => match commands::methods::run(args) {
            Ok(()) => ExitCode::Success,
            Err(e) => report(&e),
        },
        Some(Commands::Status(ref args)) => {
            commands::status::run(args, &config).unwrap_or_else(|e| report(&e))
        }
        Some(Commands::Models(ref args)) => match commands::models::run(args, &config) {
            Ok(()) => ExitCode::Success,
            Err(e) => report(&e),
        },
        None => {
            // Default behavior: run scan with flattened args
            if cli.scan.inputs.is_empty() {
                eprintln!("error: No inputs specified. Use --help for usage information.");
                return ExitCode::Error.into();
            }
            run_scan(ScanArgs::with_config(cli.scan, &config))
        }
    };

    exit_code.into()
}

fn run_scan(args: ScanArgs) -> ExitCode {
    match scan::run(&args) {
        Ok(result) => result.exit_code,
        Err(e) => report(&e),
    }
}

fn report(error: &anyhow::Error) -> ExitCode {
    eprintln!("error: {error:#}");
    ExitCode::Error
}
