//! Models command - manage ML models.

use std::path::PathBuf;
use std::time::Duration;

use aiscan_adapters::models::{ensure_models, find_model};
use aiscan_adapters::{default_models_dir, list_models};
use anyhow::Result;
use clap::{Args, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::AppConfig;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR", global = true)]
    pub models_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Download missing models
    Fetch {
        /// Also fetch optional models (external face detector)
        #[arg(long)]
        all: bool,
    },
    /// List known models and whether they are installed
    List,
    /// Print model directory path
    Path,
}

/// Run the models command.
pub fn run(args: &ModelsArgs, config: &AppConfig) -> Result<()> {
    let dir = args
        .models_dir
        .clone()
        .or_else(|| config.models.dir.clone())
        .unwrap_or_else(default_models_dir);

    match args.command {
        ModelsCommand::Fetch { all } => fetch_models(&dir, all),
        ModelsCommand::List => {
            print_list(&dir);
            Ok(())
        }
        ModelsCommand::Path => {
            println!("{}", dir.display());
            Ok(())
        }
    }
}

fn fetch_models(dir: &std::path::Path, all: bool) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .map_err(|e| anyhow::anyhow!("Invalid progress template: {e}"))?,
    );
    pb.set_message(format!("Fetching models into {}", dir.display()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let fetched = match ensure_models(dir, all) {
        Ok(fetched) => fetched,
        Err(e) => {
            pb.abandon_with_message("Model download failed");
            return Err(e);
        }
    };

    if fetched.is_empty() {
        pb.finish_with_message("All models already installed");
    } else {
        pb.finish_with_message(format!("Downloaded {}", fetched.join(", ")));
    }
    Ok(())
}

fn print_list(dir: &std::path::Path) {
    let models = list_models(dir);

    println!("Models directory: {}", dir.display());
    println!();

    for model in &models {
        let status = if model.installed { "✓" } else { "✗" };
        let filename = find_model(model.name).map_or("unknown", |m| m.filename);
        let kind = if model.required { "required" } else { "optional" };
        println!("  {status} {} ({filename}, {kind})", model.name);
    }

    println!();
    let installed_count = models.iter().filter(|m| m.installed).count();
    println!("{}/{} models installed", installed_count, models.len());
}
