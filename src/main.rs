//! Animate CLI - Frame-by-Frame Animation Editor
//!
//! Command-line interface for editing, playing and exporting projects.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use animate::cli::commands;
use animate::cli::{Cli, Commands};
use animate::config::EditorConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    info!("Animate v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Some(cmd) => handle_command(cmd, config).await,
        None => {
            println!("Animate v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

async fn handle_command(cmd: Commands, config: EditorConfig) -> anyhow::Result<()> {
    match cmd {
        Commands::New { dir, fps } => commands::new_project(&dir, fps, config)?,
        Commands::Info { path } => commands::show_info(&path, config)?,
        Commands::AddFrame { path } => commands::add_frame(&path, config)?,
        Commands::DeleteFrame { path, index } => commands::delete_frame(&path, index, config)?,
        Commands::DuplicateFrame { path, index } => {
            commands::duplicate_frame(&path, index, config)?
        }
        Commands::Reorder { path, from, to } => commands::reorder(&path, from, to, config)?,
        Commands::Effect {
            path,
            kind,
            intensity,
            all,
        } => commands::toggle_effect(&path, kind, intensity, all, config)?,
        Commands::Fps { path, fps } => commands::set_fps(&path, fps, config)?,
        Commands::Play { path, ticks } => commands::play(&path, ticks, config)
            .await
            .with_context(|| format!("playing {}", path.display()))?,
        Commands::Export { path, out } => commands::export(&path, out.as_deref(), config)
            .await
            .with_context(|| format!("exporting {}", path.display()))?,
    }
    Ok(())
}
