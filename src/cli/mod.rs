//! CLI Module
//!
//! Command-line interface for editing, playing and exporting animation
//! project files.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::state::project::EffectKind;

/// Animate - frame-by-frame animation editor
#[derive(Parser, Debug)]
#[command(name = "animate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Editor configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new project file
    #[command(name = "new")]
    New {
        /// Directory to create the project in
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Frames per second (defaults to the configured rate)
        #[arg(long)]
        fps: Option<u32>,
    },

    /// Print a summary of a project
    #[command(name = "info")]
    Info {
        /// Path to the project file
        path: PathBuf,
    },

    /// Insert a blank frame after the current one
    #[command(name = "add-frame")]
    AddFrame {
        /// Path to the project file
        path: PathBuf,
    },

    /// Delete a frame
    #[command(name = "delete-frame")]
    DeleteFrame {
        /// Path to the project file
        path: PathBuf,

        /// Frame index (0-based)
        index: usize,
    },

    /// Duplicate a frame, inserting the copy after it
    #[command(name = "duplicate-frame")]
    DuplicateFrame {
        /// Path to the project file
        path: PathBuf,

        /// Frame index (0-based)
        index: usize,
    },

    /// Move a frame to a new position
    #[command(name = "reorder")]
    Reorder {
        /// Path to the project file
        path: PathBuf,

        from: usize,

        to: usize,
    },

    /// Toggle a dynamic effect on the current frame
    #[command(name = "effect")]
    Effect {
        /// Path to the project file
        path: PathBuf,

        /// particles, motion_blur, glow or speed_lines
        kind: EffectKind,

        #[arg(long, default_value_t = 1.0)]
        intensity: f32,

        /// Toggle on every frame
        #[arg(long)]
        all: bool,
    },

    /// Set the frame rate
    #[command(name = "fps")]
    Fps {
        /// Path to the project file
        path: PathBuf,

        fps: u32,
    },

    /// Play the timeline for a number of ticks
    #[command(name = "play")]
    Play {
        /// Path to the project file
        path: PathBuf,

        /// Ticks to play before stopping
        #[arg(short, long, default_value_t = 24)]
        ticks: u64,
    },

    /// Render the animation to a GIF
    #[command(name = "export")]
    Export {
        /// Path to the project file
        path: PathBuf,

        /// Output directory (defaults to the project's directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}
