//! Command-Line Interface

use crate::recognition::MatchStrategy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Spellcast - learn and recognize drawn gestures
#[derive(Parser, Debug)]
#[command(name = "spellcast")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Template library file (overrides the config)
    #[arg(short, long, global = true)]
    pub library: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Learn a gesture from three drawings
    Learn {
        /// Spell name
        #[arg(short, long)]
        name: String,

        /// Three path files, each a JSON array of [x, y] pairs
        #[arg(required = true, num_args = 3)]
        samples: Vec<PathBuf>,
    },

    /// Recognize a drawn path
    Recognize {
        /// Path file (JSON array of [x, y] pairs)
        path: PathBuf,

        /// Show every template's score
        #[arg(short, long)]
        all: bool,

        /// Matching strategy (rotation_invariant or bounding_box)
        #[arg(short, long)]
        strategy: Option<MatchStrategy>,
    },

    /// List learned gestures
    List,

    /// Delete a learned gesture
    Delete {
        /// Spell name
        name: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Import a preset library (JSON object of name -> [[x, y], ...])
    Import {
        /// Preset file
        file: PathBuf,
    },

    /// Replay a recorded tracking trace through the engine
    Replay {
        /// Trace file
        trace: PathBuf,

        /// Render tick spacing in milliseconds
        #[arg(short, long, default_value = "16")]
        render_every_ms: u64,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "smoothing.window", "recognition.strategy")
        key: String,

        /// Value to set
        value: String,
    },

    /// Get a specific configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
