//! Root CLI structure for md3-rs

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "md3-rs")]
#[command(about = "Command-line tools for Quake 3 MD3 models", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// MD3 model operations
    Model {
        #[command(subcommand)]
        command: crate::commands::model::ModelCommands,
    },

    /// animation.cfg operations
    Anim {
        #[command(subcommand)]
        command: crate::commands::anim::AnimCommands,
    },

    /// .skin file operations
    Skin {
        #[command(subcommand)]
        command: crate::commands::skin::SkinCommands,
    },

    /// Player scene operations (lower/upper/head stacked on their tags)
    Scene {
        #[command(subcommand)]
        command: crate::commands::scene::SceneCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
