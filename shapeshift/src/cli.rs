//! Command-line interface definitions for shapeshift

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI structure for the shapeshift application
#[derive(Parser)]
#[command(name = "shapeshift")]
#[command(version)]
#[command(about = "Chat-driven single-page website builder", long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = shapeshift::app_config::CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for shapeshift
#[derive(Subcommand)]
pub enum Commands {
    /// Edit the page interactively; type /reset to start over, /quit to leave
    Chat,

    /// Apply a saved assistant reply without calling the assistant
    Apply {
        /// File holding the raw reply; reads stdin when omitted or "-"
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Render the current document to the configured HTML file
    Render,

    /// Print the current document as JSON
    Show,

    /// Print the prompt that would be sent for MESSAGE
    Prompt {
        /// The user request
        message: String,
    },

    /// Discard all changes and go back to the default page
    Reset,

    /// Write a default shapeshift.toml
    Init {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },
}
