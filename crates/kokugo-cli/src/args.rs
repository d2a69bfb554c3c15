//! Top-level command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{DraftCommands, ModelCommands, PlanCommands};

/// Lesson-plan drafting tool for Japanese-language (国語) classes
///
/// Fill in the lesson-plan form field by field, generate the structured plan
/// (by hand or through the completion endpoint), then save and export it.
/// Every edit is auto-saved as a draft to the local and the shared store and
/// restored from whichever copy is newer on the next run.
#[derive(Parser)]
#[command(version, about, name = "kokugo")]
pub struct Args {
    /// Directory holding the local and shared stores and exported files.
    /// Defaults to $XDG_DATA_HOME/kokugo
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// User id the shared draft is stored under
    #[arg(long, global = true, default_value = "local")]
    pub user: String,

    /// Completion endpoint used for AI generation
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Quiet period in milliseconds before edits are auto-saved
    #[arg(long, global = true, default_value_t = 800)]
    pub debounce_ms: u64,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Edit the current draft
    #[command(alias = "d")]
    Draft {
        #[command(subcommand)]
        command: DraftCommands,
    },
    /// Manage saved lesson plans
    #[command(alias = "p")]
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Manage education models; lists them without a subcommand
    #[command(alias = "m")]
    Models {
        #[command(subcommand)]
        command: Option<ModelCommands>,
    },
    /// Start the MCP server
    Serve,
}
