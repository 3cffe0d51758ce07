//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::document::DocumentStatus;

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to bind (overrides `server.bind_address`)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Port to listen on (overrides `server.port`)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Document management commands.
#[derive(Debug, Subcommand)]
pub enum DocumentsCommand {
    /// List documents, newest first
    List {
        /// Filter by status
        #[arg(short, long, value_enum)]
        status: Option<StatusArg>,

        /// Filter by owner user id
        #[arg(short, long)]
        user: Option<String>,

        /// Filter by name (case-insensitive substring)
        #[arg(long)]
        search: Option<String>,

        /// Maximum number of results
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one document
    Show {
        /// Document id
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Approve or decline a document as the configured admin
    Decide {
        /// Document id
        id: String,

        /// The decision
        #[arg(value_enum)]
        verdict: VerdictArg,

        /// Feedback for the uploader (required when declining)
        #[arg(short, long)]
        suggestion: Option<String>,
    },

    /// Delete a document and its file
    Delete {
        /// Document id
        id: String,
    },
}

/// Submit command arguments.
#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// File to submit
    pub file: PathBuf,

    /// Email of the configured account to submit as
    #[arg(long = "as", value_name = "EMAIL")]
    pub as_email: String,

    /// MIME type (guessed from the extension and content if omitted)
    #[arg(short = 't', long = "type", value_name = "MIME")]
    pub content_type: Option<String>,

    /// Note for the reviewer
    #[arg(short, long)]
    pub reason: Option<String>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Account commands.
#[derive(Debug, Subcommand)]
pub enum AccountsCommand {
    /// Print the password hash to put in the config file
    HashPassword {
        /// Account email
        email: String,

        /// Password (read from stdin if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// List configured accounts
    List,
}

/// Session commands.
#[derive(Debug, Subcommand)]
pub enum SessionsCommand {
    /// Delete expired sessions
    Prune,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Status argument for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Awaiting review
    Pending,
    /// Approved
    Approved,
    /// Declined
    #[value(alias = "rejected")]
    Declined,
}

impl From<StatusArg> for DocumentStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => Self::Pending,
            StatusArg::Approved => Self::Approved,
            StatusArg::Declined => Self::Declined,
        }
    }
}

/// An admin verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VerdictArg {
    /// Accept the document
    Approve,
    /// Send the document back
    #[value(alias = "reject")]
    Decline,
}

impl From<VerdictArg> for DocumentStatus {
    fn from(arg: VerdictArg) -> Self {
        match arg {
            VerdictArg::Approve => Self::Approved,
            VerdictArg::Decline => Self::Declined,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
