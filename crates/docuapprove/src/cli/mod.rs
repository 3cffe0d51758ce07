//! Command-line interface for docuapprove.
//!
//! This module provides the CLI structure and output helpers for the
//! `docuapprove` binary.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AccountsCommand, ConfigCommand, DocumentsCommand, OutputFormat, ServeCommand,
    SessionsCommand, StatusArg, StatusCommand, SubmitCommand, VerdictArg,
};
pub use output::{format_bytes, guess_content_type, render_document, render_documents, truncate};

/// docuapprove - Document submission and approval service
///
/// Users upload documents, an admin approves or declines them with
/// suggestions, and users follow the status of their submissions.
#[derive(Debug, Parser)]
#[command(name = "docuapprove")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service
    Serve(ServeCommand),

    /// List, inspect, decide on and delete documents
    #[command(subcommand)]
    Documents(DocumentsCommand),

    /// Submit a local file on behalf of an account
    Submit(SubmitCommand),

    /// Show database statistics
    Status(StatusCommand),

    /// Manage login accounts
    #[command(subcommand)]
    Accounts(AccountsCommand),

    /// Manage login sessions
    #[command(subcommand)]
    Sessions(SessionsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}
