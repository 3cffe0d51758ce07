//! `docuapprove` - CLI for the document approval service
//!
//! This binary runs the HTTP service and offers operator commands for
//! inspecting and deciding on documents.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::BufRead;

use anyhow::{bail, Context};
use clap::Parser;

use docuapprove::api::{self, AppState};
use docuapprove::auth::hash_password;
use docuapprove::cli::{
    format_bytes, guess_content_type, render_document, render_documents, AccountsCommand, Cli,
    Command, ConfigCommand, DocumentsCommand, ServeCommand, SessionsCommand, SubmitCommand,
};
use docuapprove::{init_logging, Config, Decision, DocumentFilter, DocumentStatus, Upload};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Validating a file must not require the default config to be valid
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        return handle_config_validate(file.clone().or_else(|| cli.config.clone()));
    }

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // Execute the command
    match cli.command {
        Command::Serve(cmd) => handle_serve(config, cmd).await,
        Command::Documents(cmd) => handle_documents(&config, cmd).await,
        Command::Submit(cmd) => handle_submit(&config, cmd).await,
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Accounts(cmd) => handle_accounts(&config, cmd),
        Command::Sessions(cmd) => handle_sessions(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

async fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(bind) = cmd.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }

    let addr = config.socket_addr()?;
    let state = AppState::from_config(&config)?;
    tracing::info!(
        database = %config.database_path().display(),
        blobs = %config.blob_dir().display(),
        "Starting docuapprove"
    );
    api::serve(state, addr).await?;
    Ok(())
}

async fn handle_documents(config: &Config, cmd: DocumentsCommand) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let admin = state.sessions.directory().admin_identity();

    match cmd {
        DocumentsCommand::List {
            status,
            user,
            search,
            limit,
            format,
        } => {
            let filter = DocumentFilter {
                status: status.map(DocumentStatus::from),
                user_id: user,
                name_contains: search,
                limit: Some(limit),
            };
            let docs = state
                .documents
                .storage()
                .with(|s| s.list_documents(&filter))?;
            println!("{}", render_documents(&docs, format)?);
        }
        DocumentsCommand::Show { id, json } => {
            let doc = state.documents.document(&admin, &id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                println!("{}", render_document(&doc));
            }
        }
        DocumentsCommand::Decide {
            id,
            verdict,
            suggestion,
        } => {
            let decision = Decision::new(verdict.into(), suggestion)?;
            let doc = state.documents.decide(&admin, &id, &decision)?;
            println!("{} is now {}", doc.name, doc.status);
        }
        DocumentsCommand::Delete { id } => {
            state.documents.delete(&admin, &id).await?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

async fn handle_submit(config: &Config, cmd: SubmitCommand) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let Some(identity) = state.sessions.directory().identity_for_email(&cmd.as_email) else {
        bail!("no configured account for {}", cmd.as_email);
    };

    let bytes = tokio::fs::read(&cmd.file)
        .await
        .with_context(|| format!("failed to read {}", cmd.file.display()))?;
    let content_type = cmd
        .content_type
        .unwrap_or_else(|| guess_content_type(&cmd.file, &bytes));
    let file_name = cmd
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let upload = Upload::new(file_name, content_type, bytes).with_reason(cmd.reason);
    let doc = state.documents.submit(&identity, upload).await?;
    println!("Submitted {} as {} ({})", doc.name, doc.id, doc.status);
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let stats = state.documents.storage().with(|s| s.stats())?;

    if json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "blob_dir": config.blob_dir(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("docuapprove status");
        println!("------------------");
        println!("Database:      {}", config.database_path().display());
        println!("Blobs:         {}", config.blob_dir().display());
        println!("DB size:       {}", format_bytes(stats.db_size_bytes));
        println!();
        println!("Documents:     {}", stats.total_documents);
        println!("  Pending:     {}", stats.by_status.pending);
        println!("  Approved:    {}", stats.by_status.approved);
        println!("  Declined:    {}", stats.by_status.declined);
        println!("Stored bytes:  {}", format_bytes(stats.total_bytes));
        if let (Some(oldest), Some(newest)) = (stats.oldest_upload, stats.newest_upload) {
            println!("Oldest upload: {}", oldest.to_rfc3339());
            println!("Newest upload: {}", newest.to_rfc3339());
        }
        println!("Sessions:      {} active", stats.active_sessions);
    }
    Ok(())
}

fn handle_accounts(config: &Config, cmd: AccountsCommand) -> anyhow::Result<()> {
    match cmd {
        AccountsCommand::HashPassword { email, password } => {
            let password = match password {
                Some(password) => password,
                None => {
                    let mut line = String::new();
                    std::io::stdin()
                        .lock()
                        .read_line(&mut line)
                        .context("failed to read password from stdin")?;
                    line.trim_end_matches(['\r', '\n']).to_string()
                }
            };
            if password.is_empty() {
                bail!("password must not be empty");
            }
            println!("{}", hash_password(&email, &password));
        }
        AccountsCommand::List => {
            if config.auth.accounts.is_empty() {
                println!("No accounts configured.");
            }
            for account in &config.auth.accounts {
                let admin = if account.email.eq_ignore_ascii_case(&config.auth.admin_email) {
                    "  [admin]"
                } else {
                    ""
                };
                println!(
                    "{}  {}{}",
                    account.email,
                    account.username.as_deref().unwrap_or("Unknown"),
                    admin
                );
            }
        }
    }
    Ok(())
}

fn handle_sessions(config: &Config, cmd: &SessionsCommand) -> anyhow::Result<()> {
    match cmd {
        SessionsCommand::Prune => {
            let state = AppState::from_config(config)?;
            let removed = state.sessions.prune_expired()?;
            println!("Removed {removed} expired session(s)");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Blob directory:     {}", config.blob_dir().display());
                println!("  Public base URL:    {}", config.storage.public_base_url);
                println!();
                println!("[Upload]");
                println!(
                    "  Allowed types:      {}",
                    config.upload.allowed_types.join(", ")
                );
                println!(
                    "  Max size:           {}",
                    format_bytes(config.upload.max_size_bytes)
                );
                println!();
                println!("[Auth]");
                println!("  Admin email:        {}", config.auth.admin_email);
                println!("  Session TTL (h):    {}", config.auth.session_ttl_hours);
                println!("  Accounts:           {}", config.auth.accounts.len());
                println!();
                println!("[Server]");
                println!(
                    "  Listen:             {}:{}",
                    config.server.bind_address, config.server.port
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            return handle_config_validate(file);
        }
    }
    Ok(())
}

fn handle_config_validate(file: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => {
            println!("Configuration is valid.");
            Ok(())
        }
        Err(e) => bail!("configuration error: {e}"),
    }
}
