//! Human-readable rendering for CLI output.

use std::fmt::Write;
use std::path::Path;

use super::OutputFormat;
use crate::document::Document;
use crate::error::Result;
use crate::upload::sniff_content_type;

/// Widest name shown in table output.
const NAME_WIDTH: usize = 40;

/// Render a document list in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_documents(docs: &[Document], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(docs)?),
        OutputFormat::Plain => Ok(render_plain(docs)),
        OutputFormat::Table => Ok(render_table(docs)),
    }
}

fn render_plain(docs: &[Document]) -> String {
    let mut out = String::new();
    for doc in docs {
        let _ = writeln!(
            out,
            "{}  {}  {}  ({}, {})",
            doc.id,
            doc.status,
            doc.name,
            doc.user_email,
            doc.upload_date.format("%Y-%m-%d %H:%M")
        );
        if let Some(suggestion) = &doc.suggestion {
            let _ = writeln!(out, "    suggestion: {suggestion}");
        }
    }
    out
}

fn render_table(docs: &[Document]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<36}  {:<8}  {:<40}  {:<24}  {}",
        "ID", "STATUS", "NAME", "OWNER", "UPLOADED"
    );
    for doc in docs {
        let _ = writeln!(
            out,
            "{:<36}  {:<8}  {:<40}  {:<24}  {}",
            doc.id,
            doc.status.as_str(),
            truncate(&doc.name, NAME_WIDTH),
            truncate(&doc.user_email, 24),
            doc.upload_date.format("%Y-%m-%d %H:%M")
        );
    }
    let _ = write!(out, "{} document(s)", docs.len());
    out
}

/// Render one document as labelled lines.
#[must_use]
pub fn render_document(doc: &Document) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID:          {}", doc.id);
    let _ = writeln!(out, "Name:        {}", doc.name);
    let _ = writeln!(out, "Status:      {}", doc.status);
    let _ = writeln!(out, "Owner:       {} ({})", doc.user_email, doc.user_id);
    let _ = writeln!(out, "Uploaded:    {}", doc.upload_date.to_rfc3339());
    let _ = writeln!(out, "Type:        {}", doc.file_type);
    let _ = writeln!(out, "Size:        {}", format_bytes(doc.file_size));
    let _ = writeln!(out, "BLAKE3:      {}", doc.content_hash);
    let _ = writeln!(out, "URL:         {}", doc.url);
    if let Some(reason) = &doc.reason {
        let _ = writeln!(out, "Reason:      {reason}");
    }
    if let Some(suggestion) = &doc.suggestion {
        let _ = writeln!(out, "Suggestion:  {suggestion}");
    }
    if let (Some(at), Some(by)) = (&doc.admin_decision_date, &doc.admin_decision_by) {
        let _ = writeln!(out, "Decided:     {} by {}", at.to_rfc3339(), by);
    }
    out.trim_end().to_string()
}

/// Shorten `text` to at most `width` characters, marking the cut with `…`.
#[must_use]
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Format a byte count with a binary unit.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Guess a MIME type for a local file from its content, then its extension.
#[must_use]
pub fn guess_content_type(path: &Path, bytes: &[u8]) -> String {
    if let Some(sniffed) = sniff_content_type(bytes) {
        return sniffed.to_string();
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
    .to_string()
}
