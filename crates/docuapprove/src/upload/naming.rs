//! File name sanitizing and blob key construction.

use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

/// Prefix shared by every document blob key.
pub const KEY_PREFIX: &str = "documents";

fn unsafe_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9.-]").expect("static regex is valid"))
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
///
/// Multi-byte characters become a single `_` each.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    unsafe_chars().replace_all(name, "_").into_owned()
}

/// Build the blob key for a file uploaded by `user_id` at `at`.
///
/// Layout: `documents/{user_id}/{timestamp}-{sanitized name}`, where the
/// timestamp is RFC 3339 with milliseconds and `:`/`.` replaced by `-`, so
/// two uploads of the same name never collide unless they share a
/// millisecond.
#[must_use]
pub fn object_key(user_id: &str, at: DateTime<Utc>, file_name: &str) -> String {
    let timestamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!(
        "{KEY_PREFIX}/{}/{timestamp}-{}",
        sanitize_file_name(user_id),
        sanitize_file_name(file_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_keeps_safe_chars() {
        assert_eq!(sanitize_file_name("Report-v2.final.pdf"), "Report-v2.final.pdf");
    }

    #[test]
    fn test_sanitize_replaces_unsafe_chars() {
        assert_eq!(
            sanitize_file_name("My Report (draft)#1.pdf"),
            "My_Report__draft__1.pdf"
        );
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
    }

    #[test]
    fn test_sanitize_unicode() {
        assert_eq!(sanitize_file_name("résumé.pdf"), "r_sum_.pdf");
    }

    #[test]
    fn test_object_key_layout() {
        let at = Utc.with_ymd_and_hms(2023, 10, 26, 12, 34, 56).unwrap()
            + chrono::Duration::milliseconds(789);
        let key = object_key("user123", at, "Q1 Report.pdf");
        assert_eq!(
            key,
            "documents/user123/2023-10-26T12-34-56-789Z-Q1_Report.pdf"
        );
    }

    #[test]
    fn test_object_key_sanitizes_user_id() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let key = object_key("../evil", at, "a.pdf");
        assert!(key.starts_with("documents/.._evil/"));
        assert!(!key.contains("/../"));
    }
}
