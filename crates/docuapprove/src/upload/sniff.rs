//! Magic-byte detection for the formats the service accepts by default.

/// Known signatures, longest match first where prefixes overlap.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
];

/// Detect the MIME type of `bytes` from its leading signature.
///
/// Returns `None` for formats without a known signature; callers should then
/// trust the declared type.
#[must_use]
pub fn sniff_content_type(bytes: &[u8]) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, mime)| *mime)
}
