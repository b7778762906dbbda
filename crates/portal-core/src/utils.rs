//! Utility functions for tracking codes, attachment checks and hashing

use sha2::{Digest, Sha256};
use std::path::Path;

/// Prefix shared by every tracking code
pub const TRACKING_PREFIX: &str = "PC-";

/// Largest accepted attachment, in bytes
pub const MAX_ATTACHMENT_SIZE: usize = 50 * 1024 * 1024;

/// MIME types accepted for attachments, matched exactly
pub const ALLOWED_MIME_TYPES: [&str; 12] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "video/mp4",
    "video/webm",
    "video/quicktime",
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "application/pdf",
    "text/plain",
];

/// Generate a tracking code: `PC-` followed by 8 uppercase hex digits
///
/// The code is random, not guaranteed unique; callers check the store.
#[must_use]
pub fn generate_tracking_id() -> String {
    format!("{TRACKING_PREFIX}{:08X}", rand::random::<u32>())
}

/// Whether `code` has the shape of a tracking code
#[must_use]
pub fn is_tracking_id(code: &str) -> bool {
    code.strip_prefix(TRACKING_PREFIX).is_some_and(|hex| {
        hex.len() == 8
            && hex
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    })
}

/// Canonical form of a user-typed tracking code
#[must_use]
pub fn normalize_tracking_id(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Whether a MIME type is on the attachment allow-list
#[must_use]
pub fn is_allowed_mime_type(mime_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime_type)
}

/// Lowercase hex SHA-256 of `content`
#[must_use]
pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Sanitize filename for safe storage
///
/// Only the final path component survives; anything other than an
/// alphanumeric, `.`, `_` or `-` becomes `_`. Leading dots and underscores
/// are dropped from the stem while the extension is kept, so `"★.png"`
/// becomes `"file.png"`. Empty results become `"file"`.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    let last = Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(filename);
    let last = last.rsplit(['/', '\\']).next().unwrap_or(last);

    let cleaned = last
        .chars()
        .map(|c| match c {
            c if c.is_alphanumeric() || c == '.' || c == '_' || c == '-' => c,
            _ => '_',
        })
        .collect::<String>();

    let (stem, extension) = match cleaned.rsplit_once('.') {
        Some((stem, ext)) if ext.chars().any(char::is_alphanumeric) => (stem, Some(ext)),
        _ => (cleaned.as_str(), None),
    };
    let stem = stem.trim_start_matches(['_', '.']);
    let stem = if stem.is_empty() { "file" } else { stem };

    match extension {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem.to_string(),
    }
}

/// Stored name for an attachment: a random 32-hex token, `_`, then the sanitized original
///
/// Long names keep their last 200 bytes, cut on a character boundary, so the
/// extension survives and the name fits common filesystem limits.
#[must_use]
pub fn generate_storage_filename(original: &str) -> String {
    let safe = sanitize_filename(original);
    let mut start = safe.len().saturating_sub(MAX_STORED_NAME_BYTES);
    while !safe.is_char_boundary(start) {
        start += 1;
    }
    format!("{}_{}", uuid::Uuid::new_v4().simple(), &safe[start..])
}

const MAX_STORED_NAME_BYTES: usize = 200;
