use std::collections::HashSet;

use super::reader::RawValue;

/// Name prefix the reader gives tags it has no semantic mapping for.
pub const UNDEFINED_TAG_PREFIX: &str = "UndefinedTag:";

/// Decode raw tag bytes to text.
///
/// Valid UTF-8 passes through untouched; anything else is treated as a legacy
/// 8-bit (ISO-8859-1) string, where every byte maps to the code point of the
/// same value.
pub fn to_utf8(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Remove every character that does not print: control characters (NUL,
/// C0/C1 controls, DEL), invisible format characters (BOM, zero-width and
/// bidi marks) and the replacement character left by lossy decoding.
pub fn strip_non_printable(value: &str) -> String {
    value
        .chars()
        .filter(|&c| !c.is_control() && !is_format_char(c) && c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// Unicode general category Cf (format), restricted to the Basic
/// Multilingual Plane plus the tag characters.
fn is_format_char(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{0890}'..='\u{0891}'
            | '\u{08E2}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
    )
}

/// Normalizes raw tag values into printable UTF-8 text and decides which tags
/// are dropped.
#[derive(Debug, Clone, Default)]
pub struct ValueSanitizer {
    excluded: HashSet<String>,
}

impl ValueSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sanitizer that additionally drops the given tag names
    /// (compared case-insensitively).
    pub fn with_excluded_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            excluded: tags
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Whether a tag must be dropped entirely instead of sanitized.
    pub fn is_excluded(&self, tag_name: &str) -> bool {
        tag_name.starts_with(UNDEFINED_TAG_PREFIX) || self.excluded.contains(&tag_name.to_lowercase())
    }

    /// Flatten a value to a single printable string. Lists are joined with `,`.
    pub fn sanitize(&self, value: &RawValue) -> String {
        let joined = match value {
            RawValue::Scalar(s) => s.clone(),
            RawValue::List(items) => items.join(","),
        };
        strip_non_printable(&joined)
    }

    /// Sanitize a named tag, or `None` when the tag is excluded.
    pub fn sanitize_tag(&self, tag_name: &str, value: &RawValue) -> Option<String> {
        if self.is_excluded(tag_name) {
            return None;
        }
        Some(self.sanitize(value))
    }
}
