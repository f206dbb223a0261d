//! Truncation utilities for limiting text sent to a language model.
//!
//! Truncation:
//! - counts characters, never splitting a multi-byte character
//! - prefers line boundaries, then word boundaries
//! - marks the cut with an ellipsis

/// Upper bound on the characters of source code sent for analysis.
pub const MAX_ANALYSIS_CHARS: usize = 24_000;

const ELLIPSIS: &str = "...";

/// Truncate a string to `max_chars` characters, preserving line or word boundaries.
/// The returned string is at most `max_chars` characters long (including ellipsis).
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }

    let content_limit = max_chars.saturating_sub(ELLIPSIS.len());
    if content_limit == 0 {
        return ELLIPSIS[..max_chars.min(ELLIPSIS.len())].to_string();
    }

    let byte_end = s
        .char_indices()
        .nth(content_limit)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len());
    let truncated = &s[..byte_end];
    let half = content_limit / 2;

    // Try to break at newline first, then at a word boundary
    for boundary in ['\n', ' '] {
        if let Some(pos) = truncated.rfind(boundary) {
            if truncated[..pos].chars().count() > half {
                return format!("{}{}", &truncated[..pos], ELLIPSIS);
            }
        }
    }

    // Hard truncate if no good boundary found
    format!("{}{}", truncated, ELLIPSIS)
}
