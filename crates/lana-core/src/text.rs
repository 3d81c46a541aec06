//! UTF-8–safe string truncation for log previews.
//!
//! Rust `&str[..n]` panics when `n` falls inside a multi-byte character,
//! and the SSE payloads we preview in warn logs are full of accented
//! Spanish text and emoji.

/// Truncate a string to at most `max_bytes` bytes at a char boundary.
#[inline]
#[must_use]
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
