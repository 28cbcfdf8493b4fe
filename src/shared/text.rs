//! Text helpers for log output

/// Number of characters of generated text included in outcome logs
pub const LOG_SNIPPET_CHARS: usize = 50;

/// Longest prefix of `text` with at most `max_chars` characters
///
/// Cuts on a character boundary, so multibyte text never panics.
pub fn snippet(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
