//! Shared utilities for channel implementations.

/// Split `text` into chunks of at most `max_len` bytes.
///
/// Chunks end on a newline when one falls inside the window, and never
/// split a UTF-8 character.
pub fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len || max_len == 0 {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.len() > max_len {
        let mut end = max_len;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            // A single character wider than the limit.
            end = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let cut = rest[..end].rfind('\n').map_or(end, |i| i + 1);
        let (chunk, tail) = rest.split_at(cut);
        chunks.push(chunk);
        rest = tail;
    }

    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}
