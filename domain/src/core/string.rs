//! String utilities for the domain layer.

/// Single-line preview of model text for log messages (UTF-8 safe).
///
/// Newlines are flattened to spaces and the result is cut to at most
/// `max_len` bytes, ending in `...` when truncated.
pub fn preview(s: &str, max_len: usize) -> String {
    let flat: String = s
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.len() <= max_len {
        return flat;
    }
    let mut end = max_len.saturating_sub(3).min(flat.len());
    while end > 0 && !flat.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &flat[..end])
}
