use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Shortens `text` to at most `max_chars` characters, ending in an ellipsis
/// when something was cut.
pub fn truncate_label(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head = chars.by_ref().take(max_chars).collect::<String>();
    if chars.next().is_none() {
        head
    } else {
        let mut head = head
            .chars()
            .take(max_chars.saturating_sub(1))
            .collect::<String>();
        head.push('…');
        head
    }
}

pub fn first_line(text: &str) -> &str {
    text.lines().map(str::trim).find(|line| !line.is_empty()).unwrap_or("")
}

/// Deterministic pair in `[-1, 1]²` derived from `key`.
pub fn stable_pair(key: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}
