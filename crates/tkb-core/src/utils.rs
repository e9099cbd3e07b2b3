use chrono::{DateTime, Utc};

// ============== Text Helpers ==============

/// Truncate to at most `max` bytes on a char boundary, marking the cut with `...`.
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let budget = max.saturating_sub(3);
    let mut cut = budget;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}

/// `alice` -> `Alice`; only the first character changes.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============== Timestamp Helpers ==============

/// Minute-precision UTC stamp used in note attribution headers.
pub fn note_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}
