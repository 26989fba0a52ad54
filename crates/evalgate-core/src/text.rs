#[must_use]
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let Some((clip_idx, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let mut out = text[..clip_idx].to_string();
    out.push_str("...");
    out
}

/// Shortest round-trip decimal form. `1.0` prints as `1`.
#[must_use]
pub fn format_number(value: f64) -> String {
    format!("{value}")
}

/// Fixed-precision display form with trailing zeros dropped.
#[must_use]
pub fn format_display_number(value: f64) -> String {
    let fixed = format!("{value:.4}");
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[must_use]
pub fn format_signed_delta(value: f64) -> String {
    let body = format_display_number(value);
    if body.starts_with('-') || body == "0" {
        body
    } else {
        format!("+{body}")
    }
}

/// Collapses line breaks so a value fits in one markdown list item or table cell.
#[must_use]
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
