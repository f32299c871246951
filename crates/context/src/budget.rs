//! Character budgets and token estimation.
//!
//! Budgets are counted in Unicode scalar values, never bytes, so a
//! truncated string is always valid UTF-8 and never longer than asked.

/// Appended to truncated text when it fits inside the budget.
pub const ELLIPSIS: &str = " [...]";

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    char_len(text).div_ceil(4)
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Cut `text` to at most `budget` characters.
///
/// Prefers to stop at whitespace in the last half of the window and
/// appends [`ELLIPSIS`] when there is room for it. A zero budget yields
/// an empty string.
pub fn truncate_chars(text: &str, budget: usize) -> String {
    if char_len(text) <= budget {
        return text.to_string();
    }

    let marker_len = char_len(ELLIPSIS);
    if budget <= marker_len {
        return prefix(text, budget).to_string();
    }

    let window = prefix(text, budget - marker_len);
    let at_word_end = text[window.len()..].starts_with(char::is_whitespace);
    let cut = if at_word_end {
        window
    } else {
        match window.rfind(char::is_whitespace) {
            Some(idx) if char_len(&window[..idx]) >= char_len(window) / 2 => &window[..idx],
            _ => window,
        }
    };
    format!("{}{ELLIPSIS}", cut.trim_end())
}

/// First `n` characters of `text`.
fn prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
