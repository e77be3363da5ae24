//! Chat titles derived from the first user message.

use super::thread::PLACEHOLDER_TITLE;

/// Words of the first message kept in a derived title.
const TITLE_WORDS: usize = 3;

const TITLE_MARKER: &str = "💬 ";
const TITLE_ELLIPSIS: &str = "...";

/// Derive a sidebar title from the first user message.
///
/// Keeps the first three whitespace-delimited words, upper-cases the first
/// character, lower-cases the rest and wraps the result in the chat marker.
/// Blank input yields [`PLACEHOLDER_TITLE`], which means "do not promote".
///
/// ```rust
/// use tennis_assistant::session::title_from;
///
/// assert_eq!(title_from("quick serve practice today"), "💬 Quick serve practice...");
/// ```
#[must_use]
pub fn title_from(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().take(TITLE_WORDS).collect();
    if words.is_empty() {
        return PLACEHOLDER_TITLE.to_string();
    }

    let title = capitalize_first(&words.join(" "));
    format!("{TITLE_MARKER}{title}{TITLE_ELLIPSIS}")
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
