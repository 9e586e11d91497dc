//! Text rewriting and output rendering.
//!
//! This module applies span replacements to article text, strips marker
//! tokens for downstream consumers, and renders processed articles.

use crate::citation::MARKER_RE;
use crate::sections::Section;

/// A span of text to be replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    /// Start and end byte positions in the text being rewritten
    pub span: (usize, usize),
    /// The text that takes the span's place
    pub text: String,
}

/// Replaces every span with its replacement text.
///
/// # Implementation Note
///
/// Replacements are performed from the end of the text towards the beginning
/// to preserve the validity of span indices. Spans must not overlap.
pub fn replace_spans(text: &str, replacements: &[Replacement]) -> String {
    if replacements.is_empty() {
        return text.to_string();
    }

    let mut sorted: Vec<_> = replacements.iter().collect();
    sorted.sort_by(|a, b| b.span.0.cmp(&a.span.0));

    let mut result = text.to_string();
    for replacement in sorted {
        let (start, end) = replacement.span;
        result.replace_range(start..end, &replacement.text);
    }

    result
}

/// Removes every `{{n}}` marker token from the text.
///
/// # Examples
///
/// ```
/// use wikicite::strip_markers;
///
/// assert_eq!(strip_markers("Paris is large.{{0}}{{1}}"), "Paris is large.");
/// ```
pub fn strip_markers(text: &str) -> String {
    MARKER_RE.replace_all(text, "").into_owned()
}

/// Renders section labels as an indented outline, one label per line,
/// indented two spaces per level below the root. Sections deeper than
/// `max_level` are left out.
pub fn render_outline(root: &Section, max_level: Option<usize>) -> String {
    let mut output = String::new();
    for section in root.iter() {
        if max_level.is_some_and(|max| section.level > max) {
            continue;
        }
        let indent = "  ".repeat(section.level.saturating_sub(1));
        output.push_str(&indent);
        output.push_str(&section.label);
        output.push('\n');
    }
    output
}
