//! Markup cleaners.
//!
//! Removes infobox blocks, category tags, file anchors and link brackets
//! from raw article markup before citations are extracted. Each cleaner is
//! a `&str -> String` pass; [`clean_markup`] runs them in order.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::diagnostic::Diagnostic;

const INFOBOX_OPEN: &str = "{{Infobox";

/// Greedy to the last `]]` on the line.
static CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[Category:(.*)\]\]").expect("valid regex"));

/// One category tag at a time, for collecting names.
static CATEGORY_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[Category:([^\]|]+)(?:\|[^\]]*)?\]\]").expect("valid regex")
});

/// Can overrun the file anchor up to the last `]]` on the same line.
static FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[File[^\]]*?[^\]].*\]\]").expect("valid regex"));

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("valid regex"));

/// Result of running all cleaners over a raw article.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedMarkup {
    pub text: String,
    /// Category names found before the tags were stripped
    pub categories: BTreeSet<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the cleaners in order: infobox, categories, then (only when
/// `clean_references` is set) file anchors and link brackets.
pub fn clean_markup(raw: &str, clean_references: bool) -> CleanedMarkup {
    let mut diagnostics = Vec::new();

    let (mut text, noop) = strip_infobox(raw);
    diagnostics.extend(noop);

    let categories = collect_categories(&text);
    text = remove_categories(&text);

    if clean_references {
        text = remove_file_anchors(&text);
        text = resolve_anchors(&text);
    }

    tracing::debug!(
        categories = categories.len(),
        bytes_in = raw.len(),
        bytes_out = text.len(),
        "cleaned markup"
    );

    CleanedMarkup {
        text,
        categories,
        diagnostics,
    }
}

/// Removes the first balanced `{{Infobox ...}}` block.
///
/// Only the first infobox is removed. An infobox whose braces never
/// balance is left in place.
pub fn remove_infobox(text: &str) -> String {
    strip_infobox(text).0
}

fn strip_infobox(text: &str) -> (String, Option<Diagnostic>) {
    let Some(start) = text.find(INFOBOX_OPEN) else {
        return (text.to_string(), None);
    };

    match balanced_block_end(&text[start..]) {
        Some(len) => {
            let mut result = String::with_capacity(text.len() - len);
            result.push_str(&text[..start]);
            result.push_str(&text[start + len..]);
            (result, None)
        }
        None => (text.to_string(), Some(Diagnostic::parse_noop("infobox"))),
    }
}

/// Returns the byte length of the brace-balanced block at the start of
/// `text`, or `None` if the depth never returns to zero.
fn balanced_block_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, byte) in text.bytes().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Collects the names of all `[[Category:Name]]` and `[[Category:Name|Sort]]` tags.
pub fn collect_categories(text: &str) -> BTreeSet<String> {
    CATEGORY_NAME_RE
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Removes category tags.
pub fn remove_categories(text: &str) -> String {
    CATEGORY_RE.replace_all(text, "").into_owned()
}

/// Removes `[[File:...]]` anchors.
///
/// The match is greedy: with a later `]]` on the same line it removes
/// everything up to that one, including unrelated text in between.
pub fn remove_file_anchors(text: &str) -> String {
    FILE_RE.replace_all(text, "").into_owned()
}

/// Replaces every `[[target|display]]` with `display` and every `[[target]]`
/// with `target`.
pub fn resolve_anchors(text: &str) -> String {
    ANCHOR_RE
        .replace_all(text, |cap: &Captures| {
            let inner = &cap[1];
            match inner.split_once('|') {
                Some((_, display)) => display.to_string(),
                None => inner.to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_infobox_keeps_surrounding_text() {
        // Given: Text with an infobox holding nested templates
        let text = "Lead.\n{{Infobox person\n| name = {{nowrap|A B}}\n| born = 1900\n}}\nBody text.";

        // When: We remove the infobox
        let result = remove_infobox(text);

        // Then: The whole balanced block is gone, the rest is untouched
        assert_eq!(result, "Lead.\n\nBody text.");
    }

    #[test]
    fn test_remove_infobox_only_first() {
        let text = "{{Infobox a|x=1}} mid {{Infobox b|y=2}} end";

        let result = remove_infobox(text);

        assert_eq!(result, " mid {{Infobox b|y=2}} end");
    }

    #[test]
    fn test_remove_infobox_unbalanced_passes_through() {
        let text = "{{Infobox a| x = {{b}} never closed";

        let (result, diagnostic) = strip_infobox(text);

        assert_eq!(result, text);
        assert_eq!(diagnostic, Some(Diagnostic::parse_noop("infobox")));
    }

    #[test]
    fn test_remove_infobox_without_infobox() {
        let (result, diagnostic) = strip_infobox("plain {{cite web|url=x}}");
        assert_eq!(result, "plain {{cite web|url=x}}");
        assert!(diagnostic.is_none());
    }

    #[test]
    fn test_categories_collected_and_removed() {
        // Given: Category tags, one with a sort key
        let text = "Body.\n[[Category:Physicists]]\n[[Category:People from Ulm|Einstein]]\n";

        // When: We collect then strip
        let categories = collect_categories(text);
        let stripped = remove_categories(text);

        // Then: Names are collected and the tags are gone
        assert_eq!(
            categories.into_iter().collect::<Vec<_>>(),
            vec!["People from Ulm".to_string(), "Physicists".to_string()]
        );
        assert_eq!(stripped, "Body.\n\n\n");
    }

    #[test]
    fn test_category_strip_is_greedy_on_one_line() {
        let stripped = remove_categories("[[Category:A]] text [[Category:B]] tail");
        assert_eq!(stripped, " tail");
    }

    #[test]
    fn test_file_anchor_removed() {
        let text = "Before [[File:Map.png|thumb|A map]] after\nnext line";

        let result = remove_file_anchors(text);

        assert_eq!(result, "Before  after\nnext line");
    }

    #[test]
    fn test_file_anchor_overruns_to_last_bracket_pair() {
        // The greedy match swallows the unrelated link later on the line.
        let text = "[[File:a.jpg|thumb]] see [[Paris]] too";

        let result = remove_file_anchors(text);

        assert_eq!(result, " too");
    }

    #[test]
    fn test_resolve_anchors() {
        let text = "[[Walter W. Granger|Walter Granger]] visited [[Medicine Bow, Wyoming]].";

        let result = resolve_anchors(text);

        assert_eq!(result, "Walter Granger visited Medicine Bow, Wyoming.");
    }

    #[test]
    fn test_clean_markup_order() {
        // Given: Categories and anchors, with reference cleaning on
        let raw = "{{Infobox x|a=1}}[[Paris|The city]] is nice.\n[[Category:Cities]]";

        // When: We clean
        let cleaned = clean_markup(raw, true);

        // Then: The category never leaks into text as plain words
        assert_eq!(cleaned.text, "The city is nice.\n");
        assert!(cleaned.categories.contains("Cities"));
        assert!(cleaned.diagnostics.is_empty());
    }

    #[test]
    fn test_clean_markup_keeps_anchors_by_default() {
        let cleaned = clean_markup("See [[Paris]].", false);
        assert_eq!(cleaned.text, "See [[Paris]].");
    }
}
