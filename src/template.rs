//! Citation template attribute parser.
//!
//! Parses the inner text of one citation template, such as
//! `cite web |url=http://y.com |title=Y`, into attributes and a type.

use std::collections::BTreeMap;

use crate::citation::{CitationRecord, CitationType};
use crate::diagnostic::Diagnostic;

/// A parsed template plus the fields that had to be ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTemplate {
    pub record: CitationRecord,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parses a citation template's inner text.
///
/// Fields are separated by `|` and split on their first `=`. Keys are
/// trimmed and keep their case; values are trimmed and lower-cased. Fields
/// without `=` are ignored, as are fields whose key or value is empty.
///
/// The classified type is stored under `type` (replacing a `type` field
/// from the template, if any), and a url gets the type appended in
/// parentheses: `http://y.com (web)`.
///
/// # Examples
///
/// ```
/// use wikicite::{parse_template, CitationType};
///
/// let parsed = parse_template("cite web|url=http://y.com|title=Y");
/// assert_eq!(parsed.record.kind, CitationType::Web);
/// assert_eq!(parsed.record.get("title"), Some("y"));
/// assert_eq!(parsed.record.get("url"), Some("http://y.com (web)"));
/// ```
pub fn parse_template(template: &str) -> ParsedTemplate {
    let mut attributes = BTreeMap::new();
    let mut diagnostics = Vec::new();

    for field in template.split('|') {
        let Some((key, value)) = field.split_once('=') else {
            if !field.trim().is_empty() {
                diagnostics.push(Diagnostic::attribute_malformed(field));
            }
            continue;
        };

        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        attributes.insert(key.to_string(), value.to_lowercase());
    }

    let kind = classify_template(template);
    attributes.insert("type".to_string(), kind.as_str().to_string());

    if let Some(url) = attributes.get_mut("url") {
        url.push_str(&format!(" ({})", kind));
    }

    ParsedTemplate {
        record: CitationRecord { attributes, kind },
        diagnostics,
    }
}

/// Classifies a template by the word(s) between its first space and its
/// first `|`, e.g. `cite news |...` is [`CitationType::News`].
pub fn classify_template(template: &str) -> CitationType {
    match (template.find(' '), template.find('|')) {
        (Some(start), Some(end)) if start < end => CitationType::from_name(&template[start..end]),
        _ => CitationType::NotAvailable,
    }
}
