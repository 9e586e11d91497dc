//! Sentence-citation linker.
//!
//! Finds the sentences that carry citation markers and indexes them by
//! marker and section:
//!
//! ```text
//! marker -> section label -> [citing sentence, ...]
//! ```
//!
//! Only cited sentences are captured. A citing sentence ends with a period
//! followed by one or more markers (`It rained.{{0}}{{1}}`) or with markers
//! followed by a period (`It rained{{0}}.`). Markers on both sides of the
//! period (`It rained{{0}}.{{1}}`) all belong to the sentence.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::citation::{marker_numbers, CitationTable, CitationType};
use crate::diagnostic::Diagnostic;
use crate::output::strip_markers;
use crate::sections::Section;

/// Non-greedy run of text ending in `{{n}}.` (optionally followed by more
/// markers) or in `.{{n}}...`
static SENTENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?:.*?)",
        r"(?:(?:\{\{[0-9]+\}\})+\.(?:\s*(?:\{\{[0-9]+\}\}\s?)+)?",
        r"|\.\s*(?:\{\{[0-9]+\}\}\s?)+)",
    ))
    .expect("valid regex")
});

static PARAGRAPH_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t\r]*\n").expect("valid regex"));

/// Citing sentences indexed by marker, then by section label.
pub type CitingStatements = BTreeMap<usize, BTreeMap<String, Vec<String>>>;

/// A resolved marker inside a citing sentence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentenceCitation {
    pub marker: usize,
    pub kind: CitationType,
    pub url: Option<String>,
}

/// A sentence that carries at least one marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitedSentence {
    /// The sentence verbatim, markers included
    pub text: String,
    /// Start and end byte positions in the paragraph
    pub span: (usize, usize),
    /// The markers that resolved to a citation, in order
    pub citations: Vec<SentenceCitation>,
}

/// Splits section text into paragraphs on blank lines, trimming each one.
pub fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    PARAGRAPH_BREAK_RE
        .split(text)
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
}

/// Finds the citing sentences of one paragraph and resolves their markers
/// against the table. Markers missing from the table are left out of
/// [`CitedSentence::citations`]; sentences made of markers only are skipped.
pub fn cited_sentences(paragraph: &str, table: &CitationTable) -> Vec<CitedSentence> {
    find_cited_sentences(paragraph, table, &mut Vec::new())
}

fn find_cited_sentences(
    paragraph: &str,
    table: &CitationTable,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<CitedSentence> {
    let mut sentences = Vec::new();

    for m in SENTENCE_RE.find_iter(paragraph) {
        let sentence = m.as_str();
        let words = strip_markers(sentence);
        if words.trim_matches(|c: char| c.is_whitespace() || c == '.').is_empty() {
            continue;
        }

        let mut citations = Vec::new();
        for raw in marker_numbers(sentence) {
            match table.resolve(raw) {
                Some((marker, record)) => citations.push(SentenceCitation {
                    marker,
                    kind: record.kind,
                    url: record.url().map(str::to_string),
                }),
                None => diagnostics.push(Diagnostic::lookup_miss(raw)),
            }
        }

        sentences.push(CitedSentence {
            text: sentence.to_string(),
            span: (m.start(), m.end()),
            citations,
        });
    }

    sentences
}

/// Builds the citing-statement index for every section of the tree.
///
/// Sentences are appended in document order; the same sentence is listed
/// again each time it occurs. Markers without a citation record are
/// dropped and reported.
///
/// # Examples
///
/// ```
/// use wikicite::{build_section_tree, extract_citations, link_statements};
///
/// let extraction = extract_citations("Paris is big.{{cite web|url=http://p.fr}}", true);
/// let root = build_section_tree(&extraction.text, true);
/// let (index, _) = link_statements(&root, &extraction.table);
/// assert_eq!(index[&0]["MAIN_SECTION"], vec!["Paris is big.{{0}}"]);
/// ```
pub fn link_statements(
    root: &Section,
    table: &CitationTable,
) -> (CitingStatements, Vec<Diagnostic>) {
    let mut index = CitingStatements::new();
    let mut diagnostics = Vec::new();

    for section in root.iter() {
        for paragraph in split_paragraphs(&section.text) {
            for sentence in find_cited_sentences(paragraph, table, &mut diagnostics) {
                for citation in &sentence.citations {
                    index
                        .entry(citation.marker)
                        .or_default()
                        .entry(section.label.clone())
                        .or_default()
                        .push(sentence.text.clone());
                }
            }
        }
    }

    tracing::debug!(
        cited_markers = index.len(),
        lookup_misses = diagnostics.len(),
        "linked citing statements"
    );

    (index, diagnostics)
}
