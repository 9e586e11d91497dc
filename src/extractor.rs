//! Citation extractor.
//!
//! Rewrites every reference and citation idiom in article markup into a
//! numbered marker token (`{{0}}`, `{{1}}`, ...) and records what each marker
//! stands for in a [`CitationTable`]. The five idioms are handled by five
//! passes that always run in the order of [`Idiom::ORDER`]: each pass's
//! patterns assume the text produced by the passes before it.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::citation::{marker_token, CitationRecord, CitationTable};
use crate::diagnostic::Diagnostic;
use crate::output::{replace_spans, Replacement};
use crate::template::parse_template;

/// A heading-only line at the very start of the text.
static LEADING_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A={2,}.*?={2,}\n").expect("valid regex"));

/// `<ref>http://...</ref>` or `<ref>[http://... title]</ref>`
static BROKEN_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<ref>\[?htt.*?\]?</ref>").expect("valid regex"));

/// `<ref>...</ref>` without attributes
static UNNAMED_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<ref>(.*?)</ref>").expect("valid regex"));

/// `name=` attribute; the value is quoted or runs to whitespace, `/` or `>`
const REF_NAME: &str = r#"\s+name\s*=\s*("[^"]*"|'[^']*'|[^\s>/"']+)"#;

/// `<ref name="a"/>`; attributes after the name are ignored
static SELF_CLOSING_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"<ref(?:{})?(?:\s+[^>/]*)?\s*/>", REF_NAME)).expect("valid regex")
});

/// `<ref name="a">...</ref>`; attributes after the name are ignored
static NAMED_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"<ref(?:{})?(?:\s+[^>/]*)?>(.*?)</ref>", REF_NAME))
        .expect("valid regex")
});

/// `{{cite ...}}`, `{{Citation ...}}`; captures the text inside the braces.
static TEMPLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\{\{(Cit.*?)\}\}").expect("valid regex"));

/// One of the reference/citation markup shapes the extractor recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idiom {
    /// A reference holding only a raw link, no template
    BrokenReference,
    /// A reference without a name
    UnnamedReference,
    /// A named reference with no body, pointing at a definition elsewhere
    NamedSelfClosing,
    /// A named reference with a body
    NamedReference,
    /// A citation template outside any reference
    BareTemplate,
}

impl Idiom {
    /// The order the passes run in.
    pub const ORDER: [Idiom; 5] = [
        Idiom::BrokenReference,
        Idiom::UnnamedReference,
        Idiom::NamedSelfClosing,
        Idiom::NamedReference,
        Idiom::BareTemplate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Idiom::BrokenReference => "broken references",
            Idiom::UnnamedReference => "unnamed references",
            Idiom::NamedSelfClosing => "self-closing named references",
            Idiom::NamedReference => "named references",
            Idiom::BareTemplate => "bare templates",
        }
    }

    /// The stage reached once this pass has run.
    fn completes(self) -> Stage {
        match self {
            Idiom::BrokenReference => Stage::BrokenResolved,
            Idiom::UnnamedReference => Stage::BrokenResolved,
            Idiom::NamedSelfClosing => Stage::SelfCloseResolved,
            Idiom::NamedReference => Stage::NamedCiteResolved,
            Idiom::BareTemplate => Stage::FullyMarked,
        }
    }
}

/// How far the extractor has rewritten its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Raw,
    BrokenResolved,
    SelfCloseResolved,
    NamedCiteResolved,
    /// Every idiom has been replaced by a marker.
    FullyMarked,
}

/// Hands out marker ids: starts at 0, never rewinds, never reuses.
#[derive(Debug, Default)]
pub struct MarkerCounter {
    next: usize,
}

impl MarkerCounter {
    pub fn allocate(&mut self) -> usize {
        let marker = self.next;
        self.next += 1;
        marker
    }

    /// The id the next allocation will return.
    pub fn peek(&self) -> usize {
        self.next
    }
}

/// The output of a full extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// The text with every idiom replaced by a marker token
    pub text: String,
    pub table: CitationTable,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the five citation passes over one article.
#[derive(Debug)]
pub struct CitationExtractor {
    counter: MarkerCounter,
    table: CitationTable,
    /// Reference name -> marker, shared by the two named passes
    names: HashMap<String, usize>,
    diagnostics: Vec<Diagnostic>,
    stage: Stage,
    broken_references: bool,
}

/// Extracts all citations from `text`. See [`CitationExtractor`].
///
/// # Examples
///
/// ```
/// use wikicite::extract_citations;
///
/// let extraction = extract_citations("Fact.<ref>http://x.com</ref>", true);
/// assert_eq!(extraction.text, "Fact.{{0}}");
/// assert_eq!(extraction.table.get(0).unwrap().url(), Some("http://x.com"));
/// ```
pub fn extract_citations(text: &str, extract_broken_references: bool) -> Extraction {
    CitationExtractor::new(extract_broken_references).extract(text)
}

impl CitationExtractor {
    /// Creates an extractor. With `extract_broken_references` off the
    /// broken-reference pass is skipped and such references are handled
    /// as ordinary unnamed references.
    pub fn new(extract_broken_references: bool) -> Self {
        CitationExtractor {
            counter: MarkerCounter::default(),
            table: CitationTable::new(),
            names: HashMap::new(),
            diagnostics: Vec::new(),
            stage: Stage::Raw,
            broken_references: extract_broken_references,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Runs every pass in order and hands back the rewritten text and the
    /// finished table.
    pub fn extract(mut self, text: &str) -> Extraction {
        let mut text = LEADING_HEADING_RE.replace(text, "").into_owned();
        for idiom in Idiom::ORDER {
            text = self.run_pass(idiom, &text);
        }

        tracing::debug!(citations = self.table.len(), "extracted citations");

        Extraction {
            text,
            table: self.table,
            diagnostics: self.diagnostics,
        }
    }

    fn run_pass(&mut self, idiom: Idiom, text: &str) -> String {
        let before = self.counter.peek();
        let result = match idiom {
            Idiom::BrokenReference if !self.broken_references => text.to_string(),
            Idiom::BrokenReference => self.resolve_broken_references(text),
            Idiom::UnnamedReference => self.resolve_unnamed_references(text),
            Idiom::NamedSelfClosing => self.resolve_self_closing_references(text),
            Idiom::NamedReference => self.resolve_named_references(text),
            Idiom::BareTemplate => self.resolve_bare_templates(text),
        };
        self.stage = idiom.completes();

        tracing::debug!(
            pass = idiom.name(),
            new_markers = self.counter.peek() - before,
            stage = ?self.stage,
            "citation pass"
        );
        result
    }

    fn resolve_broken_references(&mut self, text: &str) -> String {
        let mut replacements = Vec::new();
        for m in BROKEN_REF_RE.find_iter(text) {
            let inner = &m.as_str()["<ref>".len()..m.as_str().len() - "</ref>".len()];
            let url: String = inner
                .chars()
                .filter(|c| !matches!(c, '{' | '}' | '[' | ']'))
                .collect();

            let marker = self.counter.allocate();
            self.table.insert(marker, CitationRecord::from_url(&url));
            replacements.push(Replacement {
                span: (m.start(), m.end()),
                text: marker_token(marker),
            });
        }
        replace_spans(text, &replacements)
    }

    fn resolve_unnamed_references(&mut self, text: &str) -> String {
        let mut replacements = Vec::new();
        for cap in UNNAMED_REF_RE.captures_iter(text) {
            let (Some(whole), Some(body)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let marker = self.counter.allocate();
            let record = self.record_from_body(body.as_str());
            self.table.insert(marker, record);
            replacements.push(Replacement {
                span: (whole.start(), whole.end()),
                text: marker_token(marker),
            });
        }
        replace_spans(text, &replacements)
    }

    fn resolve_self_closing_references(&mut self, text: &str) -> String {
        let mut replacements = Vec::new();
        for cap in SELF_CLOSING_REF_RE.captures_iter(text) {
            let Some(whole) = cap.get(0) else {
                continue;
            };
            let name = reference_name(cap.get(1).map_or("", |m| m.as_str()));
            let marker = match self.names.get(&name) {
                Some(&marker) => marker,
                None => {
                    // Reserved with an empty record until the definition shows up.
                    let marker = self.counter.allocate();
                    self.table.insert(marker, CitationRecord::placeholder());
                    if !name.is_empty() {
                        self.names.insert(name, marker);
                    }
                    marker
                }
            };
            replacements.push(Replacement {
                span: (whole.start(), whole.end()),
                text: marker_token(marker),
            });
        }
        replace_spans(text, &replacements)
    }

    fn resolve_named_references(&mut self, text: &str) -> String {
        let mut replacements = Vec::new();
        for cap in NAMED_REF_RE.captures_iter(text) {
            let (Some(whole), Some(body)) = (cap.get(0), cap.get(2)) else {
                continue;
            };
            let name = reference_name(cap.get(1).map_or("", |m| m.as_str()));
            let marker = match self.names.get(&name) {
                Some(&marker) => marker,
                None => {
                    let marker = self.counter.allocate();
                    if !name.is_empty() {
                        self.names.insert(name, marker);
                    }
                    marker
                }
            };
            let record = self.record_from_body(body.as_str());
            self.table.insert(marker, record);
            replacements.push(Replacement {
                span: (whole.start(), whole.end()),
                text: marker_token(marker),
            });
        }
        replace_spans(text, &replacements)
    }

    fn resolve_bare_templates(&mut self, text: &str) -> String {
        let mut replacements = Vec::new();
        for cap in TEMPLATE_RE.captures_iter(text) {
            let (Some(whole), Some(inner)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let marker = self.counter.allocate();
            let parsed = parse_template(inner.as_str());
            self.diagnostics.extend(parsed.diagnostics);
            self.table.insert(marker, parsed.record);
            replacements.push(Replacement {
                span: (whole.start(), whole.end()),
                text: marker_token(marker),
            });
        }
        replace_spans(text, &replacements)
    }

    /// Builds a record from a reference body: the first citation template
    /// inside it if there is one, else the whole body without braces.
    fn record_from_body(&mut self, body: &str) -> CitationRecord {
        let parsed = match TEMPLATE_RE.captures(body).and_then(|cap| cap.get(1)) {
            Some(inner) => parse_template(inner.as_str()),
            None => parse_template(&body.replace(['{', '}'], "")),
        };
        self.diagnostics.extend(parsed.diagnostics);
        parsed.record
    }
}

/// Normalizes a reference name: quotes removed, whitespace trimmed.
fn reference_name(raw: &str) -> String {
    raw.replace(['"', '\''], "").trim().to_string()
}
