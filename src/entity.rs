//! Entity documents: one processed article.
//!
//! An [`EntityDocument`] is built once from raw markup. The pipeline runs
//! the cleaners, the citation extractor, the section tree builder and the
//! statement linker in that order, each stage working on the finished
//! output of the previous one. After construction the document is
//! read-only apart from its category set.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::Serialize;

use crate::citation::{marker_numbers, CitationRecord, CitationTable};
use crate::config::Options;
use crate::diagnostic::Diagnostic;
use crate::extractor::extract_citations;
use crate::input::Article;
use crate::markup::clean_markup;
use crate::sections::{build_section_tree, Section, ROOT_LABEL};
use crate::statements::{link_statements, CitingStatements};

/// A processed article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDocument {
    title: String,
    #[serde(skip)]
    raw_content: String,
    /// Cleaned text with citations replaced by markers
    content: String,
    categories: BTreeSet<String>,
    sections: Section,
    citations: CitationTable,
    citing_statements: CitingStatements,
    diagnostics: Vec<Diagnostic>,
}

impl EntityDocument {
    /// Runs the pipeline over `raw` markup with the given options.
    ///
    /// # Examples
    ///
    /// ```
    /// use wikicite::{EntityDocument, Options};
    ///
    /// let raw = "Intro.<ref>http://x.com</ref>\n==History==\nOld.\n";
    /// let doc = EntityDocument::new("Example", raw, &Options::default());
    /// assert_eq!(doc.section_text("History"), Some("Old.\n"));
    /// assert_eq!(doc.citation(0).unwrap().url(), Some("http://x.com"));
    /// ```
    pub fn new(title: &str, raw: &str, options: &Options) -> Self {
        let span = tracing::debug_span!("entity", title);
        let _guard = span.enter();

        let cleaned = clean_markup(raw, options.clean_references);
        let mut diagnostics = cleaned.diagnostics;
        let mut content = cleaned.text;

        let mut citations = CitationTable::new();
        if options.extract_references {
            let extraction = extract_citations(&content, options.extract_broken_references);
            content = extraction.text;
            citations = extraction.table;
            diagnostics.extend(extraction.diagnostics);
        }

        // Without splitting, the whole text stays with the root section.
        let sections = if options.split_sections {
            build_section_tree(&content, options.main_sections_only)
        } else {
            Section {
                label: ROOT_LABEL.to_string(),
                level: 1,
                text: content.clone(),
                children: Vec::new(),
            }
        };

        let mut citing_statements = CitingStatements::new();
        if options.extract_statements {
            let (index, misses) = link_statements(&sections, &citations);
            citing_statements = index;
            diagnostics.extend(misses);
        }

        if !diagnostics.is_empty() {
            tracing::debug!(count = diagnostics.len(), "recovered from malformed markup");
        }

        EntityDocument {
            title: title.to_string(),
            raw_content: raw.to_string(),
            content,
            categories: cleaned.categories,
            sections,
            citations,
            citing_statements,
            diagnostics,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The markup exactly as it was given.
    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    /// The cleaned text, with citations replaced by markers when they were extracted.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The root of the section tree.
    pub fn root_section(&self) -> &Section {
        &self.sections
    }

    /// Finds a section by its exact label.
    pub fn section(&self, label: &str) -> Option<&Section> {
        self.sections.find(label)
    }

    pub fn has_section(&self, label: &str) -> bool {
        self.sections.contains(label)
    }

    /// The body text of a section, markers included.
    pub fn section_text(&self, label: &str) -> Option<&str> {
        self.section(label).map(|section| section.text.as_str())
    }

    /// All section labels in document order.
    pub fn section_labels(&self) -> Vec<&str> {
        self.sections.labels()
    }

    /// Section labels down to `max_level` (the root is level 1).
    pub fn section_labels_up_to(&self, max_level: usize) -> Vec<&str> {
        self.sections.labels_up_to(max_level)
    }

    pub fn citations(&self) -> &CitationTable {
        &self.citations
    }

    pub fn citation(&self, marker: usize) -> Option<&CitationRecord> {
        self.citations.get(marker)
    }

    /// The citations referenced from a section's text, by marker.
    pub fn section_citations(&self, label: &str) -> BTreeMap<usize, &CitationRecord> {
        let Some(section) = self.section(label) else {
            return BTreeMap::new();
        };
        marker_numbers(&section.text)
            .filter_map(|raw| self.citations.resolve(raw))
            .collect()
    }

    pub fn citing_statements(&self) -> &CitingStatements {
        &self.citing_statements
    }

    /// The sentences of one section that cite `marker`, in document order.
    pub fn citing_sentences(&self, marker: usize, section: &str) -> &[String] {
        self.citing_statements
            .get(&marker)
            .and_then(|sections| sections.get(section))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    pub fn add_category(&mut self, category: &str) {
        self.categories.insert(category.to_string());
    }

    pub fn set_categories(&mut self, categories: BTreeSet<String>) {
        self.categories = categories;
    }

    /// Conditions the pipeline recovered from while processing this article.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Processes a batch of articles in parallel. Each article runs its own
/// pipeline; results come back in input order.
pub fn process_batch(articles: &[Article], options: &Options) -> Vec<EntityDocument> {
    articles
        .par_iter()
        .map(|article| EntityDocument::new(&article.title, &article.content, options))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::CitationType;

    const ARTICLE: &str = "{{Infobox city\n| name = Paris\n| pop = {{formatnum:2100000}}\n}}\n\
'''Paris''' is the capital of France.<ref name=\"cap\"/>\n\
==Geography==\n\
Paris lies on the [[Seine|river Seine]].<ref>{{cite book|title=Rivers|publisher=Acme}}</ref>\n\
\n\
The city is flat{{cite web|url=http://geo.fr/paris|title=Terrain}}.\n\
===Climate===\n\
It rains often.<ref name=\"cap\">{{cite news|url=http://news.fr|title=Capital}}</ref>\n\
==See also==\n\
* [[Lyon]]\n\
[[Category:Capitals in Europe]]\n";

    fn full_options() -> Options {
        Options {
            clean_references: true,
            main_sections_only: false,
            extract_statements: true,
            ..Options::default()
        }
    }

    #[test]
    fn test_full_pipeline() {
        // Given: An article with an infobox, several citation idioms and sections
        // When: We process it with every stage on
        let doc = EntityDocument::new("Paris", ARTICLE, &full_options());

        // Then: The infobox and category are gone, anchors are resolved
        assert!(!doc.content().contains("Infobox"));
        assert!(doc.content().contains("river Seine"));
        assert!(doc.categories().contains("Capitals in Europe"));

        // Sections: See also is dropped
        assert_eq!(
            doc.section_labels(),
            vec!["MAIN_SECTION", "Geography", "Climate"]
        );
        assert_eq!(doc.section("Climate").unwrap().level, 3);
        assert!(!doc.has_section("See also"));

        // Citations: unnamed ref 0, reserved name 1, bare template 2
        assert_eq!(doc.citations().len(), 3);
        assert_eq!(doc.citation(0).unwrap().kind, CitationType::Book);
        assert_eq!(doc.citation(1).unwrap().kind, CitationType::News);
        assert_eq!(doc.citation(2).unwrap().kind, CitationType::Web);
        assert_eq!(
            doc.section_text("MAIN_SECTION"),
            Some("\n'''Paris''' is the capital of France.{{1}}\n")
        );

        // Statements
        assert_eq!(
            doc.citing_sentences(0, "Geography"),
            ["Paris lies on the river Seine.{{0}}"]
        );
        assert_eq!(doc.citing_sentences(2, "Geography"), ["The city is flat{{2}}."]);
        assert_eq!(doc.citing_sentences(1, "Climate"), ["It rains often.{{1}}"]);
        assert_eq!(
            doc.citing_sentences(1, "MAIN_SECTION"),
            ["'''Paris''' is the capital of France.{{1}}"]
        );
        assert!(doc.citing_sentences(1, "Geography").is_empty());

        // Template heads have no '=' and are reported, nothing else is
        assert_eq!(doc.diagnostics().len(), 3);
        assert!(doc.diagnostics().iter().all(|d| matches!(
            d,
            Diagnostic::AttributeMalformed { field } if field.starts_with("cite ")
        )));
    }

    #[test]
    fn test_default_options() {
        let doc = EntityDocument::new("Paris", ARTICLE, &Options::default());

        // Anchors stay, main sections only, no statements
        assert!(doc.content().contains("[[Seine|river Seine]]"));
        assert_eq!(doc.section_labels(), vec!["MAIN_SECTION", "Geography"]);
        assert!(doc.section_text("Geography").unwrap().contains("===Climate==="));
        assert!(doc.citing_statements().is_empty());
        assert_eq!(doc.citations().len(), 3);
    }

    #[test]
    fn test_extraction_off_keeps_markup() {
        let options = Options {
            extract_references: false,
            ..Options::default()
        };

        let doc = EntityDocument::new("Paris", ARTICLE, &options);

        assert!(doc.citations().is_empty());
        assert!(doc.content().contains("<ref name=\"cap\"/>"));
    }

    #[test]
    fn test_split_off_keeps_whole_text_in_root() {
        let options = Options {
            split_sections: false,
            ..Options::default()
        };

        let doc = EntityDocument::new("Paris", ARTICLE, &options);

        assert_eq!(doc.section_labels(), vec!["MAIN_SECTION"]);
        assert_eq!(doc.section_text("MAIN_SECTION"), Some(doc.content()));
    }

    #[test]
    fn test_section_citations() {
        let doc = EntityDocument::new("Paris", ARTICLE, &full_options());

        let geography = doc.section_citations("Geography");

        assert_eq!(geography.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert!(doc.section_citations("Nope").is_empty());
    }

    #[test]
    fn test_missing_section_lookups() {
        let doc = EntityDocument::new("Stub", "Just text.", &Options::default());

        assert_eq!(doc.section_text("History"), None);
        assert!(doc.section("History").is_none());
        assert!(doc.citing_sentences(0, "MAIN_SECTION").is_empty());
        assert_eq!(doc.section_text("MAIN_SECTION"), Some("Just text."));
    }

    #[test]
    fn test_categories_can_be_added() {
        let mut doc = EntityDocument::new("Stub", "[[Category:A]]", &Options::default());

        doc.add_category("B");

        assert_eq!(
            doc.categories().iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["A", "B"]
        );
        doc.set_categories(BTreeSet::new());
        assert!(doc.categories().is_empty());
    }

    #[test]
    fn test_process_batch_keeps_order() {
        let articles: Vec<Article> = (0..20)
            .map(|i| Article {
                title: format!("A{}", i),
                content: format!("Fact {}.<ref>http://{}.com</ref>", i, i),
            })
            .collect();

        let docs = process_batch(&articles, &Options::default());

        assert_eq!(docs.len(), 20);
        for (i, doc) in docs.iter().enumerate() {
            assert_eq!(doc.title(), format!("A{}", i));
            // Every document starts its own marker sequence
            assert_eq!(doc.citation(0).unwrap().url(), Some(format!("http://{}.com", i).as_str()));
        }
    }
}
