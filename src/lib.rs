//! wikicite: split wiki articles into sections and index their citations.
//!
//! This library provides functionality to:
//! - Clean article markup (infoboxes, categories, file and link anchors)
//! - Replace every reference and citation template with a numbered marker
//!   and parse what each marker cites
//! - Build the section tree of an article
//! - Link cited sentences to their citations, per section

pub mod citation;
pub mod config;
pub mod diagnostic;
pub mod entity;
pub mod extractor;
pub mod input;
pub mod markup;
pub mod output;
pub mod quality;
pub mod sections;
pub mod statements;
pub mod template;

pub use citation::{CitationRecord, CitationTable, CitationType};
pub use config::{load_options, ConfigError, Options};
pub use diagnostic::Diagnostic;
pub use entity::{process_batch, EntityDocument};
pub use extractor::{extract_citations, CitationExtractor, Extraction};
pub use input::{load_articles, parse_articles, Article, InputError, InputFormat};
pub use markup::clean_markup;
pub use output::{render_outline, strip_markers};
pub use quality::{sections_with_issue, QualityIssue};
pub use sections::{build_section_tree, Section};
pub use statements::{cited_sentences, link_statements, CitingStatements};
pub use template::parse_template;
