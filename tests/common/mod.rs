//! Shared test constants and helpers for integration tests.

#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

/// A small article using every citation idiom, two heading depths, an
/// infobox, a category and a dropped "References" section.
///
/// With default options it yields the sections `MAIN_SECTION` and `History`
/// and four citations:
/// - 0: broken reference to `http://a.com`
/// - 1: unnamed reference, `cite news`
/// - 2: named reference `src`, `cite book`, cited twice
/// - 3: bare `cite web` template
pub const SAMPLE_ARTICLE: &str = "{{Infobox settlement\n| name = Ulm\n}}\n\
Ulm is a city.<ref>http://a.com</ref> It lies on the Danube.<ref>{{cite news|title=River}}</ref>\n\
==History==\n\
It was founded early.<ref name=\"src\"/>\n\
\n\
===Middle Ages===\n\
Trade grew.<ref name=\"src\">{{cite book|title=Chronicle|year=1850}}</ref>\n\
\n\
The minster was built{{cite web|url=http://www.Minster.de/history|title=Minster}}.\n\
==References==\n\
{{reflist}}\n\
[[Category:Cities in Germany]]\n";

/// Creates a temporary file with the given content and extension.
pub fn create_temp_file(content: &str, extension: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(extension)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Builds JSONL content with one article per line.
pub fn build_jsonl(articles: &[(&str, &str)]) -> String {
    articles
        .iter()
        .map(|(title, content)| {
            serde_json::json!({ "title": title, "content": content }).to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
