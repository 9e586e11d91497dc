//! Citation records, the marker-indexed citation table, and marker tokens.
//!
//! Every citation found in an article is replaced by a marker token such as
//! `{{3}}` and described by a [`CitationRecord`] stored under that marker in a
//! [`CitationTable`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Matches a marker token and captures its numeric part.
pub(crate) static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([0-9]+)\}\}").expect("valid regex"));

/// Formats the marker token for a citation id, e.g. `{{0}}`.
pub fn marker_token(marker: usize) -> String {
    format!("{{{{{}}}}}", marker)
}

/// The closed vocabulary of citation template kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CitationType {
    AlbumNotes,
    AvMedia,
    Book,
    Comic,
    Conference,
    Court,
    Encyclopedia,
    Episode,
    Journal,
    MailingList,
    Map,
    News,
    Newsgroup,
    PressRelease,
    Thesis,
    VideoGame,
    Web,
    /// The template kind is missing or not part of the vocabulary.
    NotAvailable,
}

impl CitationType {
    /// Every recognized kind, in vocabulary order.
    pub const ALL: [CitationType; 17] = [
        CitationType::AlbumNotes,
        CitationType::AvMedia,
        CitationType::Book,
        CitationType::Comic,
        CitationType::Conference,
        CitationType::Court,
        CitationType::Encyclopedia,
        CitationType::Episode,
        CitationType::Journal,
        CitationType::MailingList,
        CitationType::Map,
        CitationType::News,
        CitationType::Newsgroup,
        CitationType::PressRelease,
        CitationType::Thesis,
        CitationType::VideoGame,
        CitationType::Web,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CitationType::AlbumNotes => "album notes",
            CitationType::AvMedia => "av media",
            CitationType::Book => "book",
            CitationType::Comic => "comic",
            CitationType::Conference => "conference",
            CitationType::Court => "court",
            CitationType::Encyclopedia => "encyclopedia",
            CitationType::Episode => "episode",
            CitationType::Journal => "journal",
            CitationType::MailingList => "mailing list",
            CitationType::Map => "map",
            CitationType::News => "news",
            CitationType::Newsgroup => "newsgroup",
            CitationType::PressRelease => "press release",
            CitationType::Thesis => "thesis",
            CitationType::VideoGame => "video game",
            CitationType::Web => "web",
            CitationType::NotAvailable => "N/A",
        }
    }

    /// Looks up a kind by name, ignoring case and surrounding whitespace.
    /// Anything outside the vocabulary yields [`CitationType::NotAvailable`].
    pub fn from_name(name: &str) -> CitationType {
        let name = name.trim().to_lowercase();
        CitationType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .unwrap_or(CitationType::NotAvailable)
    }
}

impl fmt::Display for CitationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CitationType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The resolved attributes and classified type of one citation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationRecord {
    /// Free-form template fields (keys case-preserved, values lower-cased)
    pub attributes: BTreeMap<String, String>,
    /// The classified template kind
    pub kind: CitationType,
}

impl CitationRecord {
    /// A record with no attributes, used for reserved names whose content
    /// has not been seen yet.
    pub fn placeholder() -> Self {
        CitationRecord {
            attributes: BTreeMap::new(),
            kind: CitationType::NotAvailable,
        }
    }

    /// A record for a reference that only carries a raw link.
    pub fn from_url(url: &str) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert("url".to_string(), url.to_string());
        CitationRecord {
            attributes,
            kind: CitationType::NotAvailable,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn url(&self) -> Option<&str> {
        self.get("url")
    }

    /// Returns the host the citation's url points to, lower-cased and
    /// without scheme or `www.` prefix, or `"N/A"` when there is none.
    ///
    /// Only the first whitespace-delimited token of the url is considered,
    /// so the `" (web)"` suffix added by the attribute parser is ignored.
    pub fn domain(&self) -> String {
        self.url()
            .and_then(|url| url.split_whitespace().next())
            .map(url_domain)
            .unwrap_or_else(|| "N/A".to_string())
    }
}

fn url_domain(url: &str) -> String {
    let rest = if let Some(rest) = url.strip_prefix("http://") {
        rest
    } else if let Some(rest) = url.strip_prefix("https://") {
        rest
    } else if url.starts_with("www.") {
        url
    } else {
        return "N/A".to_string();
    };

    let host = rest.split('/').next().unwrap_or_default().trim().to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.is_empty() {
        "N/A".to_string()
    } else {
        host.to_string()
    }
}

/// All citations of one article, keyed by marker id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CitationTable {
    records: BTreeMap<usize, CitationRecord>,
}

impl CitationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, marker: usize) -> Option<&CitationRecord> {
        self.records.get(&marker)
    }

    pub fn contains(&self, marker: usize) -> bool {
        self.records.contains_key(&marker)
    }

    /// Stores a record under a marker, replacing any previous one.
    pub fn insert(&mut self, marker: usize, record: CitationRecord) {
        self.records.insert(marker, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over records in marker order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &CitationRecord)> {
        self.records.iter().map(|(marker, record)| (*marker, record))
    }

    /// Resolves a raw marker number (as found between the braces of a token).
    /// Malformed numbers resolve to nothing.
    pub fn resolve(&self, raw: &str) -> Option<(usize, &CitationRecord)> {
        let marker = raw.parse::<usize>().ok()?;
        self.get(marker).map(|record| (marker, record))
    }
}

/// Returns the raw numbers of every marker token in `text`, in order.
pub(crate) fn marker_numbers(text: &str) -> impl Iterator<Item = &str> {
    MARKER_RE
        .captures_iter(text)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_token_format() {
        assert_eq!(marker_token(0), "{{0}}");
        assert_eq!(marker_token(42), "{{42}}");
    }

    #[test]
    fn test_citation_type_from_name() {
        assert_eq!(CitationType::from_name("web"), CitationType::Web);
        assert_eq!(CitationType::from_name(" Press Release "), CitationType::PressRelease);
        assert_eq!(CitationType::from_name("AV MEDIA"), CitationType::AvMedia);
        assert_eq!(CitationType::from_name("tweet"), CitationType::NotAvailable);
        assert_eq!(CitationType::from_name(""), CitationType::NotAvailable);
    }

    #[test]
    fn test_vocabulary_round_trips_through_names() {
        for kind in CitationType::ALL {
            assert_eq!(CitationType::from_name(kind.as_str()), kind);
        }
        assert_eq!(CitationType::NotAvailable.to_string(), "N/A");
    }

    #[test]
    fn test_domain_strips_scheme_and_www() {
        let record = CitationRecord::from_url("https://www.Example.org/path/page.html");
        assert_eq!(record.domain(), "example.org");
    }

    #[test]
    fn test_domain_ignores_type_suffix() {
        let record = CitationRecord::from_url("http://y.com (web)");
        assert_eq!(record.domain(), "y.com");
    }

    #[test]
    fn test_domain_without_scheme() {
        let record = CitationRecord::from_url("www.news.com/story");
        assert_eq!(record.domain(), "news.com");
        assert_eq!(CitationRecord::from_url("ftp://files").domain(), "N/A");
        assert_eq!(CitationRecord::placeholder().domain(), "N/A");
    }

    #[test]
    fn test_table_resolve() {
        let mut table = CitationTable::new();
        table.insert(2, CitationRecord::from_url("http://x.com"));

        assert!(table.resolve("2").is_some());
        assert!(table.resolve("3").is_none());
        assert!(table.resolve("99999999999999999999999999").is_none());
    }

    #[test]
    fn test_marker_numbers_in_order() {
        let numbers: Vec<_> = marker_numbers("a{{1}} b{{20}}{{3}} {4}").collect();
        assert_eq!(numbers, vec!["1", "20", "3"]);
    }
}
