//! Quality tags carried by an article's markup.
//!
//! Tags are looked up in the document's cleaned content, so tags inside a
//! removed infobox do not count. Matching ignores case.

use std::collections::BTreeSet;

use crate::entity::EntityDocument;

const FEATURED_TAGS: [&str; 5] = [
    "{{featured article}}",
    "{{featured list}}",
    "{{featured portal}}",
    "{{spoken wikipedia}}",
    "{{spoken wikipedia boilerplate}}",
];

const GOOD_ARTICLE_TAG: &str = "{{good article}}";

const DELETION_TAGS: [&str; 2] = ["{{cleanup", "{{afd"];

/// A maintenance tag marking a problem with some or all of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityIssue {
    /// `{{POV...}}`: not neutral
    PointOfView,
    /// `{{Unbalanced...}}`
    Unbalanced,
    /// `{{Contradict...}}`
    Contradictory,
    /// `{{Confusing...}}`
    Confusing,
    /// `{{Disputed...}}`: factual accuracy disputed
    Disputed,
}

impl QualityIssue {
    pub const ALL: [QualityIssue; 5] = [
        QualityIssue::PointOfView,
        QualityIssue::Unbalanced,
        QualityIssue::Contradictory,
        QualityIssue::Confusing,
        QualityIssue::Disputed,
    ];

    /// The opening of the tag, lower-cased. Variants such as `{{POV-section}}` match too.
    pub fn tag(self) -> &'static str {
        match self {
            QualityIssue::PointOfView => "{{pov",
            QualityIssue::Unbalanced => "{{unbalanced",
            QualityIssue::Contradictory => "{{contradict",
            QualityIssue::Confusing => "{{confusing",
            QualityIssue::Disputed => "{{disputed",
        }
    }
}

fn contains_tag(text: &str, tag: &str) -> bool {
    text.to_lowercase().contains(tag)
}

/// Featured content: featured article, list or portal, or spoken article.
pub fn is_featured_article(doc: &EntityDocument) -> bool {
    let content = doc.content().to_lowercase();
    FEATURED_TAGS.iter().any(|tag| content.contains(tag))
}

pub fn is_good_article(doc: &EntityDocument) -> bool {
    contains_tag(doc.content(), GOOD_ARTICLE_TAG)
}

/// Marked for cleanup or nominated for deletion.
pub fn is_marked_for_deletion(doc: &EntityDocument) -> bool {
    let content = doc.content().to_lowercase();
    DELETION_TAGS.iter().any(|tag| content.contains(tag))
}

/// Returns the labels of the sections whose text carries `issue`, or
/// `None` when the article does not carry it anywhere.
///
/// An empty set means the tag is in the article but in no section's text,
/// which happens when sections were not split.
pub fn sections_with_issue(doc: &EntityDocument, issue: QualityIssue) -> Option<BTreeSet<String>> {
    if !contains_tag(doc.content(), issue.tag()) {
        return None;
    }

    Some(
        doc.root_section()
            .iter()
            .filter(|section| contains_tag(&section.text, issue.tag()))
            .map(|section| section.label.clone())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;

    fn doc(raw: &str) -> EntityDocument {
        EntityDocument::new("Test", raw, &Options::default())
    }

    #[test]
    fn test_featured_and_good() {
        assert!(is_featured_article(&doc("Text.\n{{Featured article}}")));
        assert!(is_featured_article(&doc("{{Spoken Wikipedia}}")));
        assert!(!is_featured_article(&doc("{{Good article}}")));
        assert!(is_good_article(&doc("{{Good article}}")));
        assert!(!is_good_article(&doc("A good article.")));
    }

    #[test]
    fn test_marked_for_deletion() {
        assert!(is_marked_for_deletion(&doc("{{Cleanup|date=May 2017}}\nText")));
        assert!(is_marked_for_deletion(&doc("{{AfD|Example}}")));
        assert!(!is_marked_for_deletion(&doc("Clean text.")));
    }

    #[test]
    fn test_sections_with_issue() {
        // Given: An article with two sections, one tagged as disputed
        let raw = "Lead.\n==History==\n{{Disputed section|date=2017}}\nOld.\n==Legacy==\nNew.\n";

        // When: We look for disputed sections
        let sections = sections_with_issue(&doc(raw), QualityIssue::Disputed);

        // Then: Only History is reported
        assert_eq!(sections, Some(BTreeSet::from(["History".to_string()])));
    }

    #[test]
    fn test_issue_not_carried() {
        let article = doc("Lead.\n==History==\nOld.\n");

        for issue in QualityIssue::ALL {
            assert_eq!(sections_with_issue(&article, issue), None);
        }
    }

    #[test]
    fn test_issue_in_lead_reports_root() {
        let sections = sections_with_issue(
            &doc("{{POV|date=2019}}\nLead.\n==A==\na"),
            QualityIssue::PointOfView,
        );

        assert_eq!(sections, Some(BTreeSet::from(["MAIN_SECTION".to_string()])));
    }
}
