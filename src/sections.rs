//! Section tree builder.
//!
//! Splits article text into a hierarchy of labeled sections using the
//! `==Heading==` markers. Headings are flat in the markup, so each new
//! section's parent is found by searching backwards through the sections
//! seen so far.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Label of the synthetic root section holding the article's lead text.
pub const ROOT_LABEL: &str = "MAIN_SECTION";

/// Sections whose label contains one of these (case-insensitively) are dropped.
const DROPPED_SECTIONS: [&str; 3] = ["references", "notes", "see also"];

/// `==Label==` at any depth >= 2, including the newline that ends it.
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(={2,})([^=\n][^\n]*?)(={2,})[ \t]*(?:\r?\n)?").expect("valid regex")
});

/// A labeled section and its subsections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub label: String,
    pub level: usize,
    /// The text between this section's heading and the next heading
    pub text: String,
    /// Subsections, in document order
    pub children: Vec<Section>,
}

impl Section {
    fn new(label: &str, level: usize) -> Self {
        Section {
            label: label.to_string(),
            level,
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Finds the first section (in document order) with exactly this label.
    pub fn find(&self, label: &str) -> Option<&Section> {
        self.iter().find(|section| section.label == label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.find(label).is_some()
    }

    /// Iterates over this section and all its descendants in document order.
    pub fn iter(&self) -> SectionIter<'_> {
        SectionIter { stack: vec![self] }
    }

    /// Labels of every section in document order, with repeats removed.
    pub fn labels(&self) -> Vec<&str> {
        self.labels_up_to(usize::MAX)
    }

    /// Labels of every section at or above `max_level`, in document order,
    /// with repeats removed.
    pub fn labels_up_to(&self, max_level: usize) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for section in self.iter().filter(|s| s.level <= max_level) {
            if !labels.contains(&section.label.as_str()) {
                labels.push(&section.label);
            }
        }
        labels
    }
}

/// Pre-order iterator over a section tree.
pub struct SectionIter<'a> {
    stack: Vec<&'a Section>,
}

impl<'a> Iterator for SectionIter<'a> {
    type Item = &'a Section;

    fn next(&mut self) -> Option<Self::Item> {
        let section = self.stack.pop()?;
        self.stack.extend(section.children.iter().rev());
        Some(section)
    }
}

/// A heading found during the scan, before it is attached to the tree.
struct Heading<'t> {
    label: &'t str,
    raw_level: usize,
    body_start: usize,
}

/// A section under construction; `parent` indexes into the node list.
struct Node {
    section: Section,
    parent: usize,
}

/// Builds the section tree of `text`.
///
/// With `main_sections_only` only `==Heading==` is recognized; otherwise
/// any depth from `==` up. A heading's raw level is half its number of
/// `=`. Each section's parent is the nearest preceding section whose level
/// is at most the raw level minus one, or the root when there is none; its
/// level is the parent's level plus one.
///
/// The text before the first heading becomes the root's body. Sections
/// labeled like "References", "Notes" or "See also" are dropped together
/// with their deeper subsections.
///
/// # Examples
///
/// ```
/// use wikicite::build_section_tree;
///
/// let root = build_section_tree("Intro\n==History==\nOld.\n", true);
/// assert_eq!(root.label, "MAIN_SECTION");
/// assert_eq!(root.children[0].label, "History");
/// assert_eq!(root.children[0].text, "Old.\n");
/// ```
pub fn build_section_tree(text: &str, main_sections_only: bool) -> Section {
    let mut nodes = vec![Node {
        section: Section::new(ROOT_LABEL, 1),
        parent: 0,
    }];
    // (level, node index) of every attached section, in document order
    let mut seen: Vec<(usize, usize)> = vec![(1, 0)];
    let mut dropped_level: Option<usize> = None;
    let mut previous: Option<Heading> = None;
    let mut lead_end = text.len();

    for cap in HEADING_RE.captures_iter(text) {
        let (Some(whole), Some(open), Some(label), Some(close)) =
            (cap.get(0), cap.get(1), cap.get(2), cap.get(3))
        else {
            continue;
        };
        if main_sections_only && (open.len() != 2 || close.len() != 2) {
            continue;
        }

        match previous.take() {
            Some(heading) => {
                let body = &text[heading.body_start..whole.start()];
                attach(&mut nodes, &mut seen, &mut dropped_level, heading, body);
            }
            None => lead_end = whole.start(),
        }

        previous = Some(Heading {
            label: label.as_str().trim(),
            raw_level: (open.len() + close.len()) / 2,
            body_start: whole.end(),
        });
    }

    nodes[0].section.text = text[..lead_end].to_string();
    if let Some(heading) = previous {
        let body = &text[heading.body_start..];
        attach(&mut nodes, &mut seen, &mut dropped_level, heading, body);
    }

    tracing::debug!(sections = nodes.len(), main_sections_only, "built section tree");

    assemble(nodes)
}

fn attach(
    nodes: &mut Vec<Node>,
    seen: &mut Vec<(usize, usize)>,
    dropped_level: &mut Option<usize>,
    heading: Heading,
    body: &str,
) {
    if let Some(level) = *dropped_level {
        if heading.raw_level > level {
            return;
        }
        *dropped_level = None;
    }
    if is_dropped(heading.label) {
        *dropped_level = Some(heading.raw_level);
        return;
    }

    let parent = find_parent(seen, heading.raw_level);
    let level = nodes[parent].section.level + 1;

    let mut section = Section::new(heading.label, level);
    section.text = body.to_string();
    nodes.push(Node { section, parent });
    seen.push((level, nodes.len() - 1));
}

/// Scans backwards for the nearest section with level <= `raw_level - 1`.
fn find_parent(seen: &[(usize, usize)], raw_level: usize) -> usize {
    seen.iter()
        .rev()
        .find(|(level, _)| *level < raw_level)
        .map(|(_, index)| *index)
        .unwrap_or(0)
}

fn is_dropped(label: &str) -> bool {
    let label = label.to_lowercase();
    DROPPED_SECTIONS.iter().any(|name| label.contains(name))
}

/// Turns the flat node list into an owned tree. Children always come after
/// their parent, so walking backwards attaches every subtree before its
/// parent is moved.
fn assemble(nodes: Vec<Node>) -> Section {
    let mut parents = Vec::with_capacity(nodes.len());
    let mut slots: Vec<Option<Section>> = Vec::with_capacity(nodes.len());
    for node in nodes {
        parents.push(node.parent);
        slots.push(Some(node.section));
    }

    for index in (1..slots.len()).rev() {
        let Some(mut section) = slots[index].take() else {
            continue;
        };
        section.children.reverse();
        if let Some(parent) = slots[parents[index]].as_mut() {
            parent.children.push(section);
        }
    }

    let mut root = slots
        .into_iter()
        .next()
        .flatten()
        .unwrap_or_else(|| Section::new(ROOT_LABEL, 1));
    root.children.reverse();
    root
}
