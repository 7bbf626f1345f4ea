//! Heading-driven segmentation of extracted paper text.
//!
//! A heading is either a roman-numeral caption (`IV. RELATED WORK`) or one of
//! the special section names. Each accepted heading owns the text up to the
//! next accepted heading. Everything after `References` belongs to the
//! references section.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A labeled contiguous span of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text as it appears in the document.
    pub heading: String,
    /// Section body, including the heading line itself.
    pub content: String,
    /// Byte offset of the heading in the cleaned text.
    pub position: usize,
}

impl Section {
    pub fn new(heading: impl Into<String>, content: impl Into<String>, position: usize) -> Self {
        Self {
            heading: heading.into(),
            content: content.into(),
            position,
        }
    }
}

/// Special section names accepted as headings without a roman caption.
pub const SPECIAL_HEADINGS: &[&str] = &[
    "Abstract",
    "ABSTRACT",
    "Acknowledgments",
    "ACKNOWLEDGMENTS",
    "Acknowledgements",
    "ACKNOWLEDGEMENTS",
    "References",
    "REFERENCES",
];

/// Roman numeral caption at the start of a line, or a special heading
/// standing alone on its line.
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    let specials = SPECIAL_HEADINGS.join("|");
    Regex::new(&format!(
        r"(?m)^(?:[IVX]+\.[ \t]*[A-Z][A-Za-z \t]*|(?:{specials})[ \t\r]*$)"
    ))
    .expect("HEADING_RE regex should compile")
});

static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\]").expect("CITATION_RE regex should compile"));

/// All-caps word split by stray whitespace (`A BSTRACT`).
static SPLIT_CAPS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z])\s+([A-Z][a-z])").expect("SPLIT_CAPS_RE regex should compile")
});

static ROMAN_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([^I-Z])((?:IX|IV|V?I{1,3}|I[XV]|X{1,3}|VI{1,3})\.)")
        .expect("ROMAN_BREAK_RE regex should compile")
});

static ROMAN_GAP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([IVX]+)\.\s*([A-Z])").expect("ROMAN_GAP_RE regex should compile")
});

/// Whether a heading candidate is really a citation or a table caption.
fn is_rejected_heading(candidate: &str) -> bool {
    candidate.to_lowercase().contains("et al.")
        || CITATION_RE.is_match(candidate)
        || candidate.contains("TABLE")
}

fn is_references(heading: &str) -> bool {
    heading.eq_ignore_ascii_case("references")
}

/// Repair common PDF extraction artifacts before segmentation.
///
/// Joins all-caps words split by stray whitespace, moves roman numeral
/// captions onto their own line and normalises the gap after the numeral.
pub fn clean_text(text: &str) -> String {
    let text = SPLIT_CAPS_RE.replace_all(text, "${1}${2}");
    let text = ROMAN_BREAK_RE.replace_all(&text, "${1}\n${2}");
    let text = ROMAN_GAP_RE.replace_all(&text, "${1}. ${2}");
    text.into_owned()
}

/// Split document text into ordered sections.
///
/// Rules:
/// - candidates containing `et al.`, a bracketed numeric citation or `TABLE`
///   are not headings;
/// - a span containing a `TABLE` caption is merged into the previous section;
/// - once `References` is reached every later span is appended to it;
/// - empty spans are dropped.
pub fn segment(text: &str) -> Vec<Section> {
    let mut headings: Vec<(usize, String)> = HEADING_RE
        .find_iter(text)
        .filter_map(|m| {
            let heading = m.as_str().trim();
            let line = text[m.start()..].lines().next().unwrap_or_default();
            if heading.is_empty() || is_rejected_heading(line) {
                debug!(candidate = line, "Rejected heading candidate");
                return None;
            }
            Some((m.start(), heading.to_string()))
        })
        .collect();

    // Sentinel end-of-document marker, never emitted.
    headings.push((text.len(), String::new()));

    let mut sections: Vec<Section> = Vec::new();
    let mut references: Option<usize> = None;

    for window in headings.windows(2) {
        let (start, ref heading) = window[0];
        let end = window[1].0;
        let content = text[start..end].trim();

        if let Some(idx) = references {
            if !content.is_empty() {
                let refs = &mut sections[idx].content;
                refs.push('\n');
                refs.push_str(content);
            }
            continue;
        }

        if is_references(heading) {
            references = Some(sections.len());
            sections.push(Section::new(heading.clone(), content, start));
            continue;
        }

        if content.is_empty() {
            continue;
        }

        match sections.last_mut() {
            Some(previous) if content.contains("TABLE") => {
                previous.content.push('\n');
                previous.content.push_str(content);
            }
            _ => sections.push(Section::new(heading.clone(), content, start)),
        }
    }

    sections
}

/// Find a section by heading: exact match first, then case-insensitive
/// substring match.
pub fn find_section<'a>(sections: &'a [Section], name: &str) -> Option<&'a Section> {
    if let Some(exact) = sections.iter().find(|s| s.heading == name) {
        return Some(exact);
    }
    let needle = name.to_lowercase();
    sections
        .iter()
        .find(|s| s.heading.to_lowercase().contains(&needle))
}
