//! Document segmentation
//!
//! Turns extracted document text (or a pre-segmented structured document) into
//! an ordered list of [`Section`]s.

pub mod segmenter;
pub mod structured;

use thiserror::Error;

pub use segmenter::{clean_text, find_section, segment, Section, SPECIAL_HEADINGS};
pub use structured::sections_from_structured;

/// Result type alias for segmentation
pub type SectionResult<T> = Result<T, SectionError>;

/// Input errors raised while producing sections
#[derive(Error, Debug)]
pub enum SectionError {
    /// Structured document lacks an `input.sections` array
    #[error("Structured document has no input.sections list")]
    MissingStructuredSections,

    /// A structured section entry could not be read
    #[error("Invalid structured section at index {index}: {message}")]
    InvalidStructuredEntry { index: usize, message: String },

    /// Nothing usable was extracted from the document
    #[error("No sections could be extracted from the document")]
    NoSections,

    /// A requested section is not in the document
    #[error("Section not found: {name}")]
    NotFound { name: String },
}

/// Segment cleaned text, failing when no section survives.
pub fn sections_from_text(text: &str) -> SectionResult<Vec<Section>> {
    let sections = segment(&clean_text(text));
    if sections.is_empty() {
        return Err(SectionError::NoSections);
    }
    Ok(sections)
}

/// Resolve a requested section name against the document's sections.
pub fn require_section<'a>(sections: &'a [Section], name: &str) -> SectionResult<&'a Section> {
    find_section(sections, name).ok_or_else(|| SectionError::NotFound {
        name: name.to_string(),
    })
}
