//! Pre-segmented documents.
//!
//! A structured document carries its sections directly:
//!
//! ```json
//! { "input": { "sections": [ { "heading": "Abstract", "text": "..." } ] } }
//! ```
//!
//! The segmenter is not run on such input.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{Section, SectionError, SectionResult};

#[derive(Debug, Deserialize)]
struct StructuredEntry {
    heading: String,
    #[serde(default)]
    text: String,
}

/// Read the `input.sections` list of a structured document.
///
/// Entries with blank text are skipped. `position` is the entry index.
pub fn sections_from_structured(doc: &Value) -> SectionResult<Vec<Section>> {
    let entries = doc
        .get("input")
        .and_then(|input| input.get("sections"))
        .and_then(Value::as_array)
        .ok_or(SectionError::MissingStructuredSections)?;

    let mut sections = Vec::with_capacity(entries.len());
    for (index, raw) in entries.iter().enumerate() {
        let entry: StructuredEntry = serde_json::from_value(raw.clone())
            .map_err(|e| SectionError::InvalidStructuredEntry {
                index,
                message: e.to_string(),
            })?;
        if entry.text.trim().is_empty() {
            warn!(heading = %entry.heading, "Skipping structured section with empty text");
            continue;
        }
        sections.push(Section::new(entry.heading, entry.text, index));
    }

    if sections.is_empty() {
        return Err(SectionError::NoSections);
    }
    Ok(sections)
}
