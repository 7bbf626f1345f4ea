//! Document loading.
//!
//! `.pdf` goes through text extraction, `.json` must be the pre-segmented
//! `input.sections` form, anything else is read as plain extracted text.

use std::path::Path;

use review_core::section::{sections_from_structured, sections_from_text, Section, SectionError};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to extract text from PDF: {0}")]
    Pdf(String),

    #[error("Invalid structured document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Section(#[from] SectionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Structured,
    Text,
}

impl DocumentKind {
    pub fn of(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("pdf") => DocumentKind::Pdf,
            Some("json") => DocumentKind::Structured,
            _ => DocumentKind::Text,
        }
    }
}

/// Load and segment a document into sections in document order.
pub fn load_sections(path: impl AsRef<Path>) -> Result<Vec<Section>, DocumentError> {
    let path = path.as_ref();
    let kind = DocumentKind::of(path);
    let sections = match kind {
        DocumentKind::Pdf => {
            let text =
                pdf_extract::extract_text(path).map_err(|e| DocumentError::Pdf(e.to_string()))?;
            sections_from_text(&text)?
        }
        DocumentKind::Structured => {
            let doc: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            sections_from_structured(&doc)?
        }
        DocumentKind::Text => sections_from_text(&std::fs::read_to_string(path)?)?,
    };
    info!(
        path = %path.display(),
        kind = ?kind,
        sections = sections.len(),
        "Document segmented"
    );
    Ok(sections)
}
