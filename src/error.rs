//! Error types for quire rendering.
//!
//! Two fatal classes exist. [`StructuralError`] means the input cannot form a
//! valid document at all; [`Error::Render`] wraps a failure from the layout or
//! packaging layer of one renderer. Recoverable problems are not errors; they
//! surface as [`Warning`] values on the prepared manuscript.

use std::fmt;

use thiserror::Error;

use crate::export::Format;

/// The input cannot be turned into a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("no renderable chapters after normalization")]
    NoChapters,

    #[error("document {0} is missing or blank")]
    MissingMetadata(&'static str),

    #[error(
        "table of contents list has {entries} entries but the document has {blocks} headed blocks ({chapters} chapters)"
    )]
    TocMismatch {
        entries: usize,
        blocks: usize,
        chapters: usize,
    },

    #[error("table of contents entry {0:?} has no matching heading")]
    UnresolvedTocEntry(String),
}

/// Errors returned by an exporter.
///
/// Every variant names the renderer it came from. A returned error always
/// means no document was produced.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{format} export aborted: {source}")]
    Structural {
        format: Format,
        #[source]
        source: StructuralError,
    },

    #[error("{format} render failed: {message}")]
    Render { format: Format, message: String },
}

impl Error {
    /// Attach the renderer name to a structural failure.
    pub fn structural(format: Format, source: StructuralError) -> Self {
        Error::Structural { format, source }
    }

    /// Wrap a drawing, packing or I/O failure from the given renderer.
    pub fn render(format: Format, err: impl fmt::Display) -> Self {
        Error::Render {
            format,
            message: err.to_string(),
        }
    }

    /// The renderer that produced this error.
    pub fn format(&self) -> Format {
        match self {
            Error::Structural { format, .. } | Error::Render { format, .. } => *format,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Content that was skipped instead of rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A section had no usable title and was dropped.
    UntitledSection { position: usize },
    /// A titled section had no body text and was dropped.
    EmptySection { title: String },
    /// An image could not be embedded by a binary renderer.
    UnembeddableImage { url: String, reason: String },
    /// Pre-formatted markup did not line up with the section list.
    FormattedContentMismatch { recovered: usize, expected: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UntitledSection { position } => {
                write!(f, "section {position} has no title and was dropped")
            }
            Warning::EmptySection { title } => {
                write!(f, "section {title:?} has no content and was dropped")
            }
            Warning::UnembeddableImage { url, reason } => {
                let shown: String = url.chars().take(48).collect();
                write!(f, "image {shown:?} skipped: {reason}")
            }
            Warning::FormattedContentMismatch {
                recovered,
                expected,
            } => write!(
                f,
                "formatted content has {recovered} chapters, expected {expected}; using section bodies"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_names_renderer() {
        let err = Error::render(Format::Docx, "zip write failed");
        assert_eq!(err.to_string(), "DOCX render failed: zip write failed");
        assert_eq!(err.format(), Format::Docx);
    }

    #[test]
    fn test_structural_error_names_renderer() {
        let err = Error::structural(Format::Pdf, StructuralError::NoChapters);
        assert_eq!(
            err.to_string(),
            "PDF export aborted: no renderable chapters after normalization"
        );
    }

    #[test]
    fn test_warning_truncates_long_urls() {
        let warning = Warning::UnembeddableImage {
            url: "x".repeat(200),
            reason: "not a data URL".to_string(),
        };
        assert!(warning.to_string().len() < 100);
    }
}
