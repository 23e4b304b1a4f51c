//! Export module for rendering compiled content to output formats.
//!
//! Provides the `Exporter` trait and one implementation per format.
//!
//! # Architecture
//!
//! The `Exporter` trait uses a builder pattern:
//! - `new()` creates an exporter with default configuration
//! - `with_config()` allows customization
//! - `export()` writes to any `Write + Seek` destination
//!
//! Each exporter is an independent failure domain: it prepares its own
//! [`Manuscript`](crate::model::Manuscript), builds a fresh document and
//! either returns the whole output or an error naming itself.
//!
//! # Example
//!
//! ```
//! use quire::{CompiledContent, RawSection};
//! use quire::export::{Exporter, MarkdownExporter};
//!
//! let content = CompiledContent::new("Demo", "A. Writer")
//!     .with_section(RawSection::new("Opening", "Hello world.").numbered(1));
//!
//! let text = MarkdownExporter::new().render_string(&content)?;
//! assert!(text.contains("## Chapter 1: Opening"));
//! # Ok::<(), quire::Error>(())
//! ```

use std::fmt;
use std::io::{Cursor, Seek, Write};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::CompiledContent;

mod docx;
mod html;
mod pdf;
mod text;

pub use docx::{DocxConfig, DocxExporter};
pub use html::{HtmlConfig, HtmlExporter};
pub use pdf::{
    Anchor, DrawOp, Face, FontSet, Margins, MissingPage, PageCanvas, PageHandle, PageLayout,
    PaginatedDocument, PaperSize, PdfConfig, PdfExporter, TocSlot, paginate, win_ansi,
};
pub use text::{MarkdownConfig, MarkdownExporter};

/// Output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Paginated binary document with live page references.
    Pdf,
    /// Flow document (word-processor paragraphs and runs).
    Docx,
    /// Self-contained structured markup.
    Html,
    /// Plain text with lightweight anchors.
    Markdown,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Pdf, Format::Docx, Format::Html, Format::Markdown];

    pub fn mime_type(self) -> &'static str {
        match self {
            Format::Pdf => "application/pdf",
            Format::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Format::Html => "text/html; charset=utf-8",
            Format::Markdown => "text/markdown; charset=utf-8",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Docx => "docx",
            Format::Html => "html",
            Format::Markdown => "md",
        }
    }

    pub fn is_binary(self) -> bool {
        matches!(self, Format::Pdf | Format::Docx)
    }

    /// Guess the format from a file path's extension.
    pub fn from_path(path: &str) -> Option<Self> {
        let (_, ext) = path.rsplit_once('.')?;
        ext.parse().ok()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Pdf => "PDF",
            Format::Docx => "DOCX",
            Format::Html => "HTML",
            Format::Markdown => "Markdown",
        })
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Format::Pdf),
            "docx" => Ok(Format::Docx),
            "html" | "htm" => Ok(Format::Html),
            "md" | "markdown" | "txt" | "text" => Ok(Format::Markdown),
            other => Err(format!("unknown format: {other}")),
        }
    }
}

/// A finished document and its type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub format: Format,
    pub data: Vec<u8>,
}

impl RenderedDocument {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// The output as text, for the text formats.
    pub fn into_text(self) -> Option<String> {
        if self.format.is_binary() {
            return None;
        }
        String::from_utf8(self.data).ok()
    }
}

/// Trait for exporting compiled content to a specific format.
///
/// Exporters hold their configuration and never mutate the content.
pub trait Exporter {
    /// The format this exporter produces.
    const FORMAT: Format;

    /// Render the content into the provided writer.
    ///
    /// The writer can be:
    /// - `std::fs::File` for disk output
    /// - `std::io::Cursor<Vec<u8>>` for in-memory output
    /// - Any other type implementing `Write + Seek`
    ///
    /// On error nothing usable has been written.
    fn export<W: Write + Seek>(&self, content: &CompiledContent, writer: &mut W) -> Result<()>;

    /// Render the content into memory.
    fn render(&self, content: &CompiledContent) -> Result<RenderedDocument> {
        let mut cursor = Cursor::new(Vec::new());
        self.export(content, &mut cursor)?;
        Ok(RenderedDocument {
            format: Self::FORMAT,
            data: cursor.into_inner(),
        })
    }
}

/// Render with the default configuration of the given format.
pub fn render(content: &CompiledContent, format: Format) -> Result<RenderedDocument> {
    match format {
        Format::Pdf => PdfExporter::new().render(content),
        Format::Docx => DocxExporter::new().render(content),
        Format::Html => HtmlExporter::new().render(content),
        Format::Markdown => MarkdownExporter::new().render(content),
    }
}

/// Write a whole text buffer, wrapping I/O failures for `format`.
pub(crate) fn write_text<W: Write>(writer: &mut W, format: Format, text: &str) -> Result<()> {
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::render(format, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse_and_display() {
        assert_eq!("PDF".parse::<Format>(), Ok(Format::Pdf));
        assert_eq!("htm".parse::<Format>(), Ok(Format::Html));
        assert_eq!("txt".parse::<Format>(), Ok(Format::Markdown));
        assert!("odt".parse::<Format>().is_err());
        assert_eq!(Format::Docx.to_string(), "DOCX");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path("out/book.docx"), Some(Format::Docx));
        assert_eq!(Format::from_path("book"), None);
    }

    #[test]
    fn test_into_text_only_for_text_formats() {
        let doc = RenderedDocument {
            format: Format::Pdf,
            data: b"%PDF".to_vec(),
        };
        assert!(doc.into_text().is_none());

        let doc = RenderedDocument {
            format: Format::Html,
            data: b"<p>".to_vec(),
        };
        assert_eq!(doc.into_text().as_deref(), Some("<p>"));
    }
}
