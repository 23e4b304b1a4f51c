//! PDF exporter.
//!
//! Output is PDF 1.7 drawn with the standard 14 fonts, so nothing is embedded
//! and the file depends only on the content and the configuration. Layout is
//! done by [`paginate`] in two phases; [`writer`] turns the finished pages into
//! PDF objects.

mod layout;
mod metrics;
mod paginate;
mod writer;

use std::io::{Seek, Write};

pub use layout::{DrawOp, Margins, MissingPage, PageCanvas, PageHandle, PageLayout, PaperSize};
pub use metrics::{Face, FontSet, win_ansi};
pub use paginate::{Anchor, PaginatedDocument, TocSlot, paginate};

use crate::error::{Error, Result};
use crate::model::{CompiledContent, Manuscript, Markup};

use super::{Exporter, Format};

/// Configuration for PDF export.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub paper: PaperSize,
    pub margins: Margins,
    /// Line height as a multiple of the body font size.
    pub line_spacing: f32,
    /// Deflate content streams.
    pub compress: bool,
    /// Document title at the top of every page after the title page.
    pub running_header: bool,
    /// Centered page number at the bottom of every page after the title page.
    pub page_numbers: bool,
    /// Dot leaders between contents entries and their page numbers.
    pub toc_leaders: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            paper: PaperSize::Letter,
            margins: Margins::default(),
            line_spacing: 1.4,
            compress: true,
            running_header: true,
            page_numbers: true,
            toc_leaders: true,
        }
    }
}

/// Exporter for PDF output.
#[derive(Debug, Clone, Default)]
pub struct PdfExporter {
    config: PdfConfig,
}

impl PdfExporter {
    /// Create a new PdfExporter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a PdfExporter with the specified configuration.
    pub fn with_config(config: PdfConfig) -> Self {
        Self { config }
    }

    /// Lay out the content without writing any bytes.
    pub fn paginate(&self, content: &CompiledContent) -> Result<PaginatedDocument> {
        let manuscript = Manuscript::prepare(content, Markup::Plain)
            .map_err(|e| Error::structural(Format::Pdf, e))?;
        paginate(&manuscript, &self.config)
    }
}

impl Exporter for PdfExporter {
    const FORMAT: Format = Format::Pdf;

    fn export<W: Write + Seek>(&self, content: &CompiledContent, writer: &mut W) -> Result<()> {
        let doc = self.paginate(content)?;
        let bytes = writer::write_pdf(&doc, &self.config)?;
        writer
            .write_all(&bytes)
            .map_err(|e| Error::render(Format::Pdf, e))
    }
}
