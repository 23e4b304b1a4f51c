//! # quire
//!
//! Deterministic book rendering: one compiled document model in, a PDF, DOCX,
//! HTML or Markdown document out.
//!
//! ## Features
//!
//! - One shared pipeline (normalize, sanitize, typography, table of contents)
//!   so every format shows the same chapters under the same headings
//! - PDF with a contents page whose page numbers are resolved after layout
//! - DOCX with bookmarked headings, linked contents and inline images
//! - Self-contained HTML and Markdown-flavoured plain text
//!
//! ## Quick Start
//!
//! ```
//! use quire::{CompiledContent, Format, RawSection, render};
//!
//! let content = CompiledContent::new("Demo", "A. Writer").with_section(
//!     RawSection::new("Opening", "Hello world.\n\nSecond paragraph.").numbered(1),
//! );
//!
//! let pdf = render(&content, Format::Pdf)?;
//! assert_eq!(pdf.mime_type(), "application/pdf");
//!
//! let text = render(&content, Format::Markdown)?.into_text().unwrap();
//! assert!(text.contains("## Chapter 1: Opening"));
//! # Ok::<(), quire::Error>(())
//! ```
//!
//! ## Input
//!
//! [`CompiledContent`] deserializes from the camelCase JSON produced upstream:
//!
//! ```
//! use quire::CompiledContent;
//!
//! let content: CompiledContent = serde_json::from_str(r#"{
//!     "title": "Demo",
//!     "author": "A. Writer",
//!     "sections": [{"title": "Opening", "content": "Hello.", "chapterNumber": 1}],
//!     "structural": {}
//! }"#).unwrap();
//! assert_eq!(content.sections.len(), 1);
//! ```

pub mod error;
pub mod export;
pub mod model;
pub mod pipeline;

pub use error::{Error, Result, StructuralError, Warning};
pub use export::{
    DocxConfig, DocxExporter, Exporter, Format, HtmlConfig, HtmlExporter, MarkdownConfig,
    MarkdownExporter, PdfConfig, PdfExporter, RenderedDocument, render,
};
pub use model::{
    Assets, AuthorPosition, Block, BlockKind, CompiledContent, CoverAsset, FontSizeToken,
    ImageAsset, Manuscript, Markup, RawSection, SectionBody, Structural, SubChapter,
    TypographyPrefs, UserInput,
};
