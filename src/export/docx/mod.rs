//! DOCX exporter.
//!
//! Writes a WordprocessingML package: a title page, a contents list of
//! internal hyperlinks, then one bookmarked `Heading1` per block followed by
//! its paragraphs. The consuming word processor does the pagination.
//!
//! Chapter bodies come from the manuscript, or from the upstream formatter's
//! pre-rendered markup when the content carries it and its chapters line up
//! with the manuscript.

mod formatted;
mod media;
mod parts;

use std::io::{Seek, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::{Error, Result, Warning};
use crate::model::{BlockKind, CompiledContent, ImageAsset, Manuscript, Markup};
use crate::pipeline::{Span, SpanStyle, parse_spans, sanitize};

use self::formatted::recover_chapters;
use self::media::decode_data_url;
use self::parts::{BodyWriter, MediaEntry, bookmark_name};
use super::{Exporter, Format};

/// Configuration for DOCX export.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct DocxConfig {
    /// Deflate level for package parts (0-9, default 6).
    pub compression_level: Option<u32>,
    /// Start every block on a new page.
    pub page_break_between_blocks: bool,
    /// Widest an inline image may be drawn, in EMU.
    pub max_image_width_emu: u64,
}

impl Default for DocxConfig {
    fn default() -> Self {
        Self {
            compression_level: None,
            page_break_between_blocks: true,
            // Six inches: the text width of a Letter page with 1" margins.
            max_image_width_emu: 6 * 914_400,
        }
    }
}

/// Exporter for DOCX output.
///
/// # Example
///
/// ```
/// use quire::{CompiledContent, RawSection};
/// use quire::export::{DocxExporter, Exporter};
///
/// let content = CompiledContent::new("Demo", "A. Writer")
///     .with_section(RawSection::new("Opening", "Hello world.").numbered(1));
/// let doc = DocxExporter::new().render(&content)?;
/// assert!(doc.data.starts_with(b"PK"));
/// # Ok::<(), quire::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocxExporter {
    config: DocxConfig,
}

impl DocxExporter {
    /// Create a new DocxExporter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a DocxExporter with the specified configuration.
    pub fn with_config(config: DocxConfig) -> Self {
        Self { config }
    }
}

impl Exporter for DocxExporter {
    const FORMAT: Format = Format::Docx;

    fn export<W: Write + Seek>(&self, content: &CompiledContent, writer: &mut W) -> Result<()> {
        let mut manuscript = Manuscript::prepare(content, Markup::Rich)
            .map_err(|e| Error::structural(Format::Docx, e))?;
        let package = self.build(&mut manuscript);
        self.write_package(&package, writer)
            .map_err(|e| Error::render(Format::Docx, e))
    }
}

/// Every part of the package, fully serialized.
struct Package {
    document: String,
    styles: String,
    core: String,
    media: Vec<MediaEntry>,
}

/// Body text of one block as runs per paragraph.
type Paragraphs = Vec<Vec<Span>>;

impl DocxExporter {
    fn build(&self, m: &mut Manuscript) -> Package {
        let bodies = block_bodies(m);
        let mut media: Vec<MediaEntry> = Vec::new();
        let mut body = BodyWriter::new();

        body.title(&m.title);
        body.subtitle(&format!("by {}", m.author));
        if let Some(ts) = &m.generated_at {
            body.subtitle(ts);
        }
        if let Some(cover) = m.cover.clone() {
            let asset = ImageAsset {
                url: cover.url,
                prompt: "Cover".to_string(),
                chapter: None,
            };
            self.embed(m, &mut body, &mut media, &asset, false);
        }

        body.page_break();
        body.toc_heading("Contents");
        let bookmarks: Vec<String> = m
            .blocks
            .iter()
            .enumerate()
            .map(|(i, block)| bookmark_name(i, &block.anchor))
            .collect();
        for (entry, bookmark) in m.toc.iter().zip(&bookmarks) {
            body.toc_line(&entry.title, bookmark);
        }

        let blocks = m.blocks.clone();
        for (i, (block, paragraphs)) in blocks.iter().zip(bodies).enumerate() {
            if self.config.page_break_between_blocks {
                body.page_break();
            }
            body.heading(&block.heading, &bookmarks[i]);
            for spans in &paragraphs {
                body.paragraph(spans);
            }
            if let Some(number) = block.kind.chapter_number() {
                let images: Vec<ImageAsset> = m.images_for(number).cloned().collect();
                for image in &images {
                    self.embed(m, &mut body, &mut media, image, true);
                }
            }
        }

        let unplaced: Vec<ImageAsset> = m.unplaced_images().cloned().collect();
        for image in &unplaced {
            self.embed(m, &mut body, &mut media, image, true);
        }

        if let Some(colophon) = &m.colophon {
            body.caption(colophon);
        }

        tracing::debug!(
            blocks = m.blocks.len(),
            images = media.len(),
            "docx document built"
        );

        Package {
            document: body.finish(),
            styles: parts::styles(&m.typography),
            core: parts::core_props(&m.title, &m.author, m.generated_at.as_deref()),
            media,
        }
    }

    /// Embed a data-URL image, or record why it was skipped.
    fn embed(
        &self,
        m: &mut Manuscript,
        body: &mut BodyWriter,
        media: &mut Vec<MediaEntry>,
        asset: &ImageAsset,
        caption: bool,
    ) {
        let decoded = decode_data_url(&asset.url).and_then(|image| {
            let extent = image
                .extent_emu(self.config.max_image_width_emu)
                .ok_or("image dimensions out of range")?;
            Ok((image, extent))
        });
        match decoded {
            Ok((image, extent)) => {
                let entry = MediaEntry::new(media.len(), image, &asset.prompt);
                body.image(&entry, extent);
                if caption && !entry.description.is_empty() {
                    body.caption(&entry.description);
                }
                media.push(entry);
            }
            Err(reason) => m.record(Warning::UnembeddableImage {
                url: asset.url.clone(),
                reason: reason.to_string(),
            }),
        }
    }

    fn write_package<W: Write + Seek>(
        &self,
        package: &Package,
        writer: &mut W,
    ) -> zip::result::ZipResult<()> {
        let mut zip = ZipWriter::new(writer);

        let compression_level = self.config.compression_level.unwrap_or(6).min(9);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(compression_level)))
            .last_modified_time(DateTime::default());
        let stored = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .last_modified_time(DateTime::default());

        zip.start_file("[Content_Types].xml", deflated)?;
        zip.write_all(parts::content_types(&package.media).as_bytes())?;

        zip.start_file("_rels/.rels", deflated)?;
        zip.write_all(parts::PACKAGE_RELS)?;

        zip.start_file("docProps/core.xml", deflated)?;
        zip.write_all(package.core.as_bytes())?;

        zip.start_file("word/document.xml", deflated)?;
        zip.write_all(package.document.as_bytes())?;

        zip.start_file("word/styles.xml", deflated)?;
        zip.write_all(package.styles.as_bytes())?;

        zip.start_file("word/_rels/document.xml.rels", deflated)?;
        zip.write_all(parts::document_rels(&package.media).as_bytes())?;

        // Image payloads are already compressed.
        for entry in &package.media {
            zip.start_file(entry.zip_path(), stored)?;
            zip.write_all(&entry.image.data)?;
        }

        zip.finish()?;
        Ok(())
    }
}

/// Paragraph runs for every block, taking chapter bodies from the
/// pre-rendered markup when it lines up with the manuscript.
fn block_bodies(m: &mut Manuscript) -> Vec<Paragraphs> {
    let mut bodies: Vec<Paragraphs> = m
        .blocks
        .iter()
        .map(|block| block.paragraphs().map(parse_spans).collect())
        .collect();

    let Some(html) = m.formatted_content.as_deref() else {
        return bodies;
    };
    let recovered = recover_chapters(html);
    let chapter_slots: Vec<usize> = m
        .blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| matches!(b.kind, BlockKind::Chapter { .. }))
        .map(|(i, _)| i)
        .collect();

    if recovered.len() != chapter_slots.len() {
        m.record(Warning::FormattedContentMismatch {
            recovered: recovered.len(),
            expected: chapter_slots.len(),
        });
        return bodies;
    }

    for (slot, chapter) in chapter_slots.into_iter().zip(recovered) {
        bodies[slot] = chapter
            .paragraphs
            .iter()
            .map(|p| sanitize(p))
            .filter(|p| !p.is_empty())
            .map(|text| {
                vec![Span {
                    text,
                    style: SpanStyle::default(),
                }]
            })
            .collect();
    }
    tracing::debug!("docx chapter bodies taken from formatted content");
    bodies
}
