//! Two-phase pagination.
//!
//! Phase 1 lays out the title page, the contents page and every block,
//! remembering where each contents line was drawn and on which page each
//! heading landed. Phase 2 checks that every contents line has a heading and
//! only then writes the page numbers and links back onto the contents page.
//! Running headers and footers are added last.

use std::collections::HashMap;

use crate::error::{Error, Result, StructuralError};
use crate::export::Format;
use crate::model::Manuscript;
use crate::pipeline::Alignment;

use super::PdfConfig;
use super::layout::{PageHandle, PageLayout};
use super::metrics::{Face, FontSet};

/// Where a heading was drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub anchor: String,
    pub title: String,
    pub page: PageHandle,
    /// Top of the heading, used as the link destination.
    pub y: f32,
}

/// A contents line waiting for its page number.
#[derive(Debug, Clone, PartialEq)]
pub struct TocSlot {
    pub anchor: String,
    pub title: String,
    pub page: PageHandle,
    /// Baseline of the line's last row.
    pub y: f32,
    /// Where the title text ends on that row.
    pub text_end: f32,
    pub size: f32,
}

/// A fully laid-out document ready for the writer.
#[derive(Debug, Clone)]
pub struct PaginatedDocument {
    pub title: String,
    pub author: String,
    pub layout: PageLayout,
    pub anchors: Vec<Anchor>,
    pub slots: Vec<TocSlot>,
}

impl PaginatedDocument {
    pub fn page_count(&self) -> usize {
        self.layout.page_count()
    }

    /// Page a heading was drawn on, by anchor id.
    pub fn page_of(&self, anchor: &str) -> Option<PageHandle> {
        self.anchors
            .iter()
            .find(|a| a.anchor == anchor)
            .map(|a| a.page)
    }
}

struct Sizes {
    body: f32,
    leading: f32,
    heading: f32,
    title: f32,
}

impl Sizes {
    fn new(m: &Manuscript, config: &PdfConfig) -> Self {
        let body = m.typography.size_pt as f32;
        Self {
            body,
            leading: body * config.line_spacing.max(1.0),
            heading: (body * 1.5).min(48.0),
            title: (body * 2.2).min(60.0),
        }
    }
}

/// Lay out `m` and resolve its contents page.
pub fn paginate(m: &Manuscript, config: &PdfConfig) -> Result<PaginatedDocument> {
    let mut doc = layout_pass(m, config);
    resolve_pass(&mut doc, config)?;
    decorate_pages(&mut doc, config)?;

    tracing::debug!(
        pages = doc.page_count(),
        entries = doc.slots.len(),
        "pdf paginated"
    );
    Ok(doc)
}

fn layout_pass(m: &Manuscript, config: &PdfConfig) -> PaginatedDocument {
    let sizes = Sizes::new(m, config);
    let mut layout = PageLayout::new(
        config.paper,
        config.margins,
        FontSet::new(m.typography.class),
    );

    title_page(&mut layout, m, &sizes);

    layout.page_break();
    let slots = contents_page(&mut layout, m, &sizes);

    let mut anchors = Vec::with_capacity(m.blocks.len());
    for block in &m.blocks {
        layout.page_break();
        let (page, y) = layout.write_heading(&block.heading, sizes.heading, sizes.heading * 1.4);
        layout.advance(sizes.leading * 0.5);
        anchors.push(Anchor {
            anchor: block.anchor.clone(),
            title: block.title.clone(),
            page,
            y,
        });

        for paragraph in block.paragraphs() {
            layout.write_paragraph(
                paragraph,
                Face::Regular,
                sizes.body,
                sizes.leading,
                m.typography.alignment,
            );
            layout.advance(sizes.leading * 0.5);
        }
    }

    if !m.images.is_empty() || m.cover.is_some() {
        tracing::debug!(images = m.images.len(), "pdf output skips raster images");
    }

    if let Some(colophon) = &m.colophon {
        let size = (sizes.body * 0.85).max(6.0);
        layout.advance(sizes.leading * 2.0);
        layout.ensure_space(size * 1.4);
        layout.write_line(colophon, Face::Italic, size, size * 1.4, Alignment::Center);
    }

    PaginatedDocument {
        title: m.title.clone(),
        author: m.author.clone(),
        layout,
        anchors,
        slots,
    }
}

fn title_page(layout: &mut PageLayout, m: &Manuscript, sizes: &Sizes) {
    layout.move_to(layout.height() * 0.68);
    for line in layout.wrap(&m.title, Face::Bold, sizes.title, layout.content_width()) {
        layout.write_line(&line, Face::Bold, sizes.title, sizes.title * 1.25, Alignment::Center);
    }

    layout.advance(sizes.leading * 1.5);
    let byline = format!("by {}", m.author);
    let size = sizes.body * 1.25;
    for line in layout.wrap(&byline, Face::Italic, size, layout.content_width()) {
        layout.write_line(&line, Face::Italic, size, size * 1.4, Alignment::Center);
    }

    if let Some(ts) = &m.generated_at {
        layout.advance(sizes.leading);
        let size = (sizes.body * 0.8).max(6.0);
        layout.write_line(ts, Face::Regular, size, size * 1.4, Alignment::Center);
    }
}

fn contents_page(layout: &mut PageLayout, m: &Manuscript, sizes: &Sizes) -> Vec<TocSlot> {
    layout.write_heading("Contents", sizes.heading, sizes.heading * 1.4);
    layout.advance(sizes.leading * 0.5);

    // Room on the right for the page number.
    let number_col = layout.text_width(Face::Regular, sizes.body, "0000") + sizes.body;
    let width = layout.content_width() - number_col;
    let left = layout.margins().left;

    let mut slots = Vec::with_capacity(m.toc.len());
    for entry in &m.toc {
        let lines = layout.wrap(&entry.title, Face::Regular, sizes.body, width);
        layout.ensure_space(sizes.leading * lines.len() as f32);

        let mut last = (layout.current(), layout.cursor_y(), left);
        for line in &lines {
            let (page, y) =
                layout.write_line(line, Face::Regular, sizes.body, sizes.leading, Alignment::Left);
            last = (page, y, left + layout.text_width(Face::Regular, sizes.body, line));
        }

        let (page, y, text_end) = last;
        slots.push(TocSlot {
            anchor: entry.anchor.clone(),
            title: entry.title.clone(),
            page,
            y,
            text_end,
            size: sizes.body,
        });
    }
    slots
}

/// Draw page numbers, leaders and links for every contents line.
fn resolve_pass(doc: &mut PaginatedDocument, config: &PdfConfig) -> Result<()> {
    let by_anchor: HashMap<&str, &Anchor> =
        doc.anchors.iter().map(|a| (a.anchor.as_str(), a)).collect();

    // Every slot must resolve before anything is drawn.
    let mut resolved = Vec::with_capacity(doc.slots.len());
    for slot in &doc.slots {
        let anchor = by_anchor.get(slot.anchor.as_str()).ok_or_else(|| {
            Error::structural(
                Format::Pdf,
                StructuralError::UnresolvedTocEntry(slot.title.clone()),
            )
        })?;
        resolved.push((slot.clone(), anchor.page, anchor.y));
    }

    let layout = &mut doc.layout;
    let right = layout.right();
    let left = layout.margins().left;

    for (slot, target, target_y) in resolved {
        let size = slot.size;
        let dot = layout.text_width(Face::Regular, size, ".");
        let number = target.number().to_string();
        let number_x = right - layout.text_width(Face::Regular, size, &number);
        layout
            .draw_text_at(slot.page, number_x, slot.y, Face::Regular, size, &number)
            .map_err(|e| Error::render(Format::Pdf, e))?;

        if config.toc_leaders && dot > 0.0 {
            let start = slot.text_end + size * 0.5;
            let end = number_x - size * 0.5;
            let count = ((end - start) / dot).floor();
            if count >= 2.0 {
                let leaders = ".".repeat(count as usize);
                layout
                    .draw_text_at(
                        slot.page,
                        end - count * dot,
                        slot.y,
                        Face::Regular,
                        size,
                        &leaders,
                    )
                    .map_err(|e| Error::render(Format::Pdf, e))?;
            }
        }

        let rect = [left, slot.y - size * 0.3, right, slot.y + size];
        layout
            .add_link(slot.page, rect, target, target_y)
            .map_err(|e| Error::render(Format::Pdf, e))?;
    }
    Ok(())
}

/// Running header and page-number footer on every page but the title page.
fn decorate_pages(doc: &mut PaginatedDocument, config: &PdfConfig) -> Result<()> {
    if !config.running_header && !config.page_numbers {
        return Ok(());
    }

    let layout = &mut doc.layout;
    let size = 9.0;
    let margins = layout.margins();
    let header_y = layout.height() - margins.top / 2.0;
    let footer_y = margins.bottom / 2.0;
    let header = layout
        .wrap(&doc.title, Face::Italic, size, layout.content_width())
        .into_iter()
        .next()
        .unwrap_or_default();

    let pages: Vec<PageHandle> = layout.handles().skip(1).collect();
    for page in pages {
        if config.running_header {
            layout
                .draw_text_at(page, margins.left, header_y, Face::Italic, size, &header)
                .map_err(|e| Error::render(Format::Pdf, e))?;
        }
        if config.page_numbers {
            let number = page.number().to_string();
            let x = (layout.width() - layout.text_width(Face::Regular, size, &number)) / 2.0;
            layout
                .draw_text_at(page, x, footer_y, Face::Regular, size, &number)
                .map_err(|e| Error::render(Format::Pdf, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompiledContent, Markup, RawSection, Structural};

    fn demo() -> CompiledContent {
        CompiledContent::new("Demo", "A. Writer").with_section(
            RawSection::new("Opening", "Hello world.\n\nSecond paragraph.").numbered(1),
        )
    }

    fn paginate_content(content: &CompiledContent) -> PaginatedDocument {
        let m = Manuscript::prepare(content, Markup::Plain).unwrap();
        paginate(&m, &PdfConfig::default()).unwrap()
    }

    #[test]
    fn test_demo_heading_on_page_three() {
        let doc = paginate_content(&demo());
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.page_of("opening").map(PageHandle::number), Some(3));

        let contents: Vec<&str> = doc.layout.pages()[1].texts().collect();
        assert!(contents.contains(&"Contents"));
        assert!(contents.contains(&"Opening"));
        assert!(contents.contains(&"3"));
    }

    #[test]
    fn test_long_chapter_pushes_next_chapter() {
        let long = "A fairly ordinary sentence that fills the line. ".repeat(40);
        let body = vec![long; 12].join("\n\n");
        let content = CompiledContent::new("Long", "Writer")
            .with_section(RawSection::new("First", body).numbered(1))
            .with_section(RawSection::new("Second", "Short.").numbered(2));
        let doc = paginate_content(&content);

        let first = doc.page_of("first").unwrap();
        let second = doc.page_of("second").unwrap();
        assert_eq!(first.number(), 3);
        assert!(second.number() > first.number() + 1);
        assert_eq!(second.number(), doc.page_count());

        let contents: Vec<&str> = doc.layout.pages()[1].texts().collect();
        assert!(contents.contains(&second.number().to_string().as_str()));
    }

    #[test]
    fn test_front_matter_pages() {
        let mut content = demo();
        content.structural = Some(Structural {
            foreword: Some("Before.".to_string()),
            introduction: Some("Also before.".to_string()),
            table_of_contents_list: None,
        });
        let doc = paginate_content(&content);
        assert_eq!(doc.page_of("foreword").map(PageHandle::number), Some(3));
        assert_eq!(doc.page_of("introduction").map(PageHandle::number), Some(4));
        assert_eq!(doc.page_of("opening").map(PageHandle::number), Some(5));
    }

    #[test]
    fn test_links_point_at_heading_pages() {
        let content = demo().with_section(RawSection::new("Next", "More.").numbered(2));
        let doc = paginate_content(&content);
        let targets: Vec<usize> = doc.layout.pages()[1]
            .links()
            .map(|(_, target, _)| target.number())
            .collect();
        assert_eq!(targets, vec![3, 4]);
    }

    #[test]
    fn test_unresolved_slot_is_fatal() {
        let m = Manuscript::prepare(&demo(), Markup::Plain).unwrap();
        let mut doc = layout_pass(&m, &PdfConfig::default());
        doc.anchors.clear();
        let err = resolve_pass(&mut doc, &PdfConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Opening"));
        // Nothing was drawn onto the contents page.
        assert!(!doc.layout.pages()[1].texts().any(|t| t == "3"));
    }

    #[test]
    fn test_title_page_has_no_header_or_footer() {
        let doc = paginate_content(&demo());
        let title_page: Vec<&str> = doc.layout.pages()[0].texts().collect();
        assert_eq!(title_page, vec!["Demo", "by A. Writer"]);

        let last: Vec<&str> = doc.layout.pages()[2].texts().collect();
        assert!(last.contains(&"Demo"));
        assert!(last.contains(&"3"));
    }

    #[test]
    fn test_decorations_can_be_disabled() {
        let m = Manuscript::prepare(&demo(), Markup::Plain).unwrap();
        let config = PdfConfig {
            running_header: false,
            page_numbers: false,
            ..Default::default()
        };
        let doc = paginate(&m, &config).unwrap();
        let chapter: Vec<&str> = doc.layout.pages()[2].texts().collect();
        assert_eq!(
            chapter,
            vec!["Chapter 1: Opening", "Hello world.", "Second paragraph."]
        );
    }
}
