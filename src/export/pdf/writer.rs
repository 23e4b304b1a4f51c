//! PDF object emission.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use pdf_writer::types::{ActionType, AnnotationType};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::error::{Error, Result};
use crate::export::Format;

use super::PdfConfig;
use super::layout::{DrawOp, PageCanvas};
use super::metrics::{Face, win_ansi};
use super::paginate::PaginatedDocument;

/// Serialize a paginated document.
pub(super) fn write_pdf(doc: &PaginatedDocument, config: &PdfConfig) -> Result<Vec<u8>> {
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();
    let font_ids: Vec<(Face, Ref)> = Face::ALL.iter().map(|face| (*face, alloc())).collect();

    let layout = &doc.layout;
    let n = layout.page_count();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    let fonts = layout.fonts();
    for (face, id) in &font_ids {
        pdf.type1_font(*id)
            .base_font(Name(fonts.base_font(*face)))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    pdf.document_info(info_id)
        .title(TextStr(&doc.title))
        .author(TextStr(&doc.author))
        .creator(TextStr("quire"));
    let file_id = file_id(doc);
    pdf.set_file_id((file_id.clone(), file_id));

    // Link annotations, one list per page.
    let mut annot_ids: Vec<Vec<Ref>> = Vec::with_capacity(n);
    for canvas in layout.pages() {
        let mut ids = Vec::new();
        for (rect, target, target_y) in canvas.links() {
            let Some(target_ref) = page_ids.get(target.index()) else {
                return Err(Error::render(
                    Format::Pdf,
                    format!("link to missing page {}", target.number()),
                ));
            };
            let id = alloc();
            let mut annot = pdf.annotation(id);
            annot
                .subtype(AnnotationType::Link)
                .rect(Rect::new(rect[0], rect[1], rect[2], rect[3]))
                .border(0.0, 0.0, 0.0, None);
            annot
                .action()
                .action_type(ActionType::GoTo)
                .destination()
                .page(*target_ref)
                .xyz(layout.margins().left, target_y, None);
            drop(annot);
            ids.push(id);
        }
        annot_ids.push(ids);
    }

    for (i, canvas) in layout.pages().iter().enumerate() {
        let raw = page_content(canvas).finish();
        if config.compress {
            let compressed = deflate(&raw)?;
            pdf.stream(content_ids[i], &compressed)
                .filter(Filter::FlateDecode);
        } else {
            pdf.stream(content_ids[i], &raw);
        }
    }

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, layout.width(), layout.height()))
            .parent(pages_id)
            .contents(content_ids[i]);
        if !annot_ids[i].is_empty() {
            page.annotations(annot_ids[i].iter().copied());
        }
        let mut resources = page.resources();
        let mut font_dict = resources.fonts();
        for (face, id) in &font_ids {
            font_dict.pair(Name(face.resource_name()), *id);
        }
    }

    Ok(pdf.finish())
}

fn page_content(canvas: &PageCanvas) -> Content {
    let mut content = Content::new();
    // Word spacing is graphics state and survives ET.
    let mut spacing = 0.0;
    for op in canvas.ops() {
        let DrawOp::Text {
            x,
            y,
            face,
            size,
            word_spacing,
            text,
        } = op
        else {
            continue;
        };
        content.begin_text();
        content.set_font(Name(face.resource_name()), *size);
        if *word_spacing != spacing {
            content.set_word_spacing(*word_spacing);
            spacing = *word_spacing;
        }
        content.next_line(*x, *y);
        content.show(Str(&win_ansi(text)));
        content.end_text();
    }
    content
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::render(Format::Pdf, e))?;
    encoder.finish().map_err(|e| Error::render(Format::Pdf, e))
}

/// Deterministic file identifier derived from the document metadata.
fn file_id(doc: &PaginatedDocument) -> Vec<u8> {
    let mut hasher = sha1_smol::Sha1::new();
    hasher.update(doc.title.as_bytes());
    hasher.update(&[0]);
    hasher.update(doc.author.as_bytes());
    hasher.digest().bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::pdf::paginate;
    use crate::model::{CompiledContent, Manuscript, Markup, RawSection};

    fn demo_doc() -> PaginatedDocument {
        let content = CompiledContent::new("Demo", "A. Writer").with_section(
            RawSection::new("Opening", "Hello world.\n\nSecond paragraph.").numbered(1),
        );
        let m = Manuscript::prepare(&content, Markup::Plain).unwrap();
        paginate(&m, &PdfConfig::default()).unwrap()
    }

    #[test]
    fn test_uncompressed_output_structure() {
        let config = PdfConfig {
            compress: false,
            ..Default::default()
        };
        let bytes = write_pdf(&demo_doc(), &config).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-"));
        let pages = text.matches("/Type /Page").count() - text.matches("/Type /Pages").count();
        assert_eq!(pages, 3);
        assert!(text.contains("/BaseFont /Times-Roman"));
        assert!(text.contains("/WinAnsiEncoding"));
        assert!(text.contains("(Chapter 1: Opening) Tj"));
        assert!(text.contains("/S /GoTo"));
        assert!(text.contains("(Demo)"));
    }

    #[test]
    fn test_compressed_streams_are_flagged() {
        let bytes = write_pdf(&demo_doc(), &PdfConfig::default()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/FlateDecode"));
        assert!(!text.contains("(Chapter 1: Opening) Tj"));
    }

    /// Word spacing in effect for every `Tj` of an uncompressed stream.
    fn shown_spacing(stream: &[u8]) -> Vec<f32> {
        let text = String::from_utf8_lossy(stream);
        let mut current = 0.0;
        let mut shown = Vec::new();
        for line in text.lines() {
            if let Some(value) = line.strip_suffix(" Tw") {
                current = value.trim().parse().unwrap();
            } else if line.ends_with(" Tj") {
                shown.push(current);
            }
        }
        shown
    }

    #[test]
    fn test_word_spacing_reset_after_justified_lines() {
        let body = "The quay was quiet and the boats lay still under a low grey sky \
                    while the gulls wheeled over the harbor wall and the tide turned. "
            .repeat(6);
        let mut content = CompiledContent::new("Justified", "A. Writer")
            .with_section(RawSection::new("Opening", format!("{body}\n\n{body}")));
        content.user_input.text_alignment = Some("justify".to_string());
        let m = Manuscript::prepare(&content, Markup::Plain).unwrap();
        let doc = paginate(&m, &PdfConfig::default()).unwrap();

        let canvas = &doc.layout.pages()[2];
        let expected: Vec<f32> = canvas
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { word_spacing, .. } => Some(*word_spacing),
                DrawOp::Link { .. } => None,
            })
            .collect();
        assert!(expected.iter().any(|w| *w > 0.0));
        assert!(expected.last().is_some_and(|w| *w == 0.0));

        let shown = shown_spacing(&page_content(canvas).finish());
        assert_eq!(shown.len(), expected.len());
        for (shown, expected) in shown.iter().zip(&expected) {
            assert!((shown - expected).abs() < 0.01, "{shown} != {expected}");
        }
    }

    #[test]
    fn test_output_is_deterministic() {
        let a = write_pdf(&demo_doc(), &PdfConfig::default()).unwrap();
        let b = write_pdf(&demo_doc(), &PdfConfig::default()).unwrap();
        assert_eq!(a, b);
    }
}
