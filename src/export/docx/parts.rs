//! WordprocessingML package parts.

use std::fmt::Write as _;

use quick_xml::escape::escape;

use crate::pipeline::{Span, Typography};

use super::media::{DecodedImage, ImageKind};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const IMAGE_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

pub const PACKAGE_RELS: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>
"#;

/// An image stored under `word/media/`.
#[derive(Debug, Clone)]
pub struct MediaEntry {
    pub rel_id: String,
    pub file_name: String,
    pub image: DecodedImage,
    pub description: String,
}

impl MediaEntry {
    pub fn new(index: usize, image: DecodedImage, description: &str) -> Self {
        Self {
            // rId1 is the styles part.
            rel_id: format!("rId{}", index + 2),
            file_name: format!("image{}.{}", index + 1, image.kind.extension()),
            image,
            description: description.trim().to_string(),
        }
    }

    pub fn zip_path(&self) -> String {
        format!("word/media/{}", self.file_name)
    }
}

/// Escape text for element content or attributes, dropping characters XML 1.0
/// does not allow.
pub fn xml_text(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || c >= ' ')
        .filter(|&c| !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
        .collect();
    escape(cleaned.as_str()).into_owned()
}

pub fn content_types(media: &[MediaEntry]) -> String {
    let mut kinds: Vec<ImageKind> = Vec::new();
    for entry in media {
        if !kinds.contains(&entry.image.kind) {
            kinds.push(entry.image.kind);
        }
    }

    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
"#,
    );
    for kind in kinds {
        let _ = writeln!(
            out,
            r#"  <Default Extension="{}" ContentType="{}"/>"#,
            kind.extension(),
            kind.content_type()
        );
    }
    out.push_str(
        r#"  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>
"#,
    );
    out
}

pub fn document_rels(media: &[MediaEntry]) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
"#,
    );
    for entry in media {
        let _ = writeln!(
            out,
            r#"  <Relationship Id="{}" Type="{IMAGE_REL}" Target="media/{}"/>"#,
            entry.rel_id, entry.file_name
        );
    }
    out.push_str("</Relationships>\n");
    out
}

pub fn core_props(title: &str, author: &str, created: Option<&str>) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
"#,
    );
    let _ = writeln!(out, "  <dc:title>{}</dc:title>", xml_text(title));
    let _ = writeln!(out, "  <dc:creator>{}</dc:creator>", xml_text(author));
    if let Some(created) = created {
        let _ = writeln!(
            out,
            r#"  <dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>"#,
            xml_text(created)
        );
    }
    out.push_str("</cp:coreProperties>\n");
    out
}

/// Style sheet carrying the resolved font, size and alignment.
pub fn styles(typography: &Typography) -> String {
    let font = typography.docx_font();
    // Sizes are in half-points.
    let body = typography.size_pt * 2;
    let heading = typography.size_pt * 3;
    let title = typography.size_pt * 4;
    let jc = typography.alignment.ooxml();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{W_NS}">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}" w:eastAsia="{font}"/><w:sz w:val="{body}"/><w:szCs w:val="{body}"/></w:rPr></w:rPrDefault>
    <w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="276" w:lineRule="auto"/></w:pPr></w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/><w:pPr><w:jc w:val="{jc}"/></w:pPr></w:style>
  <w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:spacing w:before="2400" w:after="480"/><w:jc w:val="center"/></w:pPr><w:rPr><w:b/><w:sz w:val="{title}"/><w:szCs w:val="{title}"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Subtitle"><w:name w:val="Subtitle"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:jc w:val="center"/></w:pPr><w:rPr><w:i/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="480" w:after="240"/><w:jc w:val="left"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="{heading}"/><w:szCs w:val="{heading}"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="TOCHeading"><w:name w:val="TOC Heading"/><w:basedOn w:val="Heading1"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:outlineLvl w:val="9"/></w:pPr></w:style>
  <w:style w:type="paragraph" w:styleId="TOC1"><w:name w:val="toc 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:spacing w:after="100"/><w:jc w:val="left"/></w:pPr></w:style>
  <w:style w:type="paragraph" w:styleId="Caption"><w:name w:val="caption"/><w:basedOn w:val="Normal"/><w:pPr><w:jc w:val="center"/></w:pPr><w:rPr><w:i/><w:sz w:val="{caption}"/></w:rPr></w:style>
  <w:style w:type="character" w:styleId="Hyperlink"><w:name w:val="Hyperlink"/><w:rPr><w:color w:val="0563C1"/><w:u w:val="single"/></w:rPr></w:style>
</w:styles>
"#,
        caption = body.saturating_sub(2).max(12),
    )
}

/// Builds `word/document.xml` one block element at a time.
#[derive(Debug, Default)]
pub struct BodyWriter {
    out: String,
    bookmarks: u32,
    drawings: u32,
    mono_font: &'static str,
}

impl BodyWriter {
    pub fn new() -> Self {
        Self {
            mono_font: "Courier New",
            ..Default::default()
        }
    }

    fn styled(&mut self, style: &str, text: &str) {
        let _ = write!(
            self.out,
            r#"<w:p><w:pPr><w:pStyle w:val="{style}"/></w:pPr>{}</w:p>"#,
            run(text, "")
        );
        self.out.push('\n');
    }

    pub fn title(&mut self, text: &str) {
        self.styled("Title", text);
    }

    pub fn subtitle(&mut self, text: &str) {
        self.styled("Subtitle", text);
    }

    pub fn toc_heading(&mut self, text: &str) {
        self.styled("TOCHeading", text);
    }

    /// A contents line linking to a bookmark.
    pub fn toc_line(&mut self, text: &str, bookmark: &str) {
        let _ = writeln!(
            self.out,
            r#"<w:p><w:pPr><w:pStyle w:val="TOC1"/></w:pPr><w:hyperlink w:anchor="{}" w:history="1">{}</w:hyperlink></w:p>"#,
            xml_text(bookmark),
            run(text, r#"<w:rStyle w:val="Hyperlink"/>"#)
        );
    }

    pub fn page_break(&mut self) {
        self.out
            .push_str("<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>\n");
    }

    /// A Heading1 paragraph wrapped in a bookmark.
    pub fn heading(&mut self, text: &str, bookmark: &str) {
        let id = self.bookmarks;
        self.bookmarks += 1;
        let _ = writeln!(
            self.out,
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:bookmarkStart w:id="{id}" w:name="{}"/>{}<w:bookmarkEnd w:id="{id}"/></w:p>"#,
            xml_text(bookmark),
            run(text, "")
        );
    }

    /// A body paragraph with native emphasis runs.
    pub fn paragraph(&mut self, spans: &[Span]) {
        self.out.push_str("<w:p>");
        for span in spans {
            let mut props = String::new();
            if span.style.code {
                let _ = write!(
                    props,
                    r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:cs="{0}"/>"#,
                    self.mono_font
                );
            }
            if span.style.bold {
                props.push_str("<w:b/>");
            }
            if span.style.italic {
                props.push_str("<w:i/>");
            }
            if span.style.strike {
                props.push_str("<w:strike/>");
            }
            self.out.push_str(&run(&span.text, &props));
        }
        self.out.push_str("</w:p>\n");
    }

    pub fn caption(&mut self, text: &str) {
        self.styled("Caption", text);
    }

    /// A centered paragraph holding one inline picture.
    pub fn image(&mut self, entry: &MediaEntry, extent: (u64, u64)) {
        self.drawings += 1;
        let id = self.drawings;
        let (cx, cy) = extent;
        let descr = xml_text(&entry.description);
        let _ = writeln!(
            self.out,
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{id}" name="Picture {id}" descr="{descr}"/><a:graphic><a:graphicData uri="{PIC_NS}"><pic:pic><pic:nvPicPr><pic:cNvPr id="{id}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
            name = xml_text(&entry.file_name),
            rel = entry.rel_id,
        );
    }

    /// Close the body with a US Letter section and return the whole part.
    pub fn finish(self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}" xmlns:wp="{WP_NS}" xmlns:a="{A_NS}" xmlns:pic="{PIC_NS}">
<w:body>
{}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>
</w:body>
</w:document>
"#,
            self.out
        )
    }
}

/// One run; newlines inside a paragraph become spaces.
fn run(text: &str, props: &str) -> String {
    let text = text.replace(['\r', '\n'], " ");
    let rpr = if props.is_empty() {
        String::new()
    } else {
        format!("<w:rPr>{props}</w:rPr>")
    };
    format!(
        r#"<w:r>{rpr}<w:t xml:space="preserve">{}</w:t></w:r>"#,
        xml_text(&text)
    )
}

/// Bookmark name for a block: Word limits names to 40 characters and
/// letters, digits and underscores.
pub fn bookmark_name(index: usize, anchor: &str) -> String {
    let mut name = format!("_Toc{}_", index + 1);
    for c in anchor.chars() {
        if name.len() >= 40 {
            break;
        }
        if c.is_ascii_alphanumeric() {
            name.push(c);
        } else {
            name.push('_');
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{SpanStyle, Typography};

    #[test]
    fn test_xml_text_escapes_and_drops_controls() {
        assert_eq!(xml_text("a<b & \"c\"\u{0B}"), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_bookmark_names() {
        assert_eq!(bookmark_name(0, "opening"), "_Toc1_opening");
        assert_eq!(bookmark_name(2, "a-b"), "_Toc3_a_b");
        assert!(bookmark_name(9, &"x".repeat(100)).len() <= 40);
    }

    #[test]
    fn test_styles_carry_typography() {
        let typography = Typography {
            family_token: "Georgia".to_string(),
            size_pt: 14,
            ..Default::default()
        };
        let xml = styles(&typography);
        assert!(xml.contains(r#"w:ascii="Georgia""#));
        assert!(xml.contains(r#"<w:sz w:val="28"/>"#));
        assert!(xml.contains(r#"w:styleId="Heading1""#));
        assert!(xml.contains(r#"w:styleId="TOC1""#));
    }

    #[test]
    fn test_paragraph_runs() {
        let mut body = BodyWriter::new();
        body.paragraph(&[
            Span {
                text: "plain ".to_string(),
                style: SpanStyle::default(),
            },
            Span {
                text: "bold".to_string(),
                style: SpanStyle {
                    bold: true,
                    ..Default::default()
                },
            },
        ]);
        let xml = body.finish();
        assert!(xml.contains(r#"<w:r><w:t xml:space="preserve">plain </w:t></w:r>"#));
        assert!(xml.contains(r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">bold</w:t></w:r>"#));
    }

    #[test]
    fn test_heading_bookmark_ids_increment() {
        let mut body = BodyWriter::new();
        body.heading("One", "_Toc1_one");
        body.heading("Two", "_Toc2_two");
        let xml = body.finish();
        assert!(xml.contains(r#"<w:bookmarkStart w:id="0" w:name="_Toc1_one"/>"#));
        assert!(xml.contains(r#"<w:bookmarkEnd w:id="1"/>"#));
    }
}
