//! HTML exporter.
//!
//! Produces one self-contained page: title section, linked contents list, one
//! `<section>` per block and an optional colophon. Every piece of content text
//! is escaped before it is written.

use std::fmt::Write as _;
use std::io::{Seek, Write};

use quick_xml::escape::escape;

use crate::error::{Error, Result};
use crate::model::{CompiledContent, ImageAsset, Manuscript, Markup};
use crate::pipeline::{Span, parse_spans};

use super::{Exporter, Format, write_text};

/// Configuration for HTML export.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    /// Emit a complete document (doctype, head, body). When false only the
    /// `<article>` fragment is written.
    pub standalone: bool,
    /// Embed a `<style>` element carrying the resolved typography.
    pub include_styles: bool,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            standalone: true,
            include_styles: true,
        }
    }
}

/// Exporter for HTML output.
#[derive(Debug, Clone, Default)]
pub struct HtmlExporter {
    config: HtmlConfig,
}

impl HtmlExporter {
    /// Create a new HtmlExporter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an HtmlExporter with the specified configuration.
    pub fn with_config(config: HtmlConfig) -> Self {
        Self { config }
    }

    /// Render the content to a string.
    pub fn render_string(&self, content: &CompiledContent) -> Result<String> {
        let manuscript = Manuscript::prepare(content, Markup::Rich)
            .map_err(|e| Error::structural(Format::Html, e))?;
        Ok(self.render_manuscript(&manuscript))
    }

    fn render_manuscript(&self, m: &Manuscript) -> String {
        let mut out = String::new();

        if self.config.standalone {
            out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
            out.push_str("<meta charset=\"utf-8\">\n");
            let _ = writeln!(out, "<title>{}</title>", escape(m.title.as_str()));
            let _ = writeln!(
                out,
                "<meta name=\"author\" content=\"{}\">",
                escape(m.author.as_str())
            );
            if self.config.include_styles {
                write_styles(&mut out, m);
            }
            out.push_str("</head>\n<body>\n");
        } else if self.config.include_styles {
            write_styles(&mut out, m);
        }

        out.push_str("<article class=\"book\">\n");
        write_title_section(&mut out, m);
        write_contents(&mut out, m);

        for block in &m.blocks {
            let _ = writeln!(out, "<section class=\"block\">");
            let _ = writeln!(
                out,
                "<h2 id=\"{}\">{}</h2>",
                escape(block.anchor.as_str()),
                escape(block.heading.as_str())
            );
            for paragraph in block.paragraphs() {
                out.push_str("<p>");
                write_spans(&mut out, &parse_spans(paragraph));
                out.push_str("</p>\n");
            }
            if let Some(number) = block.kind.chapter_number() {
                for image in m.images_for(number) {
                    write_figure(&mut out, image);
                }
            }
            out.push_str("</section>\n");
        }

        let unplaced: Vec<&ImageAsset> = m.unplaced_images().collect();
        if !unplaced.is_empty() {
            out.push_str("<section class=\"gallery\">\n");
            for image in unplaced {
                write_figure(&mut out, image);
            }
            out.push_str("</section>\n");
        }

        if let Some(colophon) = &m.colophon {
            let _ = writeln!(
                out,
                "<footer class=\"colophon\"><p>{}</p></footer>",
                escape(colophon.as_str())
            );
        }
        out.push_str("</article>\n");

        if self.config.standalone {
            out.push_str("</body>\n</html>\n");
        }
        out
    }
}

impl Exporter for HtmlExporter {
    const FORMAT: Format = Format::Html;

    fn export<W: Write + Seek>(&self, content: &CompiledContent, writer: &mut W) -> Result<()> {
        let html = self.render_string(content)?;
        write_text(writer, Format::Html, &html)
    }
}

fn write_styles(out: &mut String, m: &Manuscript) {
    let t = &m.typography;
    let _ = write!(
        out,
        "<style>\n\
         body {{ font-family: {family}; font-size: {size}pt; text-align: {align}; \
         max-width: 40em; margin: 0 auto; padding: 2em 1em; line-height: 1.5; }}\n\
         .title-page {{ text-align: center; margin-bottom: 3em; }}\n\
         .toc ol {{ padding-left: 1.5em; }}\n\
         .toc-title {{ font-weight: bold; }}\n\
         section.block {{ margin-top: 3em; }}\n\
         figure {{ margin: 2em 0; text-align: center; }}\n\
         figure img, .cover {{ max-width: 100%; }}\n\
         .colophon {{ margin-top: 4em; text-align: center; font-size: 0.9em; }}\n\
         </style>\n",
        family = t.css_family(),
        size = t.size_pt,
        align = t.alignment.css(),
    );
}

fn write_title_section(out: &mut String, m: &Manuscript) {
    out.push_str("<header class=\"title-page\">\n");
    let _ = writeln!(out, "<h1>{}</h1>", escape(m.title.as_str()));
    let _ = writeln!(out, "<p class=\"byline\">by {}</p>", escape(m.author.as_str()));
    if let Some(ts) = &m.generated_at {
        let _ = writeln!(out, "<p class=\"generated\">{}</p>", escape(ts.as_str()));
    }
    if let Some(cover) = &m.cover {
        let _ = writeln!(
            out,
            "<img class=\"cover\" src=\"{}\" alt=\"Cover\">",
            escape(cover.url.as_str())
        );
    }
    out.push_str("</header>\n");
}

fn write_contents(out: &mut String, m: &Manuscript) {
    out.push_str("<nav class=\"toc\">\n<p class=\"toc-title\">Contents</p>\n<ol>\n");
    for entry in &m.toc {
        let _ = writeln!(
            out,
            "<li><a href=\"#{}\">{}</a></li>",
            escape(entry.anchor.as_str()),
            escape(entry.title.as_str())
        );
    }
    out.push_str("</ol>\n</nav>\n");
}

fn write_figure(out: &mut String, image: &ImageAsset) {
    let prompt = image.prompt.trim();
    let _ = write!(
        out,
        "<figure><img src=\"{}\" alt=\"{}\">",
        escape(image.url.as_str()),
        escape(prompt)
    );
    if !prompt.is_empty() {
        let _ = write!(out, "<figcaption>{}</figcaption>", escape(prompt));
    }
    out.push_str("</figure>\n");
}

fn write_spans(out: &mut String, spans: &[Span]) {
    for span in spans {
        let style = span.style;
        let tags: Vec<&str> = [
            (style.bold, "strong"),
            (style.italic, "em"),
            (style.strike, "del"),
            (style.code, "code"),
        ]
        .into_iter()
        .filter_map(|(on, tag)| on.then_some(tag))
        .collect();

        for tag in &tags {
            let _ = write!(out, "<{tag}>");
        }
        // Single newlines inside a paragraph are soft breaks.
        out.push_str(&escape(span.text.as_str()).replace('\n', "<br>\n"));
        for tag in tags.iter().rev() {
            let _ = write!(out, "</{tag}>");
        }
    }
}
