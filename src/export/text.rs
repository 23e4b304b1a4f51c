//! Plain-text exporter.
//!
//! Emits Markdown-flavoured text: a title block, a numbered table of contents
//! linking to heading anchors, one `##` heading per block with its paragraphs,
//! and an image gallery. Emphasis is stripped; the output depends on nothing
//! but the content, so identical input gives byte-identical output.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::io::{Seek, Write};

use crate::error::{Error, Result};
use crate::model::{CompiledContent, ImageAsset, Manuscript, Markup};
use crate::pipeline::anchor_id;

use super::{Exporter, Format, write_text};

/// Configuration for plain-text export.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// List images and the cover at the end.
    pub include_gallery: bool,
    /// Put a `---` rule between blocks.
    pub separator_between_blocks: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            include_gallery: true,
            separator_between_blocks: true,
        }
    }
}

/// Exporter for plain-text output.
#[derive(Debug, Clone, Default)]
pub struct MarkdownExporter {
    config: MarkdownConfig,
}

impl MarkdownExporter {
    /// Create a new MarkdownExporter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a MarkdownExporter with the specified configuration.
    pub fn with_config(config: MarkdownConfig) -> Self {
        Self { config }
    }

    /// Render the content to a string.
    pub fn render_string(&self, content: &CompiledContent) -> Result<String> {
        let manuscript = Manuscript::prepare(content, Markup::Plain)
            .map_err(|e| Error::structural(Format::Markdown, e))?;
        Ok(self.render_manuscript(&manuscript))
    }

    fn render_manuscript(&self, m: &Manuscript) -> String {
        let mut out = String::new();
        let mut slugs = HeadingSlugs::default();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "# {}\n", m.title);
        let _ = writeln!(out, "by {}\n", m.author);
        if let Some(ts) = &m.generated_at {
            let _ = writeln!(out, "Generated: {ts}\n");
        }

        out.push_str("### Table of Contents\n\n");
        for (i, block) in m.blocks.iter().enumerate() {
            let slug = slugs.claim(&block.heading);
            let _ = writeln!(
                out,
                "{}. [{}](#{})",
                i + 1,
                escape_link_text(&block.title),
                slug
            );
        }

        for (i, block) in m.blocks.iter().enumerate() {
            out.push('\n');
            if i > 0 && self.config.separator_between_blocks {
                out.push_str("---\n\n");
            }
            let _ = writeln!(out, "## {}", block.heading);
            for paragraph in block.paragraphs() {
                let _ = write!(out, "\n{paragraph}\n");
            }
        }

        if self.config.include_gallery && (!m.images.is_empty() || m.cover.is_some()) {
            out.push_str("\n### Image Gallery\n\n");
            if let Some(cover) = &m.cover {
                let _ = writeln!(out, "- Cover: {}", image_reference("Cover", &cover.url));
            }
            for image in &m.images {
                let _ = writeln!(out, "- {}", gallery_line(image));
            }
        }

        if let Some(colophon) = &m.colophon {
            let _ = write!(out, "\n{colophon}\n");
        }

        out
    }
}

impl Exporter for MarkdownExporter {
    const FORMAT: Format = Format::Markdown;

    fn export<W: Write + Seek>(&self, content: &CompiledContent, writer: &mut W) -> Result<()> {
        let text = self.render_string(content)?;
        write_text(writer, Format::Markdown, &text)
    }
}

/// GitHub-style heading slugs with `-1`, `-2` suffixes for repeats.
///
/// A suffix never reuses a slug already handed out, even one that came from
/// a literal heading such as "Same 1".
#[derive(Debug, Default)]
struct HeadingSlugs {
    seen: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl HeadingSlugs {
    fn claim(&mut self, heading: &str) -> String {
        let base = anchor_id(heading);
        let count = self.seen.entry(base.clone()).or_insert(0);
        let mut slug = if *count == 0 {
            base.clone()
        } else {
            format!("{base}-{count}")
        };
        while self.issued.contains(&slug) {
            *count += 1;
            slug = format!("{base}-{count}");
        }
        *count += 1;
        self.issued.insert(slug.clone());
        slug
    }
}

fn escape_link_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn image_reference(alt: &str, url: &str) -> String {
    if let Some(rest) = url.strip_prefix("data:") {
        let mime = rest.split([';', ',']).next().unwrap_or_default();
        let mime = if mime.is_empty() { "image" } else { mime };
        return format!("{alt} (embedded {mime} data)");
    }
    let url = if url.contains([' ', '(', ')']) {
        format!("<{url}>")
    } else {
        url.to_string()
    };
    format!("![{}]({url})", escape_link_text(alt))
}

fn gallery_line(image: &ImageAsset) -> String {
    let alt = image.prompt.split_whitespace().collect::<Vec<_>>().join(" ");
    let alt = if alt.is_empty() { "Image".to_string() } else { alt };
    let reference = image_reference(&alt, &image.url);
    match image.chapter {
        Some(n) => format!("{reference} (Chapter {n})"),
        None => reference,
    }
}
