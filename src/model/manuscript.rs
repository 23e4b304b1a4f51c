//! The render-ready plan every exporter consumes.

use crate::error::{StructuralError, Warning};
use crate::pipeline::{self, TableOfContents, Typography};

use super::content::{CompiledContent, CoverAsset, ImageAsset};

/// How much inline markup section bodies keep after sanitizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Markup {
    /// Emphasis tokens are stripped (plain text, PDF).
    #[default]
    Plain,
    /// Bold, italic, strike and code tokens survive for native runs (HTML, DOCX).
    Rich,
}

/// What a headed block of the document is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Foreword,
    Introduction,
    /// `section` indexes the normalized section list; `number` is for display only.
    Chapter { number: u32, section: usize },
    AboutAuthor,
}

impl BlockKind {
    /// Default title for non-chapter blocks.
    pub fn label(self) -> Option<&'static str> {
        match self {
            BlockKind::Foreword => Some("Foreword"),
            BlockKind::Introduction => Some("Introduction"),
            BlockKind::AboutAuthor => Some("About the Author"),
            BlockKind::Chapter { .. } => None,
        }
    }

    pub fn chapter_number(self) -> Option<u32> {
        match self {
            BlockKind::Chapter { number, .. } => Some(number),
            _ => None,
        }
    }
}

/// One headed unit of output: foreword, introduction, chapter or about-author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Title as listed in the table of contents.
    pub title: String,
    /// Text drawn as the block heading.
    pub heading: String,
    /// Sanitized body; paragraphs separated by blank lines.
    pub body: String,
    /// Unique, deterministic anchor id.
    pub anchor: String,
}

impl Block {
    /// Non-empty paragraphs of the body, in order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.body
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// A normalized, sanitized document with its table of contents resolved.
#[derive(Debug, Clone)]
pub struct Manuscript {
    pub title: String,
    pub author: String,
    pub blocks: Vec<Block>,
    pub toc: TableOfContents,
    pub typography: Typography,
    pub images: Vec<ImageAsset>,
    pub cover: Option<CoverAsset>,
    /// Branding line, present only when enabled.
    pub colophon: Option<String>,
    pub generated_at: Option<String>,
    /// Pre-rendered markup, present only when the upstream formatter supplied
    /// both typography and content.
    pub formatted_content: Option<String>,
    pub warnings: Vec<Warning>,
}

impl Manuscript {
    /// Run normalizer, sanitizer, typography resolver and TOC builder.
    pub fn prepare(content: &CompiledContent, markup: Markup) -> Result<Self, StructuralError> {
        pipeline::prepare(content, markup)
    }

    pub fn chapters(&self) -> impl Iterator<Item = &Block> {
        self.blocks
            .iter()
            .filter(|b| matches!(b.kind, BlockKind::Chapter { .. }))
    }

    /// Images assigned to the given chapter number.
    pub fn images_for(&self, chapter: u32) -> impl Iterator<Item = &ImageAsset> {
        self.images
            .iter()
            .filter(move |img| img.chapter == Some(chapter))
    }

    /// Images without a matching chapter block.
    pub fn unplaced_images(&self) -> impl Iterator<Item = &ImageAsset> {
        self.images.iter().filter(|img| {
            img.chapter
                .is_none_or(|n| !self.chapters().any(|b| b.kind.chapter_number() == Some(n)))
        })
    }

    pub fn record(&mut self, warning: Warning) {
        tracing::warn!(%warning, "content dropped");
        self.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_skip_blank_runs() {
        let block = Block {
            kind: BlockKind::Foreword,
            title: "Foreword".to_string(),
            heading: "Foreword".to_string(),
            body: "One.\n\n  \n\nTwo.".to_string(),
            anchor: "foreword".to_string(),
        };
        assert_eq!(block.paragraphs().collect::<Vec<_>>(), vec!["One.", "Two."]);
    }

    #[test]
    fn test_labels() {
        assert_eq!(BlockKind::AboutAuthor.label(), Some("About the Author"));
        assert_eq!(
            BlockKind::Chapter {
                number: 2,
                section: 0
            }
            .label(),
            None
        );
    }
}
