//! Shared pre-render stages.
//!
//! Every exporter runs the same pipeline once per call, so all formats see
//! identical chapters, headings and anchors:
//!
//! - [`normalize`]: flatten and validate raw sections
//! - [`sanitize`]: strip leaked control text and unsupported markup
//! - [`typography`]: map font preferences to renderer-native identifiers
//! - [`toc`]: build the authoritative table of contents
//! - [`slug`]: deterministic anchor ids
//! - [`inline`]: emphasis spans for formats with native runs

mod inline;
mod normalize;
mod sanitize;
mod slug;
mod toc;
mod typography;

pub use inline::{Span, SpanStyle, parse_spans};
pub use normalize::{Normalized, Section, normalize_sections};
pub use sanitize::{sanitize, sanitize_title, sanitize_with};
pub use slug::{AnchorSet, anchor_id};
pub use toc::{FrontMatter, TableOfContents, TocEntry, build_toc, strip_ordinal};
pub use typography::{
    Alignment, DEFAULT_FONT_SIZE, FontClass, MAX_FONT_SIZE, MIN_FONT_SIZE, Typography,
    classify_family, resolve_font_size, resolve_typography,
};

use crate::error::StructuralError;
use crate::model::{Block, BlockKind, CompiledContent, Manuscript, Markup};

/// Build a [`Manuscript`] from compiled content.
///
/// Document title and author are required; they are never replaced with
/// placeholders.
pub fn prepare(content: &CompiledContent, markup: Markup) -> Result<Manuscript, StructuralError> {
    let title = required(content.title.as_deref(), "title")?;
    let author = required(content.author.as_deref(), "author")?;

    let Normalized { sections, warnings } = normalize_sections(&content.sections)?;

    let structural = content.structural.as_ref();
    let foreword = optional_body(structural.and_then(|s| s.foreword.as_deref()), markup);
    let introduction = optional_body(structural.and_then(|s| s.introduction.as_deref()), markup);
    let about_author = optional_body(content.user_input.about_author.as_deref(), markup);

    let front = FrontMatter {
        foreword: foreword.is_some(),
        introduction: introduction.is_some(),
        about_author: about_author
            .as_ref()
            .map(|_| content.user_input.about_author_position.unwrap_or_default()),
    };
    let planned = structural.and_then(|s| s.table_of_contents_list.as_deref());
    let toc = build_toc(&sections, front, planned)?;

    let blocks = toc
        .iter()
        .map(|entry| {
            let body = match entry.kind {
                BlockKind::Foreword => foreword.clone().unwrap_or_default(),
                BlockKind::Introduction => introduction.clone().unwrap_or_default(),
                BlockKind::AboutAuthor => about_author.clone().unwrap_or_default(),
                BlockKind::Chapter { section, .. } => sections
                    .get(section)
                    .map(|s| sanitize_with(&s.content, markup))
                    .unwrap_or_default(),
            };
            let heading = match entry.kind {
                BlockKind::Chapter { number, .. } => format!("Chapter {number}: {}", entry.title),
                _ => entry.title.clone(),
            };
            Block {
                kind: entry.kind,
                title: entry.title.clone(),
                heading,
                body,
                anchor: entry.anchor.clone(),
            }
        })
        .collect();

    let user = &content.user_input;
    let colophon = user
        .branding
        .as_deref()
        .map(sanitize_title)
        .filter(|b| !b.is_empty() && user.show_branding.unwrap_or(true));

    let formatted_content = content
        .formatted_content
        .as_ref()
        .filter(|f| content.typography_prefs.is_some() && !f.trim().is_empty())
        .cloned();

    tracing::debug!(
        title = %title,
        blocks = toc.len(),
        dropped = warnings.len(),
        "manuscript prepared"
    );

    Ok(Manuscript {
        title,
        author,
        blocks,
        typography: resolve_typography(&content.user_input, content.typography_prefs.as_ref()),
        toc,
        images: content.images().to_vec(),
        cover: content.cover().cloned(),
        colophon,
        generated_at: content.generated_at.clone(),
        formatted_content,
        warnings,
    })
}

fn required(value: Option<&str>, field: &'static str) -> Result<String, StructuralError> {
    let value = value.map(sanitize_title).unwrap_or_default();
    if value.is_empty() {
        return Err(StructuralError::MissingMetadata(field));
    }
    Ok(value)
}

fn optional_body(value: Option<&str>, markup: Markup) -> Option<String> {
    value
        .map(|v| sanitize_with(v, markup))
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AuthorPosition, RawSection, Structural, UserInput};
    use pretty_assertions::assert_eq;

    fn demo() -> CompiledContent {
        CompiledContent::new("Demo", "A. Writer").with_section(
            RawSection::new("Opening", "Hello world.\n\nSecond paragraph.").numbered(1),
        )
    }

    #[test]
    fn test_demo_manuscript() {
        let m = Manuscript::prepare(&demo(), Markup::Plain).unwrap();
        assert_eq!(m.toc.titles(), vec!["Opening"]);
        assert_eq!(m.blocks.len(), 1);
        assert_eq!(m.blocks[0].heading, "Chapter 1: Opening");
        assert_eq!(
            m.blocks[0].paragraphs().collect::<Vec<_>>(),
            vec!["Hello world.", "Second paragraph."]
        );
    }

    #[test]
    fn test_missing_title_rejected() {
        let mut content = demo();
        content.title = Some("   ".to_string());
        assert_eq!(
            prepare(&content, Markup::Plain).unwrap_err(),
            StructuralError::MissingMetadata("title")
        );

        let mut content = demo();
        content.author = None;
        assert_eq!(
            prepare(&content, Markup::Plain).unwrap_err(),
            StructuralError::MissingMetadata("author")
        );
    }

    #[test]
    fn test_front_matter_blocks() {
        let mut content = demo();
        content.structural = Some(Structural {
            foreword: Some("A word first.".to_string()),
            introduction: Some("   ".to_string()),
            table_of_contents_list: None,
        });
        content.user_input = UserInput {
            about_author: Some("Writes things.".to_string()),
            about_author_position: Some(AuthorPosition::Start),
            ..Default::default()
        };

        let m = prepare(&content, Markup::Plain).unwrap();
        let headings: Vec<&str> = m.blocks.iter().map(|b| b.heading.as_str()).collect();
        assert_eq!(
            headings,
            vec!["About the Author", "Foreword", "Chapter 1: Opening"]
        );
        assert_eq!(m.blocks.len(), m.toc.len());
    }

    #[test]
    fn test_markup_flavour_applies_to_bodies() {
        let content = CompiledContent::new("T", "A")
            .with_section(RawSection::new("Bold", "Some **strong** words."));

        let plain = prepare(&content, Markup::Plain).unwrap();
        let rich = prepare(&content, Markup::Rich).unwrap();
        assert_eq!(plain.blocks[0].body, "Some strong words.");
        assert_eq!(rich.blocks[0].body, "Some **strong** words.");
        assert_eq!(plain.toc, rich.toc);
    }

    #[test]
    fn test_branding_respects_flag() {
        let mut content = demo();
        content.user_input.branding = Some("Made with Quire".to_string());
        assert_eq!(
            prepare(&content, Markup::Plain).unwrap().colophon.as_deref(),
            Some("Made with Quire")
        );

        content.user_input.show_branding = Some(false);
        assert!(prepare(&content, Markup::Plain).unwrap().colophon.is_none());
    }

    #[test]
    fn test_formatted_content_requires_prefs() {
        let mut content = demo();
        content.formatted_content = Some("<h1>Opening</h1><p>x</p>".to_string());
        assert!(prepare(&content, Markup::Rich).unwrap().formatted_content.is_none());

        content.typography_prefs = Some(Default::default());
        assert!(prepare(&content, Markup::Rich).unwrap().formatted_content.is_some());
    }
}
