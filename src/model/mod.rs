//! Core data model for book rendering.
//!
//! This module contains:
//! - The compiled document model received from upstream ([`content`])
//! - The render-ready manuscript every exporter consumes ([`manuscript`])

mod content;
mod manuscript;

// Re-export input model
pub use content::{
    Assets, AuthorPosition, CompiledContent, CoverAsset, FontSizeToken, ImageAsset, RawSection,
    SectionBody, Structural, SubChapter, TypographyPrefs, UserInput,
};

pub(crate) use content::chapter_number_from;

// Re-export manuscript types
pub use manuscript::{Block, BlockKind, Manuscript, Markup};
