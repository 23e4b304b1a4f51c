//! The compiled document model handed over by the upstream compiler.
//!
//! Field names follow the camelCase wire format produced upstream, so a
//! [`CompiledContent`] can be deserialized straight from its JSON. Every field
//! is optional on the wire; required-ness is enforced when a manuscript is
//! prepared, never by fabricating values here.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One export request's worth of document content.
///
/// Read-only for the whole rendering pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompiledContent {
    pub title: Option<String>,
    pub author: Option<String>,
    pub sections: Vec<RawSection>,
    pub structural: Option<Structural>,
    pub assets: Option<Assets>,
    pub user_input: UserInput,
    /// Pre-resolved typography from an upstream formatter. Wins over
    /// `user_input` when present.
    pub typography_prefs: Option<TypographyPrefs>,
    /// Pre-rendered markup from the same upstream formatter.
    pub formatted_content: Option<String>,
    /// Caller-fixed timestamp; rendering never reads the clock.
    pub generated_at: Option<String>,
}

impl CompiledContent {
    /// Start a document with the given title and author.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            author: Some(author.into()),
            ..Default::default()
        }
    }

    /// Append a plain-text section.
    pub fn with_section(mut self, section: RawSection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn images(&self) -> &[ImageAsset] {
        self.assets.as_ref().map_or(&[], |a| a.images.as_slice())
    }

    pub fn cover(&self) -> Option<&CoverAsset> {
        self.assets.as_ref().and_then(|a| a.cover.as_ref())
    }
}

/// A section as received, before flattening.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSection {
    pub title: Option<String>,
    pub content: Option<SectionBody>,
    #[serde(deserialize_with = "lenient_chapter_number")]
    pub chapter_number: Option<u32>,
    pub metadata: Map<String, Value>,
}

impl RawSection {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(SectionBody::Text(content.into())),
            ..Default::default()
        }
    }

    /// A section whose content is a list of sub-chapters.
    pub fn with_parts(title: impl Into<String>, parts: Vec<SubChapter>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(SectionBody::Parts(parts)),
            ..Default::default()
        }
    }

    pub fn numbered(mut self, chapter_number: u32) -> Self {
        self.chapter_number = Some(chapter_number);
        self
    }
}

/// Section content: either a single body or a list of sub-chapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionBody {
    Text(String),
    Parts(Vec<SubChapter>),
}

/// One entry of a nested section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubChapter {
    /// Falls back to the parent section's title when absent.
    pub title: Option<String>,
    /// An explicit `null` is treated like an empty body and dropped later.
    pub content: Option<String>,
    #[serde(deserialize_with = "lenient_chapter_number")]
    pub chapter_number: Option<u32>,
    pub metadata: Map<String, Value>,
}

impl SubChapter {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Read a chapter number from an integer, a whole float or a numeric string.
///
/// Anything else, including negative or fractional values, yields `None`
/// and the number is assigned during normalization instead.
pub(crate) fn chapter_number_from(value: &Value) -> Option<u32> {
    let whole = |f: f64| {
        (f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&f)).then_some(f as u32)
    };
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(n) => u32::try_from(n).ok(),
            None => n.as_f64().and_then(whole),
        },
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u32>().ok().or_else(|| s.parse::<f64>().ok().and_then(whole))
        }
        _ => None,
    }
}

fn lenient_chapter_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(chapter_number_from))
}

/// Front matter and the planned table of contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Structural {
    pub foreword: Option<String>,
    pub introduction: Option<String>,
    /// Authoritative TOC from the structural planning step.
    pub table_of_contents_list: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assets {
    pub images: Vec<ImageAsset>,
    pub cover: Option<CoverAsset>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageAsset {
    pub url: String,
    pub prompt: String,
    pub chapter: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverAsset {
    pub url: String,
}

/// Presentation preferences entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInput {
    pub font_family: Option<String>,
    pub font_size: Option<FontSizeToken>,
    pub text_alignment: Option<String>,
    pub about_author: Option<String>,
    pub about_author_position: Option<AuthorPosition>,
    pub branding: Option<String>,
    /// Branding is shown when text is supplied unless explicitly disabled.
    pub show_branding: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypographyPrefs {
    pub font_family: Option<String>,
    pub font_size: Option<FontSizeToken>,
}

/// A font size as the user typed it: `12`, `"12pt"`, `"14 px"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontSizeToken {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorPosition {
    Start,
    #[default]
    End,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_wire_format() {
        let json = r#"{
            "title": "Demo",
            "author": "A. Writer",
            "sections": [
                {"title": "Opening", "content": "Hello world.", "chapterNumber": 1},
                {"title": "Parts", "content": [{"content": "one"}, {"title": "Two", "content": "two"}]},
                {"title": "Nothing", "content": null}
            ],
            "structural": {"tableOfContentsList": ["1. Opening"]},
            "assets": {"images": [{"url": "https://x/y.png", "prompt": "a cat", "chapter": 1}]},
            "userInput": {"fontFamily": "Georgia", "fontSize": "14pt", "aboutAuthorPosition": "start"},
            "typographyPrefs": {"fontSize": 11}
        }"#;

        let content: CompiledContent = serde_json::from_str(json).unwrap();

        assert_eq!(content.title.as_deref(), Some("Demo"));
        assert_eq!(content.sections.len(), 3);
        assert_eq!(content.sections[0].chapter_number, Some(1));
        assert!(matches!(
            content.sections[1].content,
            Some(SectionBody::Parts(ref parts)) if parts.len() == 2
        ));
        assert_eq!(content.sections[2].content, None);
        assert_eq!(
            content.user_input.font_size,
            Some(FontSizeToken::Text("14pt".to_string()))
        );
        assert_eq!(
            content.user_input.about_author_position,
            Some(AuthorPosition::Start)
        );
        assert_eq!(
            content.typography_prefs.as_ref().unwrap().font_size,
            Some(FontSizeToken::Number(11.0))
        );
        assert_eq!(content.images().len(), 1);
    }

    #[test]
    fn test_chapter_numbers_read_leniently() {
        let json = r#"[
            {"title": "A", "content": "a", "chapterNumber": "3"},
            {"title": "B", "content": "b", "chapterNumber": 4.0},
            {"title": "C", "content": "c", "chapterNumber": " 5 "},
            {"title": "D", "content": "d", "chapterNumber": 2.5},
            {"title": "E", "content": "e", "chapterNumber": -1},
            {"title": "F", "content": "f", "chapterNumber": null},
            {"title": "G", "content": [{"content": null, "chapterNumber": "6.0"}]}
        ]"#;
        let sections: Vec<RawSection> = serde_json::from_str(json).unwrap();
        let numbers: Vec<Option<u32>> = sections.iter().map(|s| s.chapter_number).collect();
        assert_eq!(
            numbers,
            vec![Some(3), Some(4), Some(5), None, None, None, None]
        );

        let Some(SectionBody::Parts(parts)) = &sections[6].content else {
            panic!("expected sub-chapters");
        };
        assert_eq!(parts[0].content, None);
        assert_eq!(parts[0].chapter_number, Some(6));
    }

    #[test]
    fn test_missing_fields_default() {
        let content: CompiledContent = serde_json::from_str("{}").unwrap();
        assert!(content.title.is_none());
        assert!(content.sections.is_empty());
        assert!(content.cover().is_none());
    }
}
