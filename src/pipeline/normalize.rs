//! Section normalization.
//!
//! Flattens nested sub-chapter lists into one ordered list of titled sections
//! and assigns display numbers. Sections without a usable title are dropped
//! with a warning; an empty result is fatal.

use serde_json::{Map, Value};

use crate::error::{StructuralError, Warning};
use crate::model::{RawSection, SectionBody, chapter_number_from};

use super::sanitize::sanitize_title;

/// A render-ready section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    /// Raw body text; sanitized later per output flavour.
    pub content: String,
    pub chapter_number: u32,
}

/// Result of normalization: the flat section list plus what was dropped.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub sections: Vec<Section>,
    pub warnings: Vec<Warning>,
}

/// Flatten raw sections into a non-empty, titled, ordered list.
pub fn normalize_sections(raw: &[RawSection]) -> Result<Normalized, StructuralError> {
    let mut out = Normalized::default();

    for (index, section) in raw.iter().enumerate() {
        let position = index + 1;
        let parent_title = section.title.as_deref().map(sanitize_title).unwrap_or_default();
        let parent_number = section
            .chapter_number
            .or_else(|| metadata_number(&section.metadata));

        match &section.content {
            Some(SectionBody::Parts(parts)) => {
                for part in parts {
                    let own_title = part.title.as_deref().map(sanitize_title).unwrap_or_default();
                    let title = if own_title.is_empty() {
                        parent_title.clone()
                    } else {
                        own_title
                    };
                    let number = part
                        .chapter_number
                        .or_else(|| metadata_number(&part.metadata))
                        .or(parent_number);
                    let body = part.content.as_deref().unwrap_or_default();
                    out.push(title, body, number, position);
                }
            }
            Some(SectionBody::Text(text)) => {
                out.push(parent_title, text, parent_number, position);
            }
            None => out.push(parent_title, "", parent_number, position),
        }
    }

    if out.sections.is_empty() {
        return Err(StructuralError::NoChapters);
    }

    tracing::debug!(
        sections = out.sections.len(),
        dropped = out.warnings.len(),
        "normalized sections"
    );
    Ok(out)
}

impl Normalized {
    fn push(&mut self, title: String, content: &str, number: Option<u32>, position: usize) {
        if title.is_empty() {
            let warning = Warning::UntitledSection { position };
            tracing::warn!(%warning, "dropping section");
            self.warnings.push(warning);
            return;
        }
        if content.trim().is_empty() {
            let warning = Warning::EmptySection { title };
            tracing::warn!(%warning, "dropping section");
            self.warnings.push(warning);
            return;
        }

        let chapter_number = number.unwrap_or(self.sections.len() as u32 + 1);
        self.sections.push(Section {
            title,
            content: content.to_string(),
            chapter_number,
        });
    }
}

/// `chapterNumber` from a metadata map, as an integer or numeric string.
fn metadata_number(metadata: &Map<String, Value>) -> Option<u32> {
    metadata.get("chapterNumber").and_then(chapter_number_from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SubChapter;
    use proptest::prelude::*;
    use serde_json::json;

    fn titles(normalized: &Normalized) -> Vec<&str> {
        normalized.sections.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn test_plain_sections_keep_list_order() {
        let raw = vec![
            RawSection::new("Second", "b").numbered(2),
            RawSection::new("First", "a").numbered(1),
        ];
        let out = normalize_sections(&raw).unwrap();
        assert_eq!(titles(&out), vec!["Second", "First"]);
        assert_eq!(out.sections[0].chapter_number, 2);
    }

    #[test]
    fn test_untitled_section_dropped_with_warning() {
        let raw = vec![
            RawSection::new("One", "a"),
            RawSection::new("", "orphan text"),
            RawSection {
                title: None,
                content: Some(SectionBody::Text("also orphan".to_string())),
                ..Default::default()
            },
            RawSection::new("Two", "b"),
        ];
        let out = normalize_sections(&raw).unwrap();
        assert_eq!(titles(&out), vec!["One", "Two"]);
        assert_eq!(
            out.warnings,
            vec![
                Warning::UntitledSection { position: 2 },
                Warning::UntitledSection { position: 3 }
            ]
        );
    }

    #[test]
    fn test_parts_flatten_and_inherit_title() {
        let raw = vec![RawSection::with_parts(
            "Journey",
            vec![
                SubChapter::new("first leg"),
                SubChapter::new("second leg").titled("The Pass"),
            ],
        )
        .numbered(4)];
        let out = normalize_sections(&raw).unwrap();
        assert_eq!(titles(&out), vec!["Journey", "The Pass"]);
        assert_eq!(out.sections[0].chapter_number, 4);
        assert_eq!(out.sections[1].chapter_number, 4);
    }

    #[test]
    fn test_numbers_from_metadata_then_position() {
        let mut with_meta = RawSection::new("Meta", "x");
        with_meta
            .metadata
            .insert("chapterNumber".to_string(), json!("7"));
        let raw = vec![RawSection::new("Plain", "x"), with_meta, RawSection::new("Last", "x")];
        let out = normalize_sections(&raw).unwrap();
        let numbers: Vec<u32> = out.sections.iter().map(|s| s.chapter_number).collect();
        assert_eq!(numbers, vec![1, 7, 3]);
    }

    #[test]
    fn test_null_and_blank_content_dropped() {
        let raw = vec![
            RawSection {
                title: Some("Null".to_string()),
                content: None,
                ..Default::default()
            },
            RawSection::new("Blank", "   \n "),
            RawSection::new("Kept", "text"),
        ];
        let out = normalize_sections(&raw).unwrap();
        assert_eq!(titles(&out), vec!["Kept"]);
        assert_eq!(out.warnings.len(), 2);
    }

    #[test]
    fn test_null_sub_chapter_dropped_like_null_section() {
        let raw: Vec<RawSection> = serde_json::from_value(json!([
            {"title": "Voyage", "chapterNumber": "2", "content": [
                {"title": "Adrift", "content": null},
                {"title": "Landfall", "content": "sand", "chapterNumber": 3.0}
            ]}
        ]))
        .unwrap();
        let out = normalize_sections(&raw).unwrap();
        assert_eq!(titles(&out), vec!["Landfall"]);
        assert_eq!(out.sections[0].chapter_number, 3);
        assert_eq!(
            out.warnings,
            vec![Warning::EmptySection {
                title: "Adrift".to_string()
            }]
        );
    }

    #[test]
    fn test_metadata_number_accepts_whole_floats() {
        let mut section = RawSection::new("Meta", "x");
        section
            .metadata
            .insert("chapterNumber".to_string(), json!(9.0));
        let out = normalize_sections(&[section]).unwrap();
        assert_eq!(out.sections[0].chapter_number, 9);
    }

    #[test]
    fn test_empty_result_is_fatal() {
        let raw = vec![RawSection::new("", "orphan")];
        assert_eq!(
            normalize_sections(&raw).unwrap_err(),
            StructuralError::NoChapters
        );
        assert_eq!(normalize_sections(&[]).unwrap_err(), StructuralError::NoChapters);
    }

    #[test]
    fn test_markup_only_title_is_untitled() {
        let raw = vec![RawSection::new("  ## ", "text"), RawSection::new("Real", "text")];
        let out = normalize_sections(&raw).unwrap();
        assert_eq!(titles(&out), vec!["Real"]);
    }

    proptest! {
        #[test]
        fn prop_never_emits_empty_titles(
            entries in proptest::collection::vec(("[ a-z#*]{0,8}", "[ a-z]{0,8}"), 0..12)
        ) {
            let raw: Vec<RawSection> = entries
                .iter()
                .map(|(title, body)| RawSection::new(title.clone(), body.clone()))
                .collect();
            if let Ok(out) = normalize_sections(&raw) {
                prop_assert!(!out.sections.is_empty());
                for section in &out.sections {
                    prop_assert!(!section.title.trim().is_empty());
                }
            }
        }
    }
}
