//! Table-of-contents construction.
//!
//! The entry list built here is the single source of headings: every renderer
//! emits exactly one heading per entry, in entry order.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::StructuralError;
use crate::model::{AuthorPosition, BlockKind};

use super::normalize::Section;
use super::sanitize::sanitize_title;
use super::slug::AnchorSet;

static ORDINAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(?i:chapter)\s+(?:\d+|[IVXLCDMivxlcdm]+)\b\s*[:.)\-–—]?\s*|(?:\d+|[IVXLCDM]+)\s*[.)]\s+)",
    )
    .unwrap()
});

/// One navigable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    pub anchor: String,
    pub kind: BlockKind,
}

/// Ordered table-of-contents entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOfContents {
    entries: Vec<TocEntry>,
}

impl TableOfContents {
    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TocEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.title.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a TableOfContents {
    type Item = &'a TocEntry;
    type IntoIter = std::slice::Iter<'a, TocEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// What the document contains besides chapters.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontMatter {
    pub foreword: bool,
    pub introduction: bool,
    pub about_author: Option<AuthorPosition>,
}

/// Strip a leading ordinal (`3.`, `IV)`, `Chapter 3:`) from a planned entry.
///
/// Returns the input unchanged if nothing would be left.
pub fn strip_ordinal(entry: &str) -> String {
    let stripped = ORDINAL_RE.replace(entry, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        entry.trim().to_string()
    } else {
        stripped.to_string()
    }
}

/// Build the table of contents.
///
/// Derived order: about-author (position `start`), foreword, introduction,
/// sections in list order, about-author (position `end`). A non-empty
/// `planned` list retitles the chapters; front-matter labels in it are
/// matched to their blocks and skipped.
pub fn build_toc(
    sections: &[Section],
    front: FrontMatter,
    planned: Option<&[String]>,
) -> Result<TableOfContents, StructuralError> {
    let mut derived: Vec<(BlockKind, String)> = Vec::with_capacity(sections.len() + 3);

    let about = |derived: &mut Vec<(BlockKind, String)>| {
        derived.push((BlockKind::AboutAuthor, "About the Author".to_string()));
    };

    if front.about_author == Some(AuthorPosition::Start) {
        about(&mut derived);
    }
    if front.foreword {
        derived.push((BlockKind::Foreword, "Foreword".to_string()));
    }
    if front.introduction {
        derived.push((BlockKind::Introduction, "Introduction".to_string()));
    }
    for (index, section) in sections.iter().enumerate() {
        derived.push((
            BlockKind::Chapter {
                number: section.chapter_number,
                section: index,
            },
            section.title.clone(),
        ));
    }
    if front.about_author == Some(AuthorPosition::End) {
        about(&mut derived);
    }

    let planned: Vec<String> = planned
        .unwrap_or_default()
        .iter()
        .map(|entry| strip_ordinal(&sanitize_title(entry)))
        .filter(|entry| !entry.is_empty())
        .collect();

    if !planned.is_empty() {
        apply_planned(&mut derived, planned, sections.len())?;
    }

    let mut anchors = AnchorSet::new();
    let entries = derived
        .into_iter()
        .enumerate()
        .map(|(i, (kind, title))| TocEntry {
            anchor: anchors.claim(&title, &format!("block-{}", i + 1)),
            title,
            kind,
        })
        .collect();

    Ok(TableOfContents { entries })
}

/// Retitle chapters from the planned list.
///
/// Entries naming a front-matter block that exists (`Foreword`,
/// `Introduction`, `About the Author`) are matched to it and keep its label;
/// the rest must line up one-to-one with the chapters.
fn apply_planned(
    derived: &mut [(BlockKind, String)],
    planned: Vec<String>,
    chapters: usize,
) -> Result<(), StructuralError> {
    let entries = planned.len();
    let mut front: Vec<&'static str> = derived
        .iter()
        .filter_map(|(kind, _)| kind.label())
        .collect();

    let chapter_titles: Vec<String> = planned
        .into_iter()
        .filter(|entry| {
            match front
                .iter()
                .position(|label| label.eq_ignore_ascii_case(entry))
            {
                Some(i) => {
                    front.remove(i);
                    false
                }
                None => true,
            }
        })
        .collect();

    if chapter_titles.len() != chapters {
        return Err(StructuralError::TocMismatch {
            entries,
            blocks: derived.len(),
            chapters,
        });
    }

    let mut titles = chapter_titles.into_iter();
    for (kind, title) in derived.iter_mut() {
        if let BlockKind::Chapter { .. } = kind
            && let Some(next) = titles.next()
        {
            *title = next;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn section(title: &str, number: u32) -> Section {
        Section {
            title: title.to_string(),
            content: "text".to_string(),
            chapter_number: number,
        }
    }

    fn planned(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_single_chapter() {
        let toc = build_toc(&[section("Opening", 1)], FrontMatter::default(), None).unwrap();
        assert_eq!(toc.titles(), vec!["Opening"]);
        assert_eq!(toc.entries()[0].anchor, "opening");
    }

    #[test]
    fn test_front_matter_order_about_end() {
        let front = FrontMatter {
            foreword: true,
            introduction: true,
            about_author: Some(AuthorPosition::End),
        };
        let toc = build_toc(&[section("A", 1), section("B", 2)], front, None).unwrap();
        assert_eq!(
            toc.titles(),
            vec!["Foreword", "Introduction", "A", "B", "About the Author"]
        );
    }

    #[test]
    fn test_about_author_start() {
        let front = FrontMatter {
            foreword: true,
            about_author: Some(AuthorPosition::Start),
            ..Default::default()
        };
        let toc = build_toc(&[section("A", 1)], front, None).unwrap();
        assert_eq!(toc.titles(), vec!["About the Author", "Foreword", "A"]);
    }

    #[test]
    fn test_planned_list_overrides_chapters() {
        let front = FrontMatter {
            foreword: true,
            ..Default::default()
        };
        let list = planned(&["1. The Beginning", "Chapter 2: The Middle"]);
        let toc = build_toc(&[section("A", 1), section("B", 2)], front, Some(&list)).unwrap();
        assert_eq!(toc.titles(), vec!["Foreword", "The Beginning", "The Middle"]);
    }

    #[test]
    fn test_planned_front_matter_entries_match_by_label() {
        let front = FrontMatter {
            foreword: true,
            about_author: Some(AuthorPosition::End),
            ..Default::default()
        };
        let list = planned(&["Foreword", "IV. Storm", "V. Calm", "About the Author"]);
        let toc = build_toc(&[section("A", 1), section("B", 2)], front, Some(&list)).unwrap();
        assert_eq!(
            toc.titles(),
            vec!["Foreword", "Storm", "Calm", "About the Author"]
        );
        assert_eq!(toc.entries()[0].kind, BlockKind::Foreword);
        assert_eq!(toc.entries()[3].kind, BlockKind::AboutAuthor);
    }

    #[test]
    fn test_planned_list_never_renames_front_matter() {
        let front = FrontMatter {
            foreword: true,
            ..Default::default()
        };
        let list = planned(&["Preface", "IV. Storm"]);
        let err = build_toc(&[section("A", 1)], front, Some(&list)).unwrap_err();
        assert_eq!(
            err,
            StructuralError::TocMismatch {
                entries: 2,
                blocks: 2,
                chapters: 1
            }
        );
    }

    #[test]
    fn test_planned_chapters_exceeding_retained_sections_is_fatal() {
        // The list length equals the block count, but not by kind.
        let front = FrontMatter {
            foreword: true,
            ..Default::default()
        };
        let list = planned(&["Arrival", "Lost", "Departure"]);
        let sections = [section("Arrival", 1), section("Departure", 3)];
        let err = build_toc(&sections, front, Some(&list)).unwrap_err();
        assert_eq!(
            err,
            StructuralError::TocMismatch {
                entries: 3,
                blocks: 3,
                chapters: 2
            }
        );
    }

    #[test]
    fn test_planned_list_mismatch_is_fatal() {
        let list = planned(&["One", "Two", "Three"]);
        let err = build_toc(&[section("A", 1)], FrontMatter::default(), Some(&list)).unwrap_err();
        assert_eq!(
            err,
            StructuralError::TocMismatch {
                entries: 3,
                blocks: 1,
                chapters: 1
            }
        );
    }

    #[test]
    fn test_empty_planned_list_ignored() {
        let list = planned(&["", "   "]);
        let toc = build_toc(&[section("A", 1)], FrontMatter::default(), Some(&list)).unwrap();
        assert_eq!(toc.titles(), vec!["A"]);
    }

    #[test]
    fn test_strip_ordinal() {
        assert_eq!(strip_ordinal("1. Opening"), "Opening");
        assert_eq!(strip_ordinal("12) Opening"), "Opening");
        assert_eq!(strip_ordinal("Chapter 3 - Storm"), "Storm");
        assert_eq!(strip_ordinal("chapter iv: Storm"), "Storm");
        assert_eq!(strip_ordinal("XII. Storm"), "Storm");
        assert_eq!(strip_ordinal("Chapter 3"), "Chapter 3");
        assert_eq!(strip_ordinal("1984"), "1984");
        assert_eq!(strip_ordinal("Mix. Storm"), "Mix. Storm");
    }

    #[test]
    fn test_duplicate_titles_get_unique_anchors() {
        let toc = build_toc(
            &[section("Part", 1), section("Part", 2)],
            FrontMatter::default(),
            None,
        )
        .unwrap();
        assert_eq!(toc.entries()[0].anchor, "part");
        assert_eq!(toc.entries()[1].anchor, "part-2");
    }
}
