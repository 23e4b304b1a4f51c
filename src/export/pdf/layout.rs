//! Page and cursor tracking.
//!
//! A [`PageLayout`] owns every page of the document as a list of drawing
//! operations in PDF user space (origin bottom-left). Pages stay editable
//! until the layout is handed to the writer, which is what lets the table of
//! contents be filled in after the chapters it points to have been laid out.

use crate::pipeline::Alignment;

use super::metrics::{Face, FontSet};

/// Paper sizes, in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    #[default]
    Letter,
    A4,
}

impl PaperSize {
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PaperSize::Letter => (612.0, 792.0),
            PaperSize::A4 => (595.28, 841.89),
        }
    }
}

/// Page margins, in points.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 72.0,
            right: 72.0,
            bottom: 72.0,
            left: 72.0,
        }
    }
}

/// Stable reference to a page created by a [`PageLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageHandle(usize);

impl PageHandle {
    /// Zero-based page index.
    pub fn index(self) -> usize {
        self.0
    }

    /// One-based page number as printed.
    pub fn number(self) -> usize {
        self.0 + 1
    }
}

/// One drawing operation on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// A single line of text with its baseline at `y`.
    Text {
        x: f32,
        y: f32,
        face: Face,
        size: f32,
        /// Extra space added to every space character (justified lines).
        word_spacing: f32,
        text: String,
    },
    /// A clickable area jumping to `target`, scrolled to `target_y`.
    Link {
        rect: [f32; 4],
        target: PageHandle,
        target_y: f32,
    },
}

/// Drawing operations of one page, in paint order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageCanvas {
    ops: Vec<DrawOp>,
}

impl PageCanvas {
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Text of every text operation on the page.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Link { .. } => None,
        })
    }

    pub fn links(&self) -> impl Iterator<Item = (&[f32; 4], PageHandle, f32)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Link {
                rect,
                target,
                target_y,
            } => Some((rect, *target, *target_y)),
            DrawOp::Text { .. } => None,
        })
    }
}

/// A drawing call referred to a page this layout never created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("page {0} does not exist")]
pub struct MissingPage(pub usize);

/// Page/cursor state machine.
#[derive(Debug, Clone)]
pub struct PageLayout {
    width: f32,
    height: f32,
    margins: Margins,
    fonts: FontSet,
    pages: Vec<PageCanvas>,
    cursor_y: f32,
}

impl PageLayout {
    /// Start a layout with one empty page.
    pub fn new(paper: PaperSize, margins: Margins, fonts: FontSet) -> Self {
        let (width, height) = paper.dimensions();
        Self {
            width,
            height,
            margins,
            fonts,
            pages: vec![PageCanvas::default()],
            cursor_y: height - margins.top,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn fonts(&self) -> FontSet {
        self.fonts
    }

    pub fn content_width(&self) -> f32 {
        self.width - self.margins.left - self.margins.right
    }

    /// Right edge of the text area.
    pub fn right(&self) -> f32 {
        self.width - self.margins.right
    }

    fn top(&self) -> f32 {
        self.height - self.margins.top
    }

    pub fn cursor_y(&self) -> f32 {
        self.cursor_y
    }

    /// Move the cursor down by `dy` without drawing.
    pub fn advance(&mut self, dy: f32) {
        self.cursor_y -= dy;
    }

    /// Place the cursor at an absolute height on the current page.
    pub fn move_to(&mut self, y: f32) {
        self.cursor_y = y.min(self.top());
    }

    pub fn current(&self) -> PageHandle {
        PageHandle(self.pages.len() - 1)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[PageCanvas] {
        &self.pages
    }

    /// Handles of every page, in order.
    pub fn handles(&self) -> impl Iterator<Item = PageHandle> + use<> {
        (0..self.pages.len()).map(PageHandle)
    }

    pub fn page(&self, handle: PageHandle) -> Option<&PageCanvas> {
        self.pages.get(handle.0)
    }

    /// Unconditionally start a new page.
    pub fn page_break(&mut self) -> PageHandle {
        self.pages.push(PageCanvas::default());
        self.cursor_y = self.top();
        self.current()
    }

    /// Start a new page if `height` does not fit above the bottom margin.
    ///
    /// A block taller than a whole page is left where it is when the cursor
    /// is already at the top. Returns whether a page was added.
    pub fn ensure_space(&mut self, height: f32) -> bool {
        let at_top = self.cursor_y >= self.top();
        if self.cursor_y - height < self.margins.bottom && !at_top {
            self.page_break();
            return true;
        }
        false
    }

    /// Width of `text` in points.
    pub fn text_width(&self, face: Face, size: f32, text: &str) -> f32 {
        self.fonts.text_width(face, size, text)
    }

    /// Draw one line at the cursor and move down by `leading`.
    ///
    /// Returns the page and baseline the line was drawn at.
    pub fn write_line(
        &mut self,
        text: &str,
        face: Face,
        size: f32,
        leading: f32,
        align: Alignment,
    ) -> (PageHandle, f32) {
        self.place_line(text, face, size, leading, align, true)
    }

    /// Draw a bold heading, wrapped, keeping it on one page together with
    /// the first line that follows it.
    ///
    /// Returns the page and the top of the heading.
    pub fn write_heading(&mut self, text: &str, size: f32, leading: f32) -> (PageHandle, f32) {
        let lines = self.wrap(text, Face::Bold, size, self.content_width());
        self.ensure_space(leading * (lines.len() + 1) as f32);
        let start = (self.current(), self.cursor_y);
        for line in &lines {
            self.place_line(line, Face::Bold, size, leading, Alignment::Left, true);
        }
        start
    }

    /// Greedy-wrap `text` to the content width and draw it line by line.
    ///
    /// Returns the number of lines drawn.
    pub fn write_paragraph(
        &mut self,
        text: &str,
        face: Face,
        size: f32,
        leading: f32,
        align: Alignment,
    ) -> usize {
        let lines = self.wrap(text, face, size, self.content_width());
        let count = lines.len();
        for (i, line) in lines.iter().enumerate() {
            self.place_line(line, face, size, leading, align, i + 1 == count);
        }
        count
    }

    fn place_line(
        &mut self,
        text: &str,
        face: Face,
        size: f32,
        leading: f32,
        align: Alignment,
        last: bool,
    ) -> (PageHandle, f32) {
        self.ensure_space(leading);
        let baseline = self.cursor_y - size;
        let width = self.text_width(face, size, text);
        let spare = (self.content_width() - width).max(0.0);

        let (x, word_spacing) = match align {
            Alignment::Left => (self.margins.left, 0.0),
            Alignment::Center => (self.margins.left + spare / 2.0, 0.0),
            Alignment::Right => (self.margins.left + spare, 0.0),
            Alignment::Justify => {
                let gaps = text.matches(' ').count();
                if last || gaps == 0 {
                    (self.margins.left, 0.0)
                } else {
                    (self.margins.left, spare / gaps as f32)
                }
            }
        };

        let handle = self.current();
        self.push(
            handle,
            DrawOp::Text {
                x,
                y: baseline,
                face,
                size,
                word_spacing,
                text: text.to_string(),
            },
        );
        self.cursor_y -= leading;
        (handle, baseline)
    }

    /// Draw text at an absolute position on any page created so far.
    pub fn draw_text_at(
        &mut self,
        page: PageHandle,
        x: f32,
        y: f32,
        face: Face,
        size: f32,
        text: &str,
    ) -> Result<(), MissingPage> {
        self.check(page)?;
        self.push(
            page,
            DrawOp::Text {
                x,
                y,
                face,
                size,
                word_spacing: 0.0,
                text: text.to_string(),
            },
        );
        Ok(())
    }

    /// Add an internal link on `page` covering `rect`.
    pub fn add_link(
        &mut self,
        page: PageHandle,
        rect: [f32; 4],
        target: PageHandle,
        target_y: f32,
    ) -> Result<(), MissingPage> {
        self.check(page)?;
        self.check(target)?;
        self.push(
            page,
            DrawOp::Link {
                rect,
                target,
                target_y,
            },
        );
        Ok(())
    }

    fn check(&self, page: PageHandle) -> Result<(), MissingPage> {
        if page.0 < self.pages.len() {
            Ok(())
        } else {
            Err(MissingPage(page.number()))
        }
    }

    fn push(&mut self, page: PageHandle, op: DrawOp) {
        if let Some(canvas) = self.pages.get_mut(page.0) {
            canvas.ops.push(op);
        }
    }

    /// Greedy word wrap against the font metrics.
    ///
    /// Words wider than `width` on their own are split between characters.
    pub fn wrap(&self, text: &str, face: Face, size: f32, width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut line = String::new();

        for word in text.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if self.text_width(face, size, &candidate) <= width {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if self.text_width(face, size, word) <= width {
                line = word.to_string();
                continue;
            }
            for c in word.chars() {
                line.push(c);
                if self.text_width(face, size, &line) > width && line.chars().count() > 1 {
                    line.pop();
                    lines.push(std::mem::take(&mut line));
                    line.push(c);
                }
            }
        }

        if !line.is_empty() {
            lines.push(line);
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FontClass;

    fn layout() -> PageLayout {
        PageLayout::new(
            PaperSize::Letter,
            Margins::default(),
            FontSet::new(FontClass::Sans),
        )
    }

    #[test]
    fn test_starts_with_one_page_at_top_margin() {
        let layout = layout();
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.cursor_y(), 720.0);
        assert_eq!(layout.content_width(), 468.0);
    }

    #[test]
    fn test_ensure_space_breaks_page() {
        let mut layout = layout();
        assert!(!layout.ensure_space(100.0));
        layout.advance(600.0);
        assert!(layout.ensure_space(100.0));
        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.cursor_y(), 720.0);
    }

    #[test]
    fn test_oversized_block_at_top_does_not_loop() {
        let mut layout = layout();
        assert!(!layout.ensure_space(10_000.0));
        assert_eq!(layout.page_count(), 1);
    }

    #[test]
    fn test_write_line_overflows_to_next_page() {
        let mut layout = layout();
        let mut last = PageHandle(0);
        for _ in 0..60 {
            last = layout.write_line("line", Face::Regular, 12.0, 16.0, Alignment::Left).0;
        }
        assert_eq!(last.number(), 2);
        assert!(layout.cursor_y() >= 72.0 - 16.0);
    }

    #[test]
    fn test_wrap_respects_width() {
        let layout = layout();
        let text = "the quick brown fox jumps over the lazy dog ".repeat(10);
        let lines = layout.wrap(&text, Face::Regular, 12.0, 200.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(layout.text_width(Face::Regular, 12.0, line) <= 200.0);
        }
        assert_eq!(lines.join(" "), text.trim());
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let layout = layout();
        let word = "x".repeat(200);
        let lines = layout.wrap(&word, Face::Regular, 12.0, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_backfill_onto_earlier_page() {
        let mut layout = layout();
        let first = layout.current();
        layout.page_break();
        layout.page_break();
        layout
            .draw_text_at(first, 500.0, 700.0, Face::Regular, 12.0, "3")
            .unwrap();
        assert_eq!(layout.pages()[0].texts().collect::<Vec<_>>(), vec!["3"]);
        assert_eq!(
            layout.draw_text_at(PageHandle(7), 0.0, 0.0, Face::Regular, 12.0, "x"),
            Err(MissingPage(8))
        );
    }

    #[test]
    fn test_justified_lines_stretch_except_last() {
        let mut layout = layout();
        let text = "word ".repeat(120);
        layout.write_paragraph(&text, Face::Regular, 12.0, 16.0, Alignment::Justify);
        let spacings: Vec<f32> = layout.pages()[0]
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { word_spacing, .. } => Some(*word_spacing),
                DrawOp::Link { .. } => None,
            })
            .collect();
        assert!(spacings.len() > 1);
        assert!(spacings[0] > 0.0);
        assert_eq!(*spacings.last().unwrap(), 0.0);
    }
}
