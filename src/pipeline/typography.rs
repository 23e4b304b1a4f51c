//! Typography resolution.
//!
//! Maps the free-text font preference onto each renderer's font space:
//! standard-14 families for PDF, named fonts for DOCX and a CSS family list for
//! HTML. Resolution never fails; unknown tokens fall back to serif.

use crate::model::{FontSizeToken, TypographyPrefs, UserInput};

pub const DEFAULT_FONT_SIZE: u32 = 12;
pub const MIN_FONT_SIZE: u32 = 8;
pub const MAX_FONT_SIZE: u32 = 72;

/// Generic font class, the only distinction the PDF renderer can make.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FontClass {
    #[default]
    Serif,
    Sans,
    Mono,
}

impl FontClass {
    pub fn css_generic(self) -> &'static str {
        match self {
            FontClass::Serif => "serif",
            FontClass::Sans => "sans-serif",
            FontClass::Mono => "monospace",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn parse(token: &str) -> Self {
        let token = token.trim().to_ascii_lowercase();
        match token.as_str() {
            "center" | "centre" | "centered" => Alignment::Center,
            "right" => Alignment::Right,
            "justify" | "justified" | "both" => Alignment::Justify,
            _ => Alignment::Left,
        }
    }

    pub fn css(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }

    /// WordprocessingML `w:jc` value.
    pub fn ooxml(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

/// Resolved typography for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typography {
    /// The family token as supplied, trimmed; empty when none was given.
    pub family_token: String,
    pub class: FontClass,
    pub size_pt: u32,
    pub alignment: Alignment,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            family_token: String::new(),
            class: FontClass::Serif,
            size_pt: DEFAULT_FONT_SIZE,
            alignment: Alignment::Left,
        }
    }
}

/// Named fonts the flow-document renderer knows, by lowercase keyword.
const DOCX_FONTS: &[(&str, &str)] = &[
    ("georgia", "Georgia"),
    ("garamond", "Garamond"),
    ("palatino", "Palatino Linotype"),
    ("baskerville", "Baskerville Old Face"),
    ("cambria", "Cambria"),
    ("book antiqua", "Book Antiqua"),
    ("times", "Times New Roman"),
    ("calibri", "Calibri"),
    ("helvetica", "Arial"),
    ("arial", "Arial"),
    ("verdana", "Verdana"),
    ("tahoma", "Tahoma"),
    ("segoe", "Segoe UI"),
    ("trebuchet", "Trebuchet MS"),
    ("consolas", "Consolas"),
    ("courier", "Courier New"),
];

impl Typography {
    /// Named font for DOCX output.
    pub fn docx_font(&self) -> &'static str {
        let token = self.family_token.to_ascii_lowercase();
        DOCX_FONTS
            .iter()
            .find(|(keyword, _)| token.contains(keyword))
            .map(|(_, name)| *name)
            .unwrap_or(match self.class {
                FontClass::Serif => "Times New Roman",
                FontClass::Sans => "Calibri",
                FontClass::Mono => "Courier New",
            })
    }

    /// CSS `font-family` value: the requested family followed by its generic.
    pub fn css_family(&self) -> String {
        let name: String = self
            .family_token
            .chars()
            .filter(|c| !matches!(c, '"' | '\'' | '<' | '>' | ';' | '{' | '}' | '\\'))
            .collect();
        let name = name.trim();
        let generic = self.class.css_generic();
        let is_generic = ["serif", "sans-serif", "sans", "monospace", "mono"]
            .contains(&name.to_ascii_lowercase().as_str());
        if name.is_empty() || is_generic {
            generic.to_string()
        } else {
            format!("\"{name}\", {generic}")
        }
    }
}

/// Classify a free-text family token by keyword.
pub fn classify_family(token: &str) -> FontClass {
    let token = token.to_ascii_lowercase();
    let has = |keys: &[&str]| keys.iter().any(|k| token.contains(k));

    if has(&["mono", "courier", "code", "consolas", "menlo", "typewriter"]) {
        FontClass::Mono
    } else if has(&[
        "sans", "helvetica", "arial", "verdana", "calibri", "tahoma", "segoe", "trebuchet",
        "roboto", "inter", "grotesk", "futura",
    ]) {
        FontClass::Sans
    } else {
        FontClass::Serif
    }
}

/// Parse a size token, keeping the digits before any decimal point.
///
/// Missing or digit-less tokens give the default; results are clamped to the
/// supported range.
pub fn resolve_font_size(token: Option<&FontSizeToken>) -> u32 {
    let parsed = match token {
        Some(FontSizeToken::Number(n)) if n.is_finite() && *n >= 1.0 => Some(n.trunc() as u64),
        Some(FontSizeToken::Number(_)) => None,
        Some(FontSizeToken::Text(text)) => {
            let digits: String = text
                .split('.')
                .next()
                .unwrap_or_default()
                .chars()
                .filter(char::is_ascii_digit)
                .take(6)
                .collect();
            digits.parse::<u64>().ok()
        }
        None => None,
    };

    match parsed {
        Some(size) => size.clamp(MIN_FONT_SIZE as u64, MAX_FONT_SIZE as u64) as u32,
        None => DEFAULT_FONT_SIZE,
    }
}

/// Resolve typography. Upstream `prefs` take precedence over `input` field by field.
pub fn resolve_typography(input: &UserInput, prefs: Option<&TypographyPrefs>) -> Typography {
    let family = prefs
        .and_then(|p| p.font_family.as_deref())
        .filter(|f| !f.trim().is_empty())
        .or(input.font_family.as_deref())
        .unwrap_or_default()
        .trim()
        .to_string();

    let size = prefs
        .and_then(|p| p.font_size.as_ref())
        .or(input.font_size.as_ref());

    Typography {
        class: classify_family(&family),
        family_token: family,
        size_pt: resolve_font_size(size),
        alignment: input
            .text_alignment
            .as_deref()
            .map(Alignment::parse)
            .unwrap_or_default(),
    }
}
