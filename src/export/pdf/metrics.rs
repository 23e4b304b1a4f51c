//! Standard-14 font metrics and WinAnsi text encoding.
//!
//! Widths are the AFM advance widths (per 1000 em) of the regular faces for
//! printable ASCII. Bold and oblique faces are close enough to the regular
//! widths for line breaking; bold is widened slightly so wrapped bold
//! headings never overflow.

use encoding_rs::WINDOWS_1252;

use crate::pipeline::FontClass;

const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667,
    611, 722, 667, 944, 667, 667, 611, // 'A'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, // 'a'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const TIMES: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, // ' '..'/'
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, // '0'..'9'
    278, 278, 564, 564, 564, 444, 921, // ':'..'@'
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, 556, 722, 667, 556,
    611, 722, 722, 944, 722, 722, 611, // 'A'..'Z'
    333, 278, 333, 469, 500, 333, // '['..'`'
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, 500, 500, 333, 389,
    278, 500, 500, 722, 500, 500, 444, // 'a'..'z'
    480, 200, 480, 541, // '{'..'~'
];

const COURIER_WIDTH: u16 = 600;
const BOLD_FACTOR: f32 = 1.06;

/// Which face of the document's font family to draw with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Regular,
    Bold,
    Italic,
}

impl Face {
    pub const ALL: [Face; 3] = [Face::Regular, Face::Bold, Face::Italic];

    /// Resource name used in content streams.
    pub fn resource_name(self) -> &'static [u8] {
        match self {
            Face::Regular => b"F1",
            Face::Bold => b"F2",
            Face::Italic => b"F3",
        }
    }
}

/// Standard-14 family chosen from the resolved font class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSet {
    class: FontClass,
}

impl FontSet {
    pub fn new(class: FontClass) -> Self {
        Self { class }
    }

    /// PostScript name of the standard font for `face`.
    pub fn base_font(self, face: Face) -> &'static [u8] {
        match (self.class, face) {
            (FontClass::Serif, Face::Regular) => b"Times-Roman",
            (FontClass::Serif, Face::Bold) => b"Times-Bold",
            (FontClass::Serif, Face::Italic) => b"Times-Italic",
            (FontClass::Sans, Face::Regular) => b"Helvetica",
            (FontClass::Sans, Face::Bold) => b"Helvetica-Bold",
            (FontClass::Sans, Face::Italic) => b"Helvetica-Oblique",
            (FontClass::Mono, Face::Regular) => b"Courier",
            (FontClass::Mono, Face::Bold) => b"Courier-Bold",
            (FontClass::Mono, Face::Italic) => b"Courier-Oblique",
        }
    }

    /// Advance width of one character in 1/1000 em.
    fn char_units(self, c: char) -> f32 {
        let table = match self.class {
            FontClass::Mono => return f32::from(COURIER_WIDTH),
            FontClass::Sans => &HELVETICA,
            FontClass::Serif => &TIMES,
        };
        let code = c as u32;
        if (32..127).contains(&code) {
            f32::from(table[(code - 32) as usize])
        } else {
            // Average lowercase width for accented and typographic characters.
            f32::from(table[usize::from(b'n' - 32)])
        }
    }

    /// Width of `text` in points.
    pub fn text_width(self, face: Face, size: f32, text: &str) -> f32 {
        let units: f32 = text.chars().map(|c| self.char_units(c)).sum();
        let factor = match (face, self.class) {
            (Face::Bold, FontClass::Mono) => 1.0,
            (Face::Bold, _) => BOLD_FACTOR,
            _ => 1.0,
        };
        units * factor * size / 1000.0
    }
}

/// Encode text as WinAnsi bytes, substituting `?` for unencodable characters.
pub fn win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c as u8);
            continue;
        }
        let (bytes, _, unmappable) = WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        match bytes.as_ref() {
            [b] if !unmappable => out.push(*b),
            _ => out.push(b'?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helvetica_widths() {
        let fonts = FontSet::new(FontClass::Sans);
        // "Hi" = 722 + 222
        assert!((fonts.text_width(Face::Regular, 10.0, "Hi") - 9.44).abs() < 1e-4);
        assert!(fonts.text_width(Face::Bold, 10.0, "Hi") > fonts.text_width(Face::Regular, 10.0, "Hi"));
    }

    #[test]
    fn test_courier_is_monospaced() {
        let fonts = FontSet::new(FontClass::Mono);
        assert_eq!(
            fonts.text_width(Face::Regular, 12.0, "iiii"),
            fonts.text_width(Face::Regular, 12.0, "WWWW")
        );
    }

    #[test]
    fn test_base_fonts() {
        assert_eq!(FontSet::new(FontClass::Serif).base_font(Face::Bold), b"Times-Bold");
        assert_eq!(
            FontSet::new(FontClass::Sans).base_font(Face::Italic),
            b"Helvetica-Oblique"
        );
    }

    #[test]
    fn test_win_ansi_substitution() {
        assert_eq!(win_ansi("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(win_ansi("\u{201C}hi\u{201D}"), vec![0x93, b'h', b'i', 0x94]);
        assert_eq!(win_ansi("日本"), b"??".to_vec());
    }
}
