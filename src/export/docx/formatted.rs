//! Chapter recovery from pre-rendered markup.
//!
//! The upstream formatter delivers the whole book as one HTML string. Each
//! `<h1>` or `<h2>` starts a chapter; block elements after it become its
//! paragraphs. Tags are dropped and entities decoded. This is a tolerant
//! scanner, not an HTML parser: it only needs tag boundaries.

use memchr::memchr;
use quick_xml::escape::unescape_with;

/// One chapter found in the markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredChapter {
    pub heading: String,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Preamble,
    Heading,
    Body,
    Skip,
}

struct Scanner {
    chapters: Vec<RecoveredChapter>,
    buf: String,
    target: Target,
    /// Where text goes once a skipped element closes.
    resume: Target,
}

impl Scanner {
    fn flush(&mut self) {
        let text = collapse(&decode(&self.buf));
        self.buf.clear();
        if text.is_empty() {
            return;
        }
        let Some(chapter) = self.chapters.last_mut() else {
            return;
        };
        match self.target {
            Target::Heading => {
                if !chapter.heading.is_empty() {
                    chapter.heading.push(' ');
                }
                chapter.heading.push_str(&text);
            }
            Target::Body => chapter.paragraphs.push(text),
            Target::Preamble | Target::Skip => {}
        }
    }

    fn tag(&mut self, name: &str, closing: bool) {
        match name {
            "script" | "style" | "head" | "title" => {
                if closing {
                    self.buf.clear();
                    self.target = self.resume;
                } else if self.target != Target::Skip {
                    self.flush();
                    self.resume = self.target;
                    self.target = Target::Skip;
                }
            }
            _ if self.target == Target::Skip => {}
            "h1" | "h2" => {
                self.flush();
                if closing {
                    self.target = Target::Body;
                } else {
                    self.chapters.push(RecoveredChapter {
                        heading: String::new(),
                        paragraphs: Vec::new(),
                    });
                    self.target = Target::Heading;
                }
            }
            "br" => self.buf.push(' '),
            "p" | "div" | "li" | "blockquote" | "pre" | "section" | "article" | "ul" | "ol"
            | "h3" | "h4" | "h5" | "h6" | "hr" | "table" | "tr" | "figure" | "figcaption" => {
                self.flush();
            }
            _ => {}
        }
    }
}

/// Split pre-rendered markup into chapters.
///
/// Text before the first chapter heading is ignored.
pub fn recover_chapters(html: &str) -> Vec<RecoveredChapter> {
    let mut scanner = Scanner {
        chapters: Vec::new(),
        buf: String::new(),
        target: Target::Preamble,
        resume: Target::Preamble,
    };

    let bytes = html.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        let Some(offset) = memchr(b'<', &bytes[pos..]) else {
            scanner.buf.push_str(&html[pos..]);
            break;
        };
        let start = pos + offset;
        scanner.buf.push_str(&html[pos..start]);

        // Comments may contain '>'.
        if html[start..].starts_with("<!--") {
            pos = match html[start + 4..].find("-->") {
                Some(end) => start + 4 + end + 3,
                None => bytes.len(),
            };
            continue;
        }

        let Some(len) = memchr(b'>', &bytes[start..]) else {
            // A lone '<' is text.
            scanner.buf.push_str(&html[start..]);
            break;
        };
        let inner = &html[start + 1..start + len];
        match tag_name(inner) {
            Some((name, closing)) => {
                scanner.tag(&name, closing);
                pos = start + len + 1;
            }
            None => {
                scanner.buf.push('<');
                pos = start + 1;
            }
        }
    }
    scanner.flush();
    scanner.chapters
}

/// Lowercase element name and whether the tag closes it.
fn tag_name(inner: &str) -> Option<(String, bool)> {
    let (closing, rest) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    if rest.starts_with('!') || rest.starts_with('?') {
        return Some((String::new(), closing));
    }
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if name.is_empty() || !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((name.to_ascii_lowercase(), closing))
}

fn decode(text: &str) -> String {
    unescape_with(text, resolve_entity)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| text.to_string())
}

fn resolve_entity(entity: &str) -> Option<&'static str> {
    Some(match entity {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{A0}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201C}",
        "rdquo" => "\u{201D}",
        "copy" => "\u{00A9}",
        _ => return None,
    })
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
