//! Inline emphasis parsing for renderers with native runs.
//!
//! Turns the emphasis tokens that survive [`Markup::Rich`](crate::model::Markup)
//! sanitizing into styled spans. Delimiters without a closing partner are kept
//! as literal text.

/// Run-level formatting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub code: bool,
}

impl SpanStyle {
    pub fn is_plain(self) -> bool {
        self == SpanStyle::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

/// Split `text` into styled spans.
///
/// ```
/// use quire::pipeline::parse_spans;
///
/// let spans = parse_spans("a **b** c");
/// assert_eq!(spans.len(), 3);
/// assert!(spans[1].style.bold);
/// ```
pub fn parse_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut buf = String::new();
    let mut style = SpanStyle::default();
    let mut prev: Option<char> = None;
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];

        if style.code {
            if rest.starts_with('`') {
                flush(&mut spans, &mut buf, style);
                style.code = false;
                i += 1;
                prev = Some('`');
                continue;
            }
        } else {
            let before = style;
            if let Some(width) = toggle(rest, prev, &mut style) {
                flush(&mut spans, &mut buf, before);
                i += width;
                prev = rest.chars().next();
                continue;
            }
        }

        let Some(c) = rest.chars().next() else { break };
        buf.push(c);
        prev = Some(c);
        i += c.len_utf8();
    }

    flush(&mut spans, &mut buf, style);
    spans
}

/// Flip the style for a delimiter at the start of `rest`. Returns its width.
fn toggle(rest: &str, prev: Option<char>, style: &mut SpanStyle) -> Option<usize> {
    if rest.starts_with('`') && rest[1..].contains('`') {
        style.code = true;
        return Some(1);
    }
    if rest.starts_with("**") && (style.bold || rest[2..].contains("**")) {
        style.bold = !style.bold;
        return Some(2);
    }
    if rest.starts_with("~~") && (style.strike || rest[2..].contains("~~")) {
        style.strike = !style.strike;
        return Some(2);
    }
    if rest.starts_with('*') {
        let closes = style.italic && prev.is_some_and(|c| !c.is_whitespace());
        let opens = !style.italic
            && rest[1..].chars().next().is_some_and(|c| !c.is_whitespace() && c != '*')
            && rest[1..].contains('*');
        if closes || opens {
            style.italic = !style.italic;
            return Some(1);
        }
    }
    if rest.starts_with('_') {
        let next = rest[1..].chars().next();
        let closes = style.italic && !next.is_some_and(char::is_alphanumeric);
        let opens = !style.italic
            && !prev.is_some_and(char::is_alphanumeric)
            && next.is_some_and(|c| !c.is_whitespace())
            && rest[1..].contains('_');
        if closes || opens {
            style.italic = !style.italic;
            return Some(1);
        }
    }
    None
}

fn flush(spans: &mut Vec<Span>, buf: &mut String, style: SpanStyle) {
    if buf.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(last) if last.style == style => last.text.push_str(buf),
        _ => spans.push(Span {
            text: std::mem::take(buf),
            style,
        }),
    }
    buf.clear();
}
