//! Content sanitizing.
//!
//! Removes text that leaked out of the generation step upstream, stray
//! structured fragments and markup the target format cannot express, then
//! normalizes whitespace.
//!
//! Every rule deletes characters, except line-ending normalization which
//! cannot fire twice. [`sanitize_with`] repeats the pass until nothing changes,
//! so its output is always a fixed point.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::Markup;

/// Whole lines that are instructions or chatter, not book text.
static LEAKED_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:(?:here(?:'s| is) (?:the|your) (?:revised |updated |final |complete )?(?:chapter|section|content|text|draft|introduction|foreword)\b)|(?:sure|certainly|of course)[,!.]? here|as an ai\b|i hope (?:this|you)\b|let me know if\b|(?:word count|note to (?:the )?editor|instructions?|system prompt)[ \t]*:|\[(?:instruction|system|prompt|assistant|user)[^\]\n]*\])[^\n]*$",
    )
    .unwrap()
});

/// Control tokens and template placeholders.
static CONTROL_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\|[A-Za-z_]+\|>|\[/?INST\]|\[(?:END|CONTINUE|BREAK)\]|\{\{[^{}\n]*\}\}").unwrap()
});

/// Lines that are only a bracketed key/value remnant: `{"title": "x"}`, `[chapter: 3]`.
static STRUCTURED_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*[\[{][ \t]*"?[A-Za-z_][\w ]*"?[ \t]*[:=][^\n]*[\]}][ \t]*$"#).unwrap()
});

static HEADING_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]{0,3}#{1,6}(?:[ \t]+|$)").unwrap());

/// A `===` or `---` line directly under text, which Markdown reads as a heading.
static SETEXT_UNDERLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([^\n]*\S[^\n]*)\n[ \t]{0,3}(?:=+|-+)[ \t]*$").unwrap());

static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[[^\]\n]*\]\([^)\n]*\)").unwrap());

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]\n]+)\]\([^)\n]*\)").unwrap());

static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*|__([^_\n]+?)__").unwrap());

static STRIKE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~([^~\n]+?)~~").unwrap());

static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]+)`").unwrap());

static ITALIC_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s](?:[^*\n]*[^*\s])?)\*").unwrap());

static ITALIC_UNDERSCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_([^_\s](?:[^_\n]*[^_\s])?)_\b").unwrap());

static TRAILING_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Sanitize for formats without inline emphasis.
pub fn sanitize(text: &str) -> String {
    sanitize_with(text, Markup::Plain)
}

/// Sanitize, keeping emphasis tokens when `markup` is [`Markup::Rich`].
pub fn sanitize_with(text: &str, markup: Markup) -> String {
    let mut current = pass(text, markup);
    loop {
        let next = pass(&current, markup);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Clean a title: plain sanitizing plus whitespace collapsed to single spaces.
pub fn sanitize_title(text: &str) -> String {
    sanitize(text).split_whitespace().collect::<Vec<_>>().join(" ")
}

fn pass(text: &str, markup: Markup) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    let text = LEAKED_LINE_RE.replace_all(&text, "");
    let text = CONTROL_TOKEN_RE.replace_all(&text, "");
    let text = STRUCTURED_LINE_RE.replace_all(&text, "");
    let text = HEADING_MARKER_RE.replace_all(&text, "");
    let text = SETEXT_UNDERLINE_RE.replace_all(&text, "$1");
    let text = IMAGE_RE.replace_all(&text, "");
    let text = LINK_RE.replace_all(&text, "$1");

    let text = match markup {
        Markup::Plain => strip_emphasis(&text),
        Markup::Rich => Cow::Borrowed(text.as_ref()),
    };

    let text = TRAILING_SPACE_RE.replace_all(&text, "");
    let text = BLANK_RUN_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

fn strip_emphasis(text: &str) -> Cow<'_, str> {
    let text = BOLD_RE.replace_all(text, "$1$2");
    let text = STRIKE_RE.replace_all(&text, "$1").into_owned();
    let text = CODE_RE.replace_all(&text, "$1").into_owned();
    let text = ITALIC_STAR_RE.replace_all(&text, "$1").into_owned();
    let text = ITALIC_UNDERSCORE_RE.replace_all(&text, "$1").into_owned();
    Cow::Owned(text)
}
