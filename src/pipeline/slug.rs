//! Deterministic anchor ids for headings.

use std::collections::HashMap;

/// Generate an anchor id from text.
///
/// Lowercases, turns every run of non-alphanumeric characters into a single
/// hyphen and trims hyphens from both ends.
///
/// # Examples
///
/// ```
/// use quire::pipeline::anchor_id;
///
/// assert_eq!(anchor_id("Chapter One"), "chapter-one");
/// assert_eq!(anchor_id("Hello, World!"), "hello-world");
/// assert_eq!(anchor_id("Chapter 1: Opening"), "chapter-1-opening");
/// ```
pub fn anchor_id(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    out
}

/// Hands out unique anchor ids in document order.
///
/// The first use of an id is returned as is; repeats get `-2`, `-3`, ...
#[derive(Debug, Default)]
pub struct AnchorSet {
    seen: HashMap<String, usize>,
}

impl AnchorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a unique id for `text`. `fallback` is used when the text has no
    /// alphanumeric characters.
    pub fn claim(&mut self, text: &str, fallback: &str) -> String {
        let mut base = anchor_id(text);
        if base.is_empty() {
            base = fallback.to_string();
        }

        let count = self.seen.entry(base.clone()).or_insert(0);
        *count += 1;
        let id = if *count == 1 {
            base
        } else {
            format!("{base}-{count}")
        };

        // A generated suffix may collide with a literal title like "Part 2".
        if *count > 1 && self.seen.contains_key(&id) {
            return self.claim(&id, fallback);
        }
        self.seen.entry(id.clone()).or_insert(1);
        id
    }
}
