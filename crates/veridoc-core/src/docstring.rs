//! Documentation-comment processing
//!
//! Shortening stops at the end of the first sentence: a period followed by a
//! space or a line break. A bare period is not a boundary, so periods inside
//! numbers and qualified names survive.

use crate::markup;

/// Cuts `text` at the first sentence boundary. Idempotent; text without a
/// boundary comes back whole.
pub fn shorten(text: &str) -> &str {
    let bytes = text.as_bytes();
    for i in 0..bytes.len().saturating_sub(1) {
        if bytes[i] == b'.' && matches!(bytes[i + 1], b' ' | b'\n' | b'\r') {
            return &text[..=i];
        }
    }
    text
}

pub fn has_more(text: &str) -> bool {
    shorten(text) != text
}

/// Escaped short docstring plus a `(more...)` link when the text was cut.
/// `more_href` is the full href value, e.g. `#f` or `M.N.html#decl-detail`.
pub fn short_and_more(text: &str, more_href: &str) -> String {
    let short = shorten(text);
    let mut out = markup::escape(short);
    if short != text {
        out.push_str(&format!(" <a href=\"{more_href}\">(more...)</a>"));
    }
    out
}

/// Em-dash-prefixed short docstring for summary rows; empty when there is no
/// documentation at all.
pub fn dash_short(doc: Option<&str>, more_href: &str) -> String {
    match doc {
        Some(text) => format!("{}{}", markup::MDASH, short_and_more(text, more_href)),
        None => String::new(),
    }
}

/// Same, without the `(more...)` link; used where no details section exists
/// to point at, e.g. the table of contents.
pub fn dash_short_no_more(doc: Option<&str>) -> String {
    match doc {
        Some(text) => format!("{}{}", markup::MDASH, markup::escape(shorten(text))),
        None => String::new(),
    }
}
