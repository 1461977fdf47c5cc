//! Primitive markup builders
//!
//! Pure functions with no state; every page is assembled from these.

use std::fmt::Write;

pub const BR: &str = "<br>\n";
pub const MDASH: &str = " &mdash; ";
pub const NBSP4: &str = "&nbsp;&nbsp;&nbsp;&nbsp;";

/// Page name of the table of contents.
pub const TOC_PAGE: &str = "index";
/// Page name of the global name index.
pub const NAME_INDEX_PAGE: &str = "nameindex";
/// File name of the stylesheet asset.
pub const STYLESHEET_NAME: &str = "veridoc.css";

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn heading1(text: &str) -> String {
    format!("<div>\n<h1>{text}</h1>\n</div>\n")
}

pub fn heading2(text: &str) -> String {
    format!("<div>\n<h2>{text}</h2>\n</div>\n")
}

pub fn heading3(text: &str) -> String {
    format!("<div>\n<h3>{text}</h3>\n</div>\n")
}

pub fn bold(text: &str) -> String {
    format!("<b>{text}</b>")
}

/// Used inside an h1 heading, but rendered a lot smaller.
pub fn smaller(text: &str) -> String {
    format!("<span class=\"smaller\">{text}</span>")
}

pub fn code(text: &str) -> String {
    format!("<code>{}</code>", escape(text))
}

pub fn anchor(id: &str) -> String {
    format!("<a id=\"{id}\"></a>")
}

pub fn link(page: &str, text: &str) -> String {
    format!("<a href=\"{page}.html\">{text}</a>")
}

pub fn link_with_anchor(page: &str, fragment: &str, text: &str) -> String {
    format!("<a href=\"{page}.html#{fragment}\">{text}</a>")
}

pub fn link_to_anchor(fragment: &str, text: &str) -> String {
    format!("<a href=\"#{fragment}\">{text}</a>")
}

pub fn begin_table() -> &'static str {
    "<table>\n"
}

pub fn end_table() -> &'static str {
    "</table>\n"
}

pub fn row(cells: &[&str]) -> String {
    let mut out = String::from("<tr>");
    for cell in cells {
        write!(out, "<td>{cell}</td>").unwrap();
    }
    out.push_str("</tr>\n");
    out
}

/// Horizontal rule with the declaration name centered on it; opens each
/// details block.
pub fn rule_with_text(text: &str) -> String {
    format!("<div class=\"rule\"><span>{}</span></div><br>\n", escape(text))
}

pub fn indented(text: &str) -> String {
    format!("<div class=\"indent\">{text}</div>\n")
}

pub fn contents_link() -> String {
    format!("<a href=\"{TOC_PAGE}.html\">[table of contents]</a>")
}

pub fn index_link() -> String {
    format!("<a href=\"{NAME_INDEX_PAGE}.html\">[index]</a>")
}

pub fn page_head(title: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n  \
         <title>{}</title>\n  <link rel=\"stylesheet\" href=\"{STYLESHEET_NAME}\">\n  \
         <meta name=\"description\" content=\"Documentation produced by veridoc\">\n  \
         <meta name=\"author\" content=\"veridoc\">\n</head>\n<body>\n",
        escape(title)
    )
}

pub fn page_foot() -> &'static str {
    "</body>\n</html>\n"
}

/// Renders raw documentation text to markup: escapes it, turns
/// blank-line-separated blocks into paragraphs, and `backtick` runs into code
/// spans. Anything fancier is outside the generator.
pub fn render_doc_text(raw: &str) -> String {
    let mut out = String::new();
    for block in raw.split("\n\n").map(str::trim).filter(|b| !b.is_empty()) {
        out.push_str("<p>");
        out.push_str(&inline_spans(block));
        out.push_str("</p>\n");
    }
    out
}

fn inline_spans(text: &str) -> String {
    let mut out = String::new();
    let mut rest = text;
    while let Some(start) = rest.find('`') {
        if let Some(len) = rest[start + 1..].find('`') {
            out.push_str(&escape(&rest[..start]));
            out.push_str("<code>");
            out.push_str(&escape(&rest[start + 1..start + 1 + len]));
            out.push_str("</code>");
            rest = &rest[start + len + 2..];
        } else {
            break;
        }
    }
    out.push_str(&escape(rest));
    out
}
