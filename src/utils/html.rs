// src/utils/html.rs

//! Plaintext rendering of post markup.

use scraper::{ElementRef, Html, Node};

/// Elements that start and end on their own line.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6", "tr",
    "table", "pre", "section",
];

/// Render an HTML fragment as plain text for a journal caption.
///
/// Block elements and `<br>` become line breaks, whitespace inside text
/// collapses, and runs of blank lines shrink to one.
pub fn text_from_html(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    let mut out = String::new();
    render(fragment.root_element(), &mut out);
    tidy_lines(&out)
}

fn render(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_text(out, text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = child.value().name();
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                if matches!(name, "script" | "style") {
                    continue;
                }

                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    end_line(out);
                }
                render(child, out);
                if block {
                    end_line(out);
                }
            }
            _ => {}
        }
    }
}

fn end_line(out: &mut String) {
    if !out.ends_with('\n') {
        out.push('\n');
    }
}

fn push_text(out: &mut String, text: &str) {
    let mut pending_space = text.starts_with(char::is_whitespace);
    for word in text.split_whitespace() {
        if pending_space && !out.is_empty() && !out.ends_with(['\n', ' ']) {
            out.push(' ');
        }
        out.push_str(word);
        pending_space = true;
    }
    // A whitespace-only node still separates the elements around it.
    if text.ends_with(char::is_whitespace) && !out.is_empty() && !out.ends_with(['\n', ' ']) {
        out.push(' ');
    }
}

fn tidy_lines(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in raw.lines().map(str::trim) {
        if line.is_empty() && lines.last().is_none_or(|l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_markup_flattens() {
        let html = r#"<a class="child-link" href="/s/1/children/7">Ada</a> painted a <b>very</b> big sun!"#;
        assert_eq!(text_from_html(html), "Ada painted a very big sun!");
    }

    #[test]
    fn test_space_between_elements_kept() {
        let html = r#"<a class="child-link" href="/s/1/children/7">Ada</a> <a class="child-link" href="/s/1/children/9">Bo</a> went outside"#;
        assert_eq!(text_from_html(html), "Ada Bo went outside");
        assert_eq!(text_from_html("<b>very</b> <i>big</i> sun"), "very big sun");
    }

    #[test]
    fn test_breaks_and_paragraphs() {
        let html = "<p>First line<br>second line</p><p>Next   paragraph</p>";
        assert_eq!(
            text_from_html(html),
            "First line\nsecond line\nNext paragraph"
        );
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(text_from_html("Snack &amp; nap"), "Snack & nap");
    }

    #[test]
    fn test_blank_runs_collapse() {
        let html = "one<br><br><br><br>two";
        assert_eq!(text_from_html(html), "one\n\ntwo");
    }

    #[test]
    fn test_empty_markup() {
        assert_eq!(text_from_html(""), "");
    }
}
